//! `LineSource` — bounded line splitting over an async byte stream.

use chainfeed_core::error::StreamError;
use futures::Stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::config::DEFAULT_MAX_LINE_BYTES;

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Reads newline-terminated lines from `R`, refusing any line longer than
/// `max_line_bytes` instead of buffering it.
pub struct LineSource<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_line_bytes: usize,
}

impl<R: AsyncRead + Unpin> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_line_bytes(reader, DEFAULT_MAX_LINE_BYTES)
    }

    pub fn with_max_line_bytes(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_BYTES, reader),
            buf: Vec::new(),
            max_line_bytes,
        }
    }

    /// Next line without its terminator.
    ///
    /// `Ok(None)` is a clean end of stream. A final line lacking a trailing
    /// newline is still returned. Bytes that are not valid UTF-8 are replaced
    /// rather than failing the stream, since the node interleaves arbitrary
    /// output with protocol lines.
    pub async fn next_line(&mut self) -> Result<Option<String>, StreamError> {
        self.buf.clear();
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                break;
            }

            let (take, found) = match available.iter().position(|b| *b == b'\n') {
                Some(pos) => (pos, true),
                None => (available.len(), false),
            };
            if self.buf.len() + take > self.max_line_bytes {
                return Err(StreamError::LineTooLong {
                    limit: self.max_line_bytes,
                });
            }
            self.buf.extend_from_slice(&available[..take]);
            let consumed = if found { take + 1 } else { take };
            self.reader.consume(consumed);
            if found {
                break;
            }
        }

        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        let bytes = std::mem::take(&mut self.buf);
        Ok(Some(match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }))
    }

    /// Lazy stream of lines; ends after the first error or at end of stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, StreamError>> {
        futures::stream::unfold(Some(self), |state| async move {
            let Some(mut source) = state else {
                return None;
            };
            match source.next_line().await {
                Ok(Some(line)) => Some((Ok(line), Some(source))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn splits_lines_and_strips_terminators() {
        let input: &[u8] = b"first\r\nsecond\n\nlast";
        let mut src = LineSource::new(input);
        assert_eq!(src.next_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(src.next_line().await.unwrap().as_deref(), Some("second"));
        assert_eq!(src.next_line().await.unwrap().as_deref(), Some(""));
        assert_eq!(src.next_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(src.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_oversized_line() {
        let input: &[u8] = b"short\nthis line is far too long\n";
        let mut src = LineSource::with_max_line_bytes(input, 8);
        assert_eq!(src.next_line().await.unwrap().as_deref(), Some("short"));
        let err = src.next_line().await.unwrap_err();
        assert!(matches!(err, StreamError::LineTooLong { limit: 8 }));
    }

    #[tokio::test]
    async fn line_longer_than_read_buffer() {
        let long = "a".repeat(READ_BUFFER_BYTES * 3 + 17);
        let input = format!("{long}\nnext\n");
        let mut src = LineSource::new(input.as_bytes());
        assert_eq!(src.next_line().await.unwrap().unwrap().len(), long.len());
        assert_eq!(src.next_line().await.unwrap().as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let input: &[u8] = b"ok \xff\xfe bytes\n";
        let mut src = LineSource::new(input);
        let line = src.next_line().await.unwrap().unwrap();
        assert!(line.starts_with("ok "));
        assert!(line.ends_with(" bytes"));
    }

    #[tokio::test]
    async fn stream_yields_all_lines() {
        let input: &[u8] = b"a\nb\nc\n";
        let lines: Vec<_> = LineSource::new(input)
            .into_stream()
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(lines, vec!["a", "b", "c"]);
    }
}
