//! Error types for the ChainFeed decode pipeline.

use std::num::ParseIntError;
use std::sync::Arc;
use thiserror::Error;

/// Maximum number of characters of an offending line rendered in error
/// messages. The full line stays reachable through [`ReaderError::line`].
const LINE_PREVIEW_CHARS: usize = 256;

/// Errors raised while interpreting a single protocol line.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A tagged line without at least a command name and one argument.
    #[error("invalid log line format: {line:?}")]
    MalformedLine { line: String },

    #[error("invalid log line length: {command} requires {expected} fields but found {actual}")]
    Arity {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid block height {token:?}: {source}")]
    InvalidHeight {
        token: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid encoded block: {reason}")]
    InvalidPayload { reason: String },
}

impl DecodeError {
    /// Short machine-readable label, suitable for metric attributes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedLine { .. } => "malformed_line",
            Self::Arity { .. } => "arity",
            Self::InvalidHeight { .. } => "invalid_height",
            Self::InvalidPayload { .. } => "invalid_payload",
        }
    }
}

/// Errors from the byte source feeding the reader.
///
/// Cloneable so the feeder can both hand the failure to the reader and
/// report it to its own caller.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    #[error("line exceeds the {limit} byte limit")]
    LineTooLong { limit: usize },

    #[error("console reader closed")]
    ReaderClosed,
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// Errors surfaced by `ConsoleReader::next_block`.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("{} (line {:?})", .source, preview(.line))]
    Decode {
        line: String,
        #[source]
        source: DecodeError,
    },

    #[error("line source failed: {0}")]
    Stream(#[from] StreamError),
}

impl ReaderError {
    /// The raw line that failed to decode, if this is a decode failure.
    pub fn line(&self) -> Option<&str> {
        match self {
            Self::Decode { line, .. } => Some(line),
            Self::Stream(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { source, .. } => source.kind(),
            Self::Stream(_) => "stream",
        }
    }

    /// The underlying protocol error, if this is a decode failure.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            Self::Decode { source, .. } => Some(source),
            Self::Stream(_) => None,
        }
    }
}

/// Errors from the block adapter.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("unable to marshal block to binary form: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("unable to unmarshal block payload: {0}")]
    Decode(#[from] prost::DecodeError),
}

fn preview(line: &str) -> &str {
    match line.char_indices().nth(LINE_PREVIEW_CHARS) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_message_includes_line() {
        let err = ReaderError::Decode {
            line: "DMLOG BLOCK abc 0a02".into(),
            source: DecodeError::InvalidHeight {
                token: "abc".into(),
                source: "abc".parse::<u64>().unwrap_err(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("\"abc\""), "{msg}");
        assert!(msg.contains("DMLOG BLOCK abc 0a02"), "{msg}");
        assert_eq!(err.line(), Some("DMLOG BLOCK abc 0a02"));
    }

    #[test]
    fn long_lines_are_truncated_in_messages() {
        let line = format!("DMLOG BLOCK 1 {}", "ab".repeat(10_000));
        let err = ReaderError::Decode {
            line: line.clone(),
            source: DecodeError::InvalidPayload { reason: "boom".into() },
        };
        assert!(err.to_string().len() < 400);
        assert_eq!(err.line().map(str::len), Some(line.len()));
    }

    #[test]
    fn stream_error_has_no_line() {
        let err = ReaderError::from(StreamError::ReaderClosed);
        assert!(err.line().is_none());
        assert!(err.decode_error().is_none());
        assert_eq!(err.kind(), "stream");
    }
}
