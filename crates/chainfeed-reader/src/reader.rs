//! `ConsoleReader` — turns the node's instrumentation output into blocks.
//!
//! ```text
//! byte stream ──► LineFeeder::process_data ──► bounded line queue
//!                                                    │
//!                 ConsoleReader::next_block ◄────────┘
//!                   tokenize → dispatch → ParseContext::block
//! ```
//!
//! The feeder and the reader run as separate tasks. The queue is bounded, so
//! a slow consumer suspends the feeder instead of growing memory.

use std::sync::Arc;

use chainfeed_core::{
    block::Block,
    error::{DecodeError, ReaderError, StreamError},
};
use futures::Stream;
use tokio::io::AsyncRead;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::ReaderConfig;
use crate::context::{ParseContext, ParsingStats};
use crate::line_source::LineSource;
use crate::observer::{ReaderObserver, TracingObserver};
use crate::tokenizer::{tokenize, CommandKind};

type LineItem = Result<String, StreamError>;

/// Closes a [`ConsoleReader`] from another task.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    /// Any pending or future `next_block` returns end of stream, and the
    /// feeder stops.
    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Producer half: pushes raw lines into the reader's queue.
pub struct LineFeeder {
    tx: mpsc::Sender<LineItem>,
    closed: watch::Receiver<bool>,
    max_line_bytes: usize,
}

impl LineFeeder {
    /// Read lines from `reader` until it is exhausted or fails.
    ///
    /// `Ok(())` means a clean end of stream; the queue is closed and the
    /// reader drains the remaining lines before reporting end of stream.
    /// A read failure is queued as the last item, so the reader observes it,
    /// and is returned as well.
    pub async fn process_data<R>(mut self, reader: R) -> Result<(), StreamError>
    where
        R: AsyncRead + Unpin,
    {
        let mut source = LineSource::with_max_line_bytes(reader, self.max_line_bytes);
        loop {
            let next = tokio::select! {
                biased;
                _ = wait_closed(&mut self.closed) => return Err(StreamError::ReaderClosed),
                next = source.next_line() => next,
            };

            match next {
                Ok(Some(line)) => self.push(Ok(line)).await?,
                Ok(None) => {
                    debug!("line source exhausted");
                    return Ok(());
                }
                Err(e) => {
                    error!(error = %e, "line source failed");
                    self.push(Err(e.clone())).await?;
                    return Err(e);
                }
            }
        }
    }

    async fn push(&mut self, item: LineItem) -> Result<(), StreamError> {
        tokio::select! {
            biased;
            _ = wait_closed(&mut self.closed) => Err(StreamError::ReaderClosed),
            sent = self.tx.send(item) => sent.map_err(|_| StreamError::ReaderClosed),
        }
    }
}

/// Consumer half: decodes one block per [`next_block`](Self::next_block) call.
pub struct ConsoleReader {
    lines: mpsc::Receiver<LineItem>,
    closed: watch::Receiver<bool>,
    close_handle: CloseHandle,
    prefix: String,
    observer: Arc<dyn ReaderObserver>,
}

enum Pulled {
    Closed,
    Line(Option<LineItem>),
}

impl ConsoleReader {
    /// Create a reader and the feeder that supplies it.
    pub fn new(config: &ReaderConfig) -> (Self, LineFeeder) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let (close_tx, close_rx) = watch::channel(false);
        let reader = Self {
            lines: rx,
            closed: close_rx.clone(),
            close_handle: CloseHandle {
                tx: Arc::new(close_tx),
            },
            prefix: config.prefix.clone(),
            observer: Arc::new(TracingObserver),
        };
        let feeder = LineFeeder {
            tx,
            closed: close_rx,
            max_line_bytes: config.max_line_bytes,
        };
        (reader, feeder)
    }

    /// Create a reader fed from `reader` by a background Tokio task.
    ///
    /// The task's result reports how the byte stream ended.
    pub fn spawn<R>(config: &ReaderConfig, reader: R) -> (Self, JoinHandle<Result<(), StreamError>>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (console, feeder) = Self::new(config);
        let handle = tokio::spawn(feeder.process_data(reader));
        (console, handle)
    }

    /// Replace the default `TracingObserver`.
    pub fn with_observer(mut self, observer: Arc<dyn ReaderObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.close_handle.clone()
    }

    /// Stop reading. Lines still queued are discarded.
    pub fn close(&mut self) {
        self.close_handle.close();
        self.lines.close();
    }

    /// Decode the next block.
    ///
    /// Returns `Ok(None)` once the feeder is done or the reader is closed.
    /// Lines without the protocol tag and unknown commands are consumed
    /// silently. A malformed line fails this call; the caller decides whether
    /// to keep reading.
    pub async fn next_block(&mut self) -> Result<Option<Block>, ReaderError> {
        let mut stats = ParsingStats::new();
        loop {
            let pulled = tokio::select! {
                biased;
                _ = wait_closed(&mut self.closed) => Pulled::Closed,
                item = self.lines.recv() => Pulled::Line(item),
            };

            match pulled {
                Pulled::Closed => {
                    debug!("console reader closed");
                    self.lines.close();
                    return Ok(None);
                }
                Pulled::Line(None) => {
                    info!("lines channel has been closed");
                    return Ok(None);
                }
                Pulled::Line(Some(Err(e))) => return Err(self.fail(ReaderError::Stream(e))),
                Pulled::Line(Some(Ok(line))) => match self.read_line(&line, &mut stats) {
                    Ok(Some(block)) => return Ok(Some(block)),
                    Ok(None) => {}
                    Err(source) => return Err(self.fail(ReaderError::Decode { line, source })),
                },
            }
        }
    }

    /// Decoded blocks as a stream. Errors are yielded in place and the
    /// stream keeps going; drop it to stop.
    pub fn into_stream(self) -> impl Stream<Item = Result<Block, ReaderError>> {
        futures::stream::unfold(self, |mut reader| async move {
            match reader.next_block().await {
                Ok(Some(block)) => Some((Ok(block), reader)),
                Ok(None) => None,
                Err(e) => Some((Err(e), reader)),
            }
        })
    }

    fn read_line(&self, line: &str, stats: &mut ParsingStats) -> Result<Option<Block>, DecodeError> {
        let Some(command) = tokenize(line, &self.prefix)? else {
            self.observer.on_skipped_line(line);
            return Ok(None);
        };
        stats.inc(command.name);

        match command.kind() {
            Some(CommandKind::Block) => {
                let ctx = ParseContext::new(std::mem::take(stats));
                let (block, block_stats) = ctx.block(&command.args)?;
                self.observer.on_block(&block, &block_stats);
                Ok(Some(block))
            }
            None => {
                self.observer.on_unknown_command(command.name, line);
                Ok(None)
            }
        }
    }

    fn fail(&self, err: ReaderError) -> ReaderError {
        self.observer.on_error(&err);
        err
    }
}

impl Drop for ConsoleReader {
    fn drop(&mut self) {
        self.close_handle.close();
    }
}

/// Resolves once the reader is closed or every close handle is gone.
async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    let _ = closed.wait_for(|closed| *closed).await;
}
