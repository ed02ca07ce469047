//! `ReaderObserver` — injected hook for logging and metrics.
//!
//! The reader never logs through process-wide state directly; everything
//! observable goes through the observer it was built with. All methods
//! default to no-ops so implementations only override what they need.

use chainfeed_core::{block::Block, error::ReaderError};
use tracing::{enabled, info, trace, warn, Level};

use crate::context::ParsingStats;

pub trait ReaderObserver: Send + Sync {
    /// A line without the protocol tag was consumed.
    fn on_skipped_line(&self, _line: &str) {}

    /// A protocol line with an unrecognized command was consumed.
    fn on_unknown_command(&self, _name: &str, _line: &str) {}

    /// A block was decoded. `stats` are discarded after this call.
    fn on_block(&self, _block: &Block, _stats: &ParsingStats) {}

    /// `next_block` is about to return `err`.
    fn on_error(&self, _err: &ReaderError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ReaderObserver for NoopObserver {}

/// Observer that reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ReaderObserver for TracingObserver {
    fn on_skipped_line(&self, line: &str) {
        trace!(line, "skipping non protocol line");
    }

    fn on_unknown_command(&self, name: &str, line: &str) {
        // Lines can be megabytes long; only render them when asked to.
        if enabled!(Level::TRACE) {
            trace!(command = name, line, "skipping unknown deep mind log line");
        }
    }

    fn on_block(&self, block: &Block, stats: &ParsingStats) {
        info!(
            block_num = block.number(),
            trx_count = block.transaction_count(),
            duration_us = stats.elapsed().as_micros() as u64,
            stats = ?stats.counts(),
            "mindreader block stats"
        );
    }

    fn on_error(&self, err: &ReaderError) {
        warn!(error = %err, "console reader failed");
    }
}

/// Fans every event out to several observers, in order.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Box<dyn ReaderObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl ReaderObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }
}

impl ReaderObserver for ObserverSet {
    fn on_skipped_line(&self, line: &str) {
        self.observers.iter().for_each(|o| o.on_skipped_line(line));
    }

    fn on_unknown_command(&self, name: &str, line: &str) {
        self.observers.iter().for_each(|o| o.on_unknown_command(name, line));
    }

    fn on_block(&self, block: &Block, stats: &ParsingStats) {
        self.observers.iter().for_each(|o| o.on_block(block, stats));
    }

    fn on_error(&self, err: &ReaderError) {
        self.observers.iter().for_each(|o| o.on_error(err));
    }
}
