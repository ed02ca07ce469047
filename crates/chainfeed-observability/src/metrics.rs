//! ChainFeed metrics definitions.
//!
//! All metrics use OpenTelemetry conventions and are recorded through the
//! reader's observer hook, so any configured meter provider can export them.

use chainfeed_core::{block::Block, error::ReaderError};
use chainfeed_reader::{ParsingStats, ReaderObserver};
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Central metrics handle for a console reader.
#[derive(Clone)]
pub struct ReaderMetrics {
    pub blocks_decoded: Counter<u64>,
    pub lines_skipped: Counter<u64>,
    pub unknown_commands: Counter<u64>,
    pub decode_errors: Counter<u64>,
    pub block_decode_latency_ms: Histogram<f64>,
    pub block_transactions: Histogram<u64>,
}

impl ReaderMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            blocks_decoded: meter
                .u64_counter("chainfeed.blocks_decoded")
                .with_description("Total number of blocks decoded from the console")
                .init(),
            lines_skipped: meter
                .u64_counter("chainfeed.lines_skipped")
                .with_description("Console lines without the protocol tag")
                .init(),
            unknown_commands: meter
                .u64_counter("chainfeed.unknown_commands")
                .with_description("Protocol lines carrying a command this reader does not know")
                .init(),
            decode_errors: meter
                .u64_counter("chainfeed.decode_errors")
                .with_description("Reads that failed on a malformed line or a broken stream")
                .init(),
            block_decode_latency_ms: meter
                .f64_histogram("chainfeed.block_decode_latency_ms")
                .with_description("Time from the start of a read to its decoded block, in milliseconds")
                .init(),
            block_transactions: meter
                .u64_histogram("chainfeed.block_transactions")
                .with_description("Number of transactions per decoded block")
                .init(),
        }
    }

    /// Metrics registered on the global meter provider.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("chainfeed"))
    }
}

impl ReaderObserver for ReaderMetrics {
    fn on_skipped_line(&self, _line: &str) {
        self.lines_skipped.add(1, &[]);
    }

    fn on_unknown_command(&self, name: &str, _line: &str) {
        self.unknown_commands
            .add(1, &[KeyValue::new("command", name.to_lowercase())]);
    }

    fn on_block(&self, block: &Block, stats: &ParsingStats) {
        self.blocks_decoded.add(1, &[]);
        self.block_decode_latency_ms
            .record(stats.elapsed().as_secs_f64() * 1_000.0, &[]);
        self.block_transactions
            .record(block.transaction_count() as u64, &[]);
    }

    fn on_error(&self, err: &ReaderError) {
        self.decode_errors
            .add(1, &[KeyValue::new("error_type", err.kind())]);
    }
}
