//! # chainfeed-observability
//!
//! OpenTelemetry-based observability for ChainFeed.
//!
//! ## Built-in metrics
//! - `chainfeed.blocks_decoded`           — counter
//! - `chainfeed.lines_skipped`            — counter
//! - `chainfeed.unknown_commands`         — counter, tagged with command
//! - `chainfeed.decode_errors`            — counter, tagged with error_type
//! - `chainfeed.block_decode_latency_ms`  — histogram
//! - `chainfeed.block_transactions`       — histogram
//!
//! ## Structured logging
//! Text or JSON logs on stderr, levels configurable per component.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::ReaderMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
