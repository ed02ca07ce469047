//! Console reader configuration.

use serde::{Deserialize, Serialize};

/// Tag that marks instrumentation lines on the node's output.
pub const DEFAULT_PREFIX: &str = "DMLOG";

/// A fully hex-encoded block must fit on one line.
pub const DEFAULT_MAX_LINE_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Sentinel tag distinguishing protocol lines from other process output.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Capacity of the line queue between the feeder and the reader.
    /// The feeder suspends once this many lines are waiting.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Longest accepted line, in bytes.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

fn default_prefix() -> String { DEFAULT_PREFIX.to_string() }
fn default_channel_capacity() -> usize { 128 }
fn default_max_line_bytes() -> usize { DEFAULT_MAX_LINE_BYTES }

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            channel_capacity: default_channel_capacity(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

impl ReaderConfig {
    /// Override the queue capacity. Zero is bumped to one.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn with_max_line_bytes(mut self, limit: usize) -> Self {
        self.max_line_bytes = limit;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: ReaderConfig = serde_json::from_str(r#"{"channel_capacity": 4}"#).unwrap();
        assert_eq!(cfg.channel_capacity, 4);
        assert_eq!(cfg.prefix, "DMLOG");
        assert_eq!(cfg.max_line_bytes, DEFAULT_MAX_LINE_BYTES);
    }

    #[test]
    fn zero_capacity_is_bumped() {
        assert_eq!(ReaderConfig::default().with_channel_capacity(0).channel_capacity, 1);
    }
}
