//! Tracing / logging initialisation helpers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level per component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Override per component: component_name → level
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Filter directives, e.g. `"info,chainfeed_reader=trace"`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

/// Initialise tracing with the given log config. Logs go to stderr so that
/// stdout stays free for decoded output.
///
/// Should be called once at application startup; later calls are ignored.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_new(config.directives())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_components() {
        let mut config = LogConfig::default();
        config.components.insert("chainfeed-reader".into(), "trace".into());
        assert_eq!(config.directives(), "info,chainfeed_reader=trace");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: LogConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert_eq!(config.level, "info");
        assert!(config.json);
        assert!(config.components.is_empty());
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing(&LogConfig::default());
        init_tracing(&LogConfig::default());
    }
}
