//! SinkBlueprint - top-level configuration file contract
//!
//! A blueprint describes one rotating sink, the adapter it writes through,
//! and how the process reports on itself.

use serde::{Deserialize, Serialize};

use crate::SinkConfig;

/// Configuration file root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Engine options
    pub sink: SinkConfig,

    /// Destination adapter
    #[serde(default)]
    pub adapter: AdapterConfig,

    /// Logging and metrics
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// Config version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    #[serde(rename = "1")]
    V1,
}

/// Destination adapter selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterConfig {
    /// One line of text per record
    #[default]
    Text,

    /// Delimited rows
    Delimited {
        #[serde(default = "default_delimiter")]
        delimiter: char,
        #[serde(default)]
        headers: Vec<String>,
    },

    /// Batches of JSON values, one line per value
    Jsonl,
}

fn default_delimiter() -> char {
    ','
}

impl AdapterConfig {
    /// Short adapter name (for logging)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Delimited { .. } => "delimited",
            Self::Jsonl => "jsonl",
        }
    }
}

/// Logging and metrics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// Default log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_tagged_deserialize() {
        let adapter: AdapterConfig =
            serde_json::from_str(r#"{"kind":"delimited","delimiter":"|","headers":["a","b"]}"#)
                .unwrap();
        match adapter {
            AdapterConfig::Delimited { delimiter, headers } => {
                assert_eq!(delimiter, '|');
                assert_eq!(headers, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected adapter: {other:?}"),
        }
    }

    #[test]
    fn test_blueprint_defaults() {
        let bp: SinkBlueprint = serde_json::from_str(r#"{"sink":{"name":"runtime"}}"#).unwrap();
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.adapter.kind(), "text");
        assert_eq!(bp.observability.log_level, "info");
        assert_eq!(bp.observability.metrics_port, None);
    }
}
