// ⚙️ Configuration
// Read by the binary only; the analytical core takes plain values.

use crate::forecast::DEFAULT_INTERVAL_WIDTH;
use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

fn default_source_path() -> PathBuf {
    PathBuf::from("invoices.csv")
}

fn default_interval_width() -> f64 {
    DEFAULT_INTERVAL_WIDTH
}

fn default_log_filter() -> String {
    "invoice_insight=info".to_string()
}

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the invoice table is read from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Coverage of the uncertainty band, in (0, 1)
    #[serde(default = "default_interval_width")]
    pub interval_width: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            interval_width: default_interval_width(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. built-in defaults
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables with INVOICE_INSIGHT_ prefix, `__` between keys:
    ///    - `INVOICE_INSIGHT_SOURCE__PATH=data/invoices.csv`
    ///    - `INVOICE_INSIGHT_FORECAST__INTERVAL_WIDTH=0.95`
    ///    - `INVOICE_INSIGHT_LOGGING__FILTER=invoice_insight=debug`
    pub fn load() -> Result<Self, ConfigError> {
        let config: Config = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("INVOICE_INSIGHT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let width = self.forecast.interval_width;
        if !(width > 0.0 && width < 1.0) {
            return Err(ConfigError::Message(format!(
                "forecast.interval_width must be in (0, 1), got {}",
                width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [source]
            path = "data/march.csv"

            [forecast]
            interval_width = 0.95

            [logging]
            filter = "invoice_insight=debug"
        "#;

        let config: Config = toml::from_str(toml).expect("Failed to parse config");

        assert_eq!(config.source.path, PathBuf::from("data/march.csv"));
        assert_eq!(config.forecast.interval_width, 0.95);
        assert_eq!(config.logging.filter, "invoice_insight=debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str("").expect("Failed to parse config");

        assert_eq!(config.source.path, PathBuf::from("invoices.csv"));
        assert_eq!(config.forecast.interval_width, 0.8);
        assert_eq!(config.logging.filter, "invoice_insight=info");
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: Config = toml::from_str("[forecast]\n").expect("Failed to parse config");
        assert_eq!(config.forecast.interval_width, 0.8);
    }

    #[test]
    fn test_invalid_interval_width_rejected() {
        let config: Config =
            toml::from_str("[forecast]\ninterval_width = 1.5\n").expect("Failed to parse config");
        assert!(config.validate().is_err());
    }
}
