//! Configuration presets for common scenarios

use super::{Config, DisplayConfig, Format};

/// Filter variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "TAGLINE_LOG";
/// Format variable (`pretty`, `compact`, `json`).
pub const LOG_FORMAT_ENV: &str = "TAGLINE_LOG_FORMAT";

impl Config {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // TAGLINE_LOG wins over RUST_LOG
        if let Some(level) = lookup(LOG_ENV).or_else(|| lookup("RUST_LOG")) {
            config.level = level;
        }

        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.format = format.parse().unwrap_or_default();
            config.display.colors = config.format != Format::Json;
        }

        config
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                colors: true,
                source: true,
                ..DisplayConfig::default()
            },
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                ..DisplayConfig::default()
            },
        }
    }

    /// Test configuration (no colors, no timestamps)
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: "trace".to_string(),
            format: Format::Compact,
            display: DisplayConfig {
                colors: false,
                time: false,
                ..DisplayConfig::default()
            },
        }
    }
}
