//! Core configuration types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DisplayConfig;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter directives (e.g. "info", "debug,tagline_deploy=trace")
    pub level: String,

    /// Output format
    pub format: Format,

    /// Display configuration
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            display: DisplayConfig::default(),
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Human-readable, multi-line
    Pretty,
    /// Compact single-line output
    #[default]
    Compact,
    /// Structured JSON, one object per line
    Json,
}

impl FromStr for Format {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to [`Format::Compact`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Compact,
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("pretty", Format::Pretty)]
    #[case("JSON", Format::Json)]
    #[case(" compact ", Format::Compact)]
    #[case("logfmt", Format::Compact)]
    fn parses_format_names(#[case] raw: &str, #[case] expected: Format) {
        assert_eq!(raw.parse::<Format>().unwrap(), expected);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: Config = serde_json::from_str(r#"{"format":"json"}"#).unwrap();
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.level, "info");
    }
}
