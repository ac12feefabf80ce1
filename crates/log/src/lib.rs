//! # Tagline Log
//!
//! `tracing` subscriber setup shared by Tagline binaries and tests.
//!
//! ```rust,ignore
//! tagline_log::auto_init()?;
//! tracing::info!(keys = 3, "auto-migration pass finished");
//! ```
//!
//! Configuration comes from [`Config`]: explicit, from the environment
//! (`TAGLINE_LOG` / `RUST_LOG` for filters, `TAGLINE_LOG_FORMAT` for the
//! format) or from one of the presets.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;

pub use builder::LoggerBuilder;
pub use config::{Config, DisplayConfig, Format, LOG_ENV, LOG_FORMAT_ENV};
pub use error::{LogError, LogResult};

/// Pick a configuration from the environment and build type, then install it.
///
/// Uses [`Config::from_env`] when a filter variable is set, otherwise
/// [`Config::development`] in debug builds and [`Config::production`] in
/// release builds.
///
/// # Errors
///
/// See [`LoggerBuilder::build`].
pub fn auto_init() -> LogResult<()> {
    if std::env::var(LOG_ENV).is_ok() || std::env::var("RUST_LOG").is_ok() {
        init_with(Config::from_env())
    } else if cfg!(debug_assertions) {
        init_with(Config::development())
    } else {
        init_with(Config::production())
    }
}

/// Initialize with default configuration
///
/// # Errors
///
/// See [`LoggerBuilder::build`].
pub fn init() -> LogResult<()> {
    init_with(Config::default())
}

/// Initialize with custom configuration
///
/// # Errors
///
/// See [`LoggerBuilder::build`].
pub fn init_with(config: Config) -> LogResult<()> {
    LoggerBuilder::from_config(config).build()
}
