#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tagline Engine
//!
//! Ties the pieces together for an embedding application:
//!
//! - [`EngineConfig`] loads layered settings (defaults, TOML file,
//!   `TAGLINE_` environment)
//! - [`MigratingEngine`] deploys the startup resources one tag at a time and
//!   then runs one auto-migration pass
//!
//! ```rust,ignore
//! let config = EngineConfig::load(Some(Path::new("tagline.toml")))?;
//! config.init_logging()?;
//! let engine = MigratingEngine::new(config, EngineStores::from_backend(backend), registry);
//! let report = engine.start(resources).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::{DeploymentConfig, ENV_PREFIX, EngineConfig, LockingConfig, MigrationConfig};
pub use engine::{EngineStores, MigratingEngine, StartupReport};
pub use error::{EngineError, EngineResult};
