//! Engine errors

use tagline_deploy::DeployError;
use tagline_log::LogError;
use tagline_migration::MigrationError;

/// Errors raised while configuring or starting the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The layered configuration could not be read or extracted.
    #[error("configuration error: {0}")]
    Config(Box<figment::Error>),

    /// A configuration value is out of range.
    #[error("invalid configuration value for `{key}`: {reason}")]
    InvalidConfig {
        /// Dotted key of the offending value.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The startup deployment aborted.
    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// The startup auto-migration pass aborted.
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// The log subscriber could not be installed.
    #[error(transparent)]
    Log(#[from] LogError),
}

impl From<figment::Error> for EngineError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_names_the_key() {
        let err = EngineError::InvalidConfig {
            key: "deployment.name",
            reason: "must not be empty".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration value for `deployment.name`: must not be empty"
        );
    }

    #[test]
    fn lock_errors_keep_their_message() {
        let err = EngineError::from(MigrationError::LockUnavailable {
            lock: "exclusive".to_owned(),
        });
        assert!(err.to_string().contains("exclusive"), "got {err}");
    }
}
