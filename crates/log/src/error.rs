//! Logger errors

/// Errors raised while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The filter directives could not be parsed.
    #[error("invalid log filter {filter:?}: {reason}")]
    Filter {
        /// The rejected directives.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Result type for logger operations
pub type LogResult<T> = Result<T, LogError>;
