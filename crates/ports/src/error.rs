//! Error types for port operations.
//!
//! Every port method returns `Result<_, PortsError>`. Backend drivers map
//! their internal errors into these variants so callers can report store
//! trouble without knowing the backend.

/// Error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortsError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity (e.g. "Definition", "Instance").
        entity: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// A write would violate a uniqueness constraint.
    #[error("{entity} {id}: {reason}")]
    Conflict {
        /// Kind of entity.
        entity: String,
        /// Identifier of the conflicting entity.
        id: String,
        /// What collided.
        reason: String,
    },

    /// Backend connection failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The exclusive lock is held elsewhere.
    #[error("exclusive lock unavailable: {lock}")]
    LockUnavailable {
        /// Name of the lock that could not be taken.
        lock: String,
    },

    /// Catch-all internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortsError {
    /// Convenience constructor for [`PortsError::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`PortsError::Conflict`].
    pub fn conflict(
        entity: impl Into<String>,
        id: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            entity: entity.into(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn not_found_convenience() {
        let err = PortsError::not_found("Definition", "abc-123");
        match &err {
            PortsError::NotFound { entity, id } => {
                assert_eq!(entity, "Definition");
                assert_eq!(id, "abc-123");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn conflict_convenience() {
        let err = PortsError::conflict("Definition", "invoice", "ordering 1000 already used");
        assert_eq!(err.to_string(), "Definition invoice: ordering 1000 already used");
    }

    #[test]
    fn backend_failures_keep_their_message() {
        assert_eq!(
            PortsError::Connection("refused".into()).to_string(),
            "connection error: refused"
        );
        assert_eq!(
            PortsError::Serialization("bad json".into()).to_string(),
            "serialization error: bad json"
        );
    }

    #[test]
    fn display_lock_unavailable() {
        let err = PortsError::LockUnavailable {
            lock: "deployment".into(),
        };
        assert_eq!(err.to_string(), "exclusive lock unavailable: deployment");
    }
}
