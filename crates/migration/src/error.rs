//! Migration errors.

use tagline_core::{DefinitionId, DefinitionKey, InstanceId, VersionTag};
use tagline_ports::PortsError;
use thiserror::Error;

/// Boxed error returned by migration actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from registering or running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Two descriptors of one key start from the same tag.
    #[error("more than one migration registered for {key} from tag {source_tag}")]
    DuplicateSource {
        /// Workflow family.
        key: DefinitionKey,
        /// The shared source tag.
        source_tag: VersionTag,
    },

    /// The descriptors of a key form a cycle.
    #[error("migrations registered for {key} form a cycle")]
    CycleDetected {
        /// Workflow family.
        key: DefinitionKey,
    },

    /// An instance is bound to a definition that cannot be found.
    #[error("instance {instance} is bound to unknown definition {definition}")]
    DefinitionNotFound {
        /// The instance.
        instance: InstanceId,
        /// Its definition id.
        definition: DefinitionId,
    },

    /// No definition carries the target tag of a matching migration.
    #[error("no definition of {key} carries target tag {tag}")]
    TargetDefinitionMissing {
        /// Workflow family.
        key: DefinitionKey,
        /// The missing target tag.
        tag: VersionTag,
    },

    /// The migration action itself failed.
    #[error("migration of {key} from {source_tag} to {target_tag} failed")]
    ActionFailed {
        /// Workflow family.
        key: DefinitionKey,
        /// Source tag of the failing hop.
        source_tag: VersionTag,
        /// Target tag of the failing hop.
        target_tag: VersionTag,
        /// Error raised by the action.
        #[source]
        cause: BoxError,
    },

    /// A chain took more hops than there are candidate migrations.
    #[error("migration chain of instance {instance} exceeded {limit} hops")]
    ChainTooLong {
        /// The instance.
        instance: InstanceId,
        /// Maximum number of hops.
        limit: usize,
    },

    /// The exclusive lock is required but held elsewhere.
    #[error("exclusive lock unavailable: {lock}")]
    LockUnavailable {
        /// Name of the lock.
        lock: String,
    },

    /// Backend failure.
    #[error(transparent)]
    Store(PortsError),
}

impl From<PortsError> for MigrationError {
    fn from(err: PortsError) -> Self {
        match err {
            PortsError::LockUnavailable { lock } => Self::LockUnavailable { lock },
            other => Self::Store(other),
        }
    }
}
