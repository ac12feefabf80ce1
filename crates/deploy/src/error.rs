//! Deployment errors.

use tagline_core::{DefinitionKey, VersionTag};
use tagline_ports::PortsError;

/// Errors raised while deploying tagged resources.
///
/// Everything except [`LockUnavailable`](Self::LockUnavailable) is local to
/// one resource or one deployment unit; the coordinator records it and moves
/// on to the next unit.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The resource file name does not follow `<name>[-<version>].<ext>`.
    #[error("resource name does not match the naming convention: {name}")]
    MalformedResourceName {
        /// The offending file name.
        name: String,
    },

    /// A definition declares a different tag than its file name carries.
    #[error(
        "deployment {deployment}: definition {key} declares version tag {definition_tag} \
         but resource {resource} is tagged {resource_tag}"
    )]
    TagMismatch {
        /// Deployment unit name.
        deployment: String,
        /// Key of the offending definition.
        key: DefinitionKey,
        /// Tag declared inside the definition.
        definition_tag: VersionTag,
        /// Resource the definition was read from.
        resource: String,
        /// Tag derived from the resource file name.
        resource_tag: VersionTag,
    },

    /// No ordering value fits between the neighbours of a new definition.
    #[error(
        "no ordering value left for tag {tag}: computed {candidate}, \
         lower bound {}, upper bound {}",
        bound(.left),
        bound(.right)
    )]
    AllocationExhausted {
        /// Tag of the definition being allocated.
        tag: VersionTag,
        /// Ordering value of the left (lower) neighbour.
        left: Option<u32>,
        /// The value the allocation rule produced.
        candidate: u64,
        /// Ordering value of the right (higher) neighbour.
        right: Option<u32>,
    },

    /// The exclusive lock is required but held elsewhere.
    #[error("exclusive lock unavailable: {lock}")]
    LockUnavailable {
        /// Name of the lock.
        lock: String,
    },

    /// A resource could not be read as a definition.
    #[error("invalid resource {name}: {reason}")]
    Resource {
        /// Resource name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Backend failure.
    #[error(transparent)]
    Store(PortsError),
}

impl From<PortsError> for DeployError {
    fn from(err: PortsError) -> Self {
        match err {
            PortsError::LockUnavailable { lock } => Self::LockUnavailable { lock },
            other => Self::Store(other),
        }
    }
}

impl DeployError {
    /// Returns `true` when the error aborts the whole deployment pass rather
    /// than a single unit.
    #[must_use]
    pub fn is_pass_fatal(&self) -> bool {
        matches!(self, Self::LockUnavailable { .. })
    }
}

fn bound(value: &Option<u32>) -> String {
    value.map_or_else(|| "none".to_owned(), |v| v.to_string())
}
