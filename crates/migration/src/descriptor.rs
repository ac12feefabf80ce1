//! Migration descriptors.

use std::fmt;
use std::sync::Arc;

use tagline_core::{DefinitionKey, VersionTag};

use crate::action::MigrationAction;

/// A registered rule: instances of `key` on `source_tag` move to the latest
/// definition tagged `target_tag` by running `action`.
#[derive(Clone)]
pub struct MigrationDescriptor {
    key: DefinitionKey,
    source_tag: VersionTag,
    target_tag: VersionTag,
    action: Arc<dyn MigrationAction>,
}

impl MigrationDescriptor {
    /// Describe one migration.
    pub fn new(
        key: DefinitionKey,
        source_tag: impl Into<VersionTag>,
        target_tag: impl Into<VersionTag>,
        action: Arc<dyn MigrationAction>,
    ) -> Self {
        Self {
            key,
            source_tag: source_tag.into(),
            target_tag: target_tag.into(),
            action,
        }
    }

    /// Workflow family.
    #[must_use]
    pub fn key(&self) -> &DefinitionKey {
        &self.key
    }

    /// Tag instances migrate away from.
    #[must_use]
    pub fn source_tag(&self) -> &VersionTag {
        &self.source_tag
    }

    /// Tag instances migrate to.
    #[must_use]
    pub fn target_tag(&self) -> &VersionTag {
        &self.target_tag
    }

    /// The action run for each hop.
    #[must_use]
    pub fn action(&self) -> &dyn MigrationAction {
        self.action.as_ref()
    }
}

impl fmt::Debug for MigrationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationDescriptor")
            .field("key", &self.key)
            .field("source_tag", &self.source_tag)
            .field("target_tag", &self.target_tag)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for MigrationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.key, self.source_tag, self.target_tag)
    }
}
