//! Definition repository port.
//!
//! Read access to persisted definitions. Writes go through the deployment
//! pipeline, not through this trait.

use async_trait::async_trait;
use tagline_core::{Definition, DefinitionId, DefinitionKey, VersionTag};

use crate::error::PortsError;

/// Query interface over persisted workflow definitions.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Every definition of `key`, in no particular order.
    async fn list_by_key(&self, key: &DefinitionKey) -> Result<Vec<Definition>, PortsError>;

    /// A single definition by id.
    async fn get(&self, id: DefinitionId) -> Result<Option<Definition>, PortsError>;

    /// The definition of `key` carrying exactly `tag` with the highest
    /// ordering value, i.e. the latest re-deploy of that tag.
    ///
    /// An absent `tag` matches definitions without a tag.
    async fn latest_by_tag(
        &self,
        key: &DefinitionKey,
        tag: &VersionTag,
    ) -> Result<Option<Definition>, PortsError>;

    /// Distinct keys that have at least one deployed definition, sorted.
    async fn deployed_keys(&self) -> Result<Vec<DefinitionKey>, PortsError>;
}
