//! Running-instance repository port.

use async_trait::async_trait;
use tagline_core::{DefinitionId, DefinitionKey, InstanceId, RunningInstance};

use crate::error::PortsError;

/// Access to running instances and their definition binding.
///
/// Instances are created and completed by the engine runtime; this port only
/// observes them and moves them between definitions.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Running instances bound to any definition of `key`.
    async fn list_by_definition_key(
        &self,
        key: &DefinitionKey,
    ) -> Result<Vec<RunningInstance>, PortsError>;

    /// A single instance by id.
    async fn get(&self, id: InstanceId) -> Result<Option<RunningInstance>, PortsError>;

    /// Bind an instance to another definition of the same key.
    async fn rebind(&self, id: InstanceId, definition: DefinitionId) -> Result<(), PortsError>;
}
