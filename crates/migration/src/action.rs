//! Migration actions: the step that moves instances between definitions.

use async_trait::async_trait;
use tagline_core::{Definition, InstanceId};
use tagline_ports::{DefinitionStore, InstanceStore};

use crate::error::BoxError;

/// Everything an action needs for one hop.
#[derive(Clone, Copy)]
pub struct MigrationContext<'a> {
    /// Definition lookups.
    pub definitions: &'a dyn DefinitionStore,
    /// Instance access, including rebinding.
    pub instances: &'a dyn InstanceStore,
    /// Definition the instances are bound to now.
    pub source: &'a Definition,
    /// Definition they move to.
    pub target: &'a Definition,
    /// Instances to migrate.
    pub instance_ids: &'a [InstanceId],
}

impl std::fmt::Debug for MigrationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationContext")
            .field("source", &self.source.describe())
            .field("target", &self.target.describe())
            .field("instance_ids", &self.instance_ids)
            .finish_non_exhaustive()
    }
}

/// Moves instances from a source to a target definition.
///
/// Implementations are opaque to the chain executor: success advances the
/// chain, failure stops it with no rollback of earlier hops.
#[async_trait]
pub trait MigrationAction: Send + Sync {
    /// Run the migration for every instance in `ctx`.
    async fn apply(&self, ctx: &MigrationContext<'_>) -> Result<(), BoxError>;
}

/// Rebinds instances to the target definition without touching their state.
#[derive(Debug, Default, Clone, Copy)]
pub struct RebindAction;

#[async_trait]
impl MigrationAction for RebindAction {
    async fn apply(&self, ctx: &MigrationContext<'_>) -> Result<(), BoxError> {
        for &id in ctx.instance_ids {
            ctx.instances.rebind(id, ctx.target.id).await?;
        }
        Ok(())
    }
}
