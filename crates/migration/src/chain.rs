//! Walks one instance along the registered migration graph.

use std::sync::Arc;

use tagline_core::{Definition, DefinitionId, InstanceId, RunningInstance, VersionTag};
use tagline_ports::{DefinitionStore, InstanceStore};

use crate::action::MigrationContext;
use crate::descriptor::MigrationDescriptor;
use crate::error::MigrationError;

/// One applied migration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedHop {
    /// Definition the instance left.
    pub source: DefinitionId,
    /// Its tag.
    pub source_tag: VersionTag,
    /// Definition the instance moved to.
    pub target: DefinitionId,
    /// Its tag.
    pub target_tag: VersionTag,
}

/// A chain that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    /// The migrated instance.
    pub instance_id: InstanceId,
    /// Hops applied, in order. Empty when nothing applied.
    pub hops: Vec<AppliedHop>,
    /// Definition the instance ends on.
    pub final_definition: DefinitionId,
}

/// A chain that stopped on an error.
///
/// Hops completed before the error stay applied.
#[derive(Debug)]
pub struct ChainError {
    /// The instance.
    pub instance_id: InstanceId,
    /// Hops applied before the failure.
    pub completed_hops: Vec<AppliedHop>,
    /// What stopped the chain.
    pub error: MigrationError,
}

/// Runs migration chains for single instances.
#[derive(Clone)]
pub struct MigrationChainExecutor {
    definitions: Arc<dyn DefinitionStore>,
    instances: Arc<dyn InstanceStore>,
}

impl MigrationChainExecutor {
    /// Create an executor over the given stores.
    pub fn new(definitions: Arc<dyn DefinitionStore>, instances: Arc<dyn InstanceStore>) -> Self {
        Self {
            definitions,
            instances,
        }
    }

    /// Migrate `instance` as far as `candidates` reach.
    ///
    /// Each round picks the candidate whose source tag equals the current
    /// definition's tag, resolves the latest definition carrying its target
    /// tag and applies the action. The walk ends when no candidate matches.
    /// It never takes more hops than there are candidates.
    pub async fn run(
        &self,
        instance: &RunningInstance,
        candidates: &[MigrationDescriptor],
    ) -> Result<ChainOutcome, ChainError> {
        let mut hops = Vec::new();
        match self.walk(instance, candidates, &mut hops).await {
            Ok(final_definition) => Ok(ChainOutcome {
                instance_id: instance.id,
                hops,
                final_definition,
            }),
            Err(error) => Err(ChainError {
                instance_id: instance.id,
                completed_hops: hops,
                error,
            }),
        }
    }

    async fn walk(
        &self,
        instance: &RunningInstance,
        candidates: &[MigrationDescriptor],
        hops: &mut Vec<AppliedHop>,
    ) -> Result<DefinitionId, MigrationError> {
        let mut current: Definition = self
            .definitions
            .get(instance.definition_id)
            .await?
            .ok_or(MigrationError::DefinitionNotFound {
                instance: instance.id,
                definition: instance.definition_id,
            })?;
        let instance_ids = [instance.id];

        while let Some(descriptor) = candidates
            .iter()
            .find(|d| *d.key() == current.key && *d.source_tag() == current.version_tag)
        {
            if hops.len() >= candidates.len() {
                return Err(MigrationError::ChainTooLong {
                    instance: instance.id,
                    limit: candidates.len(),
                });
            }

            let target = self
                .definitions
                .latest_by_tag(&current.key, descriptor.target_tag())
                .await?
                .ok_or_else(|| MigrationError::TargetDefinitionMissing {
                    key: current.key.clone(),
                    tag: descriptor.target_tag().clone(),
                })?;

            tracing::debug!(
                instance = %instance.id,
                migration = %descriptor,
                source = %current.id,
                target = %target.id,
                "applying migration"
            );
            let ctx = MigrationContext {
                definitions: self.definitions.as_ref(),
                instances: self.instances.as_ref(),
                source: &current,
                target: &target,
                instance_ids: &instance_ids,
            };
            descriptor
                .action()
                .apply(&ctx)
                .await
                .map_err(|cause| MigrationError::ActionFailed {
                    key: current.key.clone(),
                    source_tag: current.version_tag.clone(),
                    target_tag: target.version_tag.clone(),
                    cause,
                })?;

            hops.push(AppliedHop {
                source: current.id,
                source_tag: current.version_tag.clone(),
                target: target.id,
                target_tag: target.version_tag.clone(),
            });
            current = target;
        }

        Ok(current.id)
    }
}

impl std::fmt::Debug for MigrationChainExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationChainExecutor").finish_non_exhaustive()
    }
}
