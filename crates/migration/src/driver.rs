//! Startup auto-migration: one pass over every deployed key.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tagline_core::{DefinitionKey, RunningInstance, VersionTag};
use tagline_ports::{DefinitionStore, ExclusiveLock, InstanceStore, acquire_exclusive};

use crate::chain::{ChainError, ChainOutcome, MigrationChainExecutor};
use crate::descriptor::MigrationDescriptor;
use crate::error::MigrationError;
use crate::registry::MigrationRegistry;

/// Options for an auto-migration pass.
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Serialize the pass behind the store's exclusive lock.
    pub use_exclusive_lock: bool,
    /// How many instance chains of one key may run at once. `1` runs them
    /// one after another.
    pub max_concurrent_instances: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            use_exclusive_lock: true,
            max_concurrent_instances: 1,
        }
    }
}

/// Outcome of one pass.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Deployed keys looked at.
    pub keys_scanned: usize,
    /// Chains that completed, including ones that applied no hop.
    pub outcomes: Vec<ChainOutcome>,
    /// Chains that stopped on an error.
    pub failures: Vec<ChainError>,
}

impl MigrationReport {
    /// Total hops applied, counting hops of failed chains.
    #[must_use]
    pub fn hops_applied(&self) -> usize {
        self.outcomes.iter().map(|o| o.hops.len()).sum::<usize>()
            + self
                .failures
                .iter()
                .map(|f| f.completed_hops.len())
                .sum::<usize>()
    }

    /// Instances whose chain completed with at least one hop.
    #[must_use]
    pub fn instances_migrated(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.hops.is_empty()).count()
    }

    /// `true` when no chain failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Migrates every eligible running instance of every deployed key.
pub struct AutoMigrationDriver {
    registry: Arc<MigrationRegistry>,
    definitions: Arc<dyn DefinitionStore>,
    instances: Arc<dyn InstanceStore>,
    lock: Arc<dyn ExclusiveLock>,
    executor: MigrationChainExecutor,
    options: DriverOptions,
}

impl AutoMigrationDriver {
    /// Create a driver.
    pub fn new(
        registry: Arc<MigrationRegistry>,
        definitions: Arc<dyn DefinitionStore>,
        instances: Arc<dyn InstanceStore>,
        lock: Arc<dyn ExclusiveLock>,
        options: DriverOptions,
    ) -> Self {
        let executor = MigrationChainExecutor::new(Arc::clone(&definitions), Arc::clone(&instances));
        Self {
            registry,
            definitions,
            instances,
            lock,
            executor,
            options,
        }
    }

    /// Run one pass.
    ///
    /// The exclusive lock, when enabled and supported, is held for the whole
    /// pass. Failures of single chains are collected in the report; lock and
    /// store errors while listing keys or instances abort the pass.
    pub async fn run_once(&self) -> Result<MigrationReport, MigrationError> {
        let _guard =
            acquire_exclusive(self.lock.as_ref(), self.options.use_exclusive_lock).await?;

        let keys = self.definitions.deployed_keys().await?;
        let mut report = MigrationReport {
            keys_scanned: keys.len(),
            ..MigrationReport::default()
        };

        for key in keys {
            let candidates = self.registry.migrations_for(&key);
            if candidates.is_empty() {
                tracing::trace!(%key, "no migrations registered");
                continue;
            }
            self.migrate_key(&key, candidates, &mut report).await?;
        }

        tracing::info!(
            keys = report.keys_scanned,
            migrated = report.instances_migrated(),
            hops = report.hops_applied(),
            failures = report.failures.len(),
            "auto-migration pass finished"
        );
        Ok(report)
    }

    async fn migrate_key(
        &self,
        key: &DefinitionKey,
        candidates: &[MigrationDescriptor],
        report: &mut MigrationReport,
    ) -> Result<(), MigrationError> {
        let sources: HashSet<&VersionTag> =
            candidates.iter().map(MigrationDescriptor::source_tag).collect();
        let tags: HashMap<_, _> = self
            .definitions
            .list_by_key(key)
            .await?
            .into_iter()
            .map(|d| (d.id, d.version_tag))
            .collect();

        let mut eligible: Vec<RunningInstance> = Vec::new();
        for instance in self.instances.list_by_definition_key(key).await? {
            match tags.get(&instance.definition_id) {
                Some(tag) if sources.contains(tag) => eligible.push(instance),
                Some(_) => {}
                None => report.failures.push(ChainError {
                    instance_id: instance.id,
                    completed_hops: Vec::new(),
                    error: MigrationError::DefinitionNotFound {
                        instance: instance.id,
                        definition: instance.definition_id,
                    },
                }),
            }
        }
        if eligible.is_empty() {
            return Ok(());
        }
        tracing::info!(%key, count = eligible.len(), "migrating instances");

        let executor = &self.executor;
        let results: Vec<Result<ChainOutcome, ChainError>> = stream::iter(&eligible)
            .map(|instance| executor.run(instance, candidates))
            .buffer_unordered(self.options.max_concurrent_instances.max(1))
            .collect()
            .await;

        for result in results {
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(failure) => {
                    tracing::warn!(
                        %key,
                        instance = %failure.instance_id,
                        completed_hops = failure.completed_hops.len(),
                        error = %failure.error,
                        "migration chain failed"
                    );
                    report.failures.push(failure);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for AutoMigrationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoMigrationDriver")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
