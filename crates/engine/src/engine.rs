//! Startup orchestration

use std::sync::Arc;

use tagline_deploy::{
    DeploymentReport, DeploymentResource, DeploymentSink, TaggedDeploymentCoordinator,
    VersionTagPolicy,
};
use tagline_migration::{AutoMigrationDriver, MigrationRegistry, MigrationReport};
use tagline_ports::{DefinitionStore, ExclusiveLock, InstanceStore};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// The store ports an engine runs against.
#[derive(Clone)]
pub struct EngineStores {
    /// Deployed definitions.
    pub definitions: Arc<dyn DefinitionStore>,
    /// Running instances.
    pub instances: Arc<dyn InstanceStore>,
    /// Deployment pipeline.
    pub sink: Arc<dyn DeploymentSink>,
    /// Store-wide exclusive lock.
    pub lock: Arc<dyn ExclusiveLock>,
}

impl EngineStores {
    /// Use one backend for every port.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: DefinitionStore + InstanceStore + DeploymentSink + ExclusiveLock + 'static,
    {
        Self {
            definitions: backend.clone(),
            instances: backend.clone(),
            sink: backend.clone(),
            lock: backend,
        }
    }
}

/// What happened during [`MigratingEngine::start`].
#[derive(Debug)]
pub struct StartupReport {
    /// The startup deployment.
    pub deployment: DeploymentReport,
    /// The auto-migration pass; `None` when disabled.
    pub migration: Option<MigrationReport>,
}

impl StartupReport {
    /// `true` when neither the deployment nor the migration pass recorded a
    /// failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.deployment.is_clean() && self.migration.as_ref().is_none_or(MigrationReport::is_clean)
    }
}

/// Deploys tagged resources and migrates running instances at startup.
pub struct MigratingEngine {
    config: EngineConfig,
    coordinator: TaggedDeploymentCoordinator,
    driver: AutoMigrationDriver,
}

impl MigratingEngine {
    /// Wire the coordinator and the driver over `stores`.
    pub fn new(config: EngineConfig, stores: EngineStores, registry: Arc<MigrationRegistry>) -> Self {
        let policy = Arc::new(VersionTagPolicy::new(
            Arc::clone(&stores.definitions),
            Arc::clone(&stores.instances),
        ));
        let coordinator =
            TaggedDeploymentCoordinator::new(stores.sink, Arc::clone(&stores.lock), policy);
        let driver = AutoMigrationDriver::new(
            registry,
            stores.definitions,
            stores.instances,
            stores.lock,
            config.driver_options(),
        );
        Self {
            config,
            coordinator,
            driver,
        }
    }

    /// The configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Deploy `resources`, then run one auto-migration pass when
    /// `migration.auto_migrate_on_start` is set.
    ///
    /// The migration pass runs even when some deployment units failed; the
    /// failures are in the report.
    ///
    /// # Errors
    ///
    /// Returns an error when the deployment or the migration pass aborts,
    /// for instance because the exclusive lock is held elsewhere.
    pub async fn start(&self, resources: Vec<DeploymentResource>) -> EngineResult<StartupReport> {
        let deployment = self.deploy(resources).await?;
        let migration = if self.config.migration.auto_migrate_on_start {
            Some(self.migrate().await?)
        } else {
            tracing::debug!("auto-migration on start disabled");
            None
        };

        tracing::info!(
            deployed = deployment.deployed.len(),
            deploy_failures = deployment.failures.len(),
            migrated = migration.as_ref().map_or(0, MigrationReport::instances_migrated),
            "engine started"
        );
        Ok(StartupReport {
            deployment,
            migration,
        })
    }

    /// Deploy a batch with the configured options.
    ///
    /// # Errors
    ///
    /// See [`TaggedDeploymentCoordinator::deploy`].
    pub async fn deploy(&self, resources: Vec<DeploymentResource>) -> EngineResult<DeploymentReport> {
        Ok(self
            .coordinator
            .deploy(resources, &self.config.deploy_options())
            .await?)
    }

    /// Run one auto-migration pass.
    ///
    /// # Errors
    ///
    /// See [`AutoMigrationDriver::run_once`].
    pub async fn migrate(&self) -> EngineResult<MigrationReport> {
        Ok(self.driver.run_once().await?)
    }
}
