//! Tag-grouped deployment of a batch of resources.

use std::collections::BTreeMap;
use std::sync::Arc;

use tagline_core::{Definition, TenantId, VersionTag};
use tagline_ports::{ExclusiveLock, acquire_exclusive};

use crate::error::DeployError;
use crate::policy::VersionTagPolicy;
use crate::resource::{DeploymentResource, ResourceVersionExtractor};
use crate::sink::{DeploymentSink, DeploymentUnit, OverriddenTag};

/// Options for one deployment batch.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Name given to every deployment unit of the batch.
    pub name: String,
    /// Owning tenant.
    pub tenant_id: Option<TenantId>,
    /// Deploy only resources that changed, per tag group.
    pub deploy_changed_only: bool,
    /// Serialize the batch behind the store's exclusive lock.
    pub use_exclusive_lock: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            name: "tagline".to_owned(),
            tenant_id: None,
            deploy_changed_only: true,
            use_exclusive_lock: true,
        }
    }
}

/// A resource or unit that could not be deployed.
#[derive(Debug)]
pub struct DeploymentFailure {
    /// Tag of the failed unit; `None` when the tag could not be read at all.
    pub version_tag: Option<VersionTag>,
    /// Names of the affected resources.
    pub resources: Vec<String>,
    /// What went wrong.
    pub error: DeployError,
}

/// Outcome of a deployment batch.
#[derive(Debug, Default)]
pub struct DeploymentReport {
    /// Definitions persisted, in unit order.
    pub deployed: Vec<Definition>,
    /// Instances left on older definitions of a re-deployed tag.
    pub overridden: Vec<OverriddenTag>,
    /// Resources and units that failed.
    pub failures: Vec<DeploymentFailure>,
}

impl DeploymentReport {
    /// `true` when nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deploys a batch as one unit per version tag, in tag order.
pub struct TaggedDeploymentCoordinator {
    sink: Arc<dyn DeploymentSink>,
    lock: Arc<dyn ExclusiveLock>,
    policy: Arc<VersionTagPolicy>,
    extractor: ResourceVersionExtractor,
}

impl TaggedDeploymentCoordinator {
    /// Create a coordinator.
    pub fn new(
        sink: Arc<dyn DeploymentSink>,
        lock: Arc<dyn ExclusiveLock>,
        policy: Arc<VersionTagPolicy>,
    ) -> Self {
        Self {
            sink,
            lock,
            policy,
            extractor: ResourceVersionExtractor,
        }
    }

    /// Deploy `resources`.
    ///
    /// Only a lock failure aborts the batch. Malformed names and failing
    /// units are recorded in the report while the remaining units proceed.
    pub async fn deploy(
        &self,
        resources: Vec<DeploymentResource>,
        options: &DeployOptions,
    ) -> Result<DeploymentReport, DeployError> {
        let _guard = acquire_exclusive(self.lock.as_ref(), options.use_exclusive_lock).await?;
        tracing::info!(count = resources.len(), deployment = %options.name, "found deployment resources");

        let mut report = DeploymentReport::default();
        let mut groups: BTreeMap<VersionTag, Vec<DeploymentResource>> = BTreeMap::new();
        for resource in resources {
            match self.extractor.extract(&resource.name) {
                Ok(tag) => groups.entry(tag).or_default().push(resource),
                Err(error) => {
                    tracing::warn!(resource = %resource.name, error = %error, "skipping resource");
                    report.failures.push(DeploymentFailure {
                        version_tag: None,
                        resources: vec![resource.name],
                        error,
                    });
                }
            }
        }

        for (version_tag, resources) in groups {
            let names: Vec<String> = resources.iter().map(|r| r.name.clone()).collect();
            tracing::debug!(%version_tag, resources = ?names, "deploying tag group");

            let unit = DeploymentUnit {
                name: options.name.clone(),
                tenant_id: options.tenant_id,
                version_tag: version_tag.clone(),
                resources,
                deploy_changed_only: options.deploy_changed_only,
            };
            match self.sink.deploy(unit, self.policy.as_ref()).await {
                Ok(deployed) => {
                    report.deployed.extend(deployed.definitions);
                    report.overridden.extend(deployed.overridden);
                }
                Err(error) if error.is_pass_fatal() => return Err(error),
                Err(error) => {
                    tracing::warn!(%version_tag, error = %error, "deployment unit failed");
                    report.failures.push(DeploymentFailure {
                        version_tag: Some(version_tag),
                        resources: names,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            count = report.deployed.len(),
            failures = report.failures.len(),
            "deployed definitions"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for TaggedDeploymentCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaggedDeploymentCoordinator")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
