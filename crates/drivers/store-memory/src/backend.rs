//! The in-memory backend.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tagline_core::{
    Definition, DefinitionId, DefinitionKey, DeploymentId, InstanceId, RunningInstance,
    TenantId, VersionTag,
};
use tagline_deploy::{
    DeployError, DeployedUnit, DeploymentHooks, DeploymentResource, DeploymentSink,
    DeploymentUnit,
};
use tagline_ports::{
    DefinitionStore, ExclusiveLock, InstanceStore, LockAcquisition, PortsError,
};

use crate::lock::MemoryLock;
use crate::manifest::declared_definitions;

/// A committed deployment, kept for duplicate filtering.
#[derive(Debug, Clone)]
struct DeploymentRecord {
    name: String,
    tenant_id: Option<TenantId>,
    resources: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct State {
    definitions: Vec<Definition>,
    instances: Vec<RunningInstance>,
    deployments: Vec<DeploymentRecord>,
}

/// In-memory store implementing every Tagline port.
///
/// Cheap to clone; clones share the same state and the same lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<State>>,
    lock: MemoryLock,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The backend's exclusive lock.
    #[must_use]
    pub fn lock(&self) -> &MemoryLock {
        &self.lock
    }

    /// Start a running instance on the definition of `key` with the highest
    /// ordering value.
    pub fn start_instance(&self, key: &DefinitionKey) -> Result<RunningInstance, PortsError> {
        let mut state = self.state.write();
        let definition = state
            .definitions
            .iter()
            .filter(|d| d.key == *key)
            .max_by_key(|d| d.ordering)
            .ok_or_else(|| PortsError::not_found("Definition", key))?;
        let instance = RunningInstance {
            id: InstanceId::v4(),
            definition_key: key.clone(),
            definition_id: definition.id,
        };
        state.instances.push(instance.clone());
        Ok(instance)
    }

    /// Start a running instance on a specific definition.
    pub fn start_instance_on(&self, definition: DefinitionId) -> Result<RunningInstance, PortsError> {
        let mut state = self.state.write();
        let key = state
            .definitions
            .iter()
            .find(|d| d.id == definition)
            .map(|d| d.key.clone())
            .ok_or_else(|| PortsError::not_found("Definition", definition))?;
        let instance = RunningInstance {
            id: InstanceId::v4(),
            definition_key: key,
            definition_id: definition,
        };
        state.instances.push(instance.clone());
        Ok(instance)
    }

    /// Resources of `unit` that differ from the latest deployment of the
    /// same name and tenant.
    ///
    /// With `deploy_changed_only` unchanged resources are dropped; without
    /// it the whole unit is kept as soon as one resource changed.
    fn changed_resources(&self, unit: &DeploymentUnit) -> Vec<DeploymentResource> {
        let state = self.state.read();
        let previous = |name: &str| {
            state
                .deployments
                .iter()
                .rev()
                .filter(|d| d.name == unit.name && d.tenant_id == unit.tenant_id)
                .find_map(|d| d.resources.iter().find(|(n, _)| n == name))
                .map(|(_, hash)| hash.as_str())
        };
        let changed: Vec<bool> = unit
            .resources
            .iter()
            .map(|r| previous(&r.name) != Some(content_hash(&r.content).as_str()))
            .collect();

        if unit.deploy_changed_only {
            unit.resources
                .iter()
                .zip(&changed)
                .filter(|(_, changed)| **changed)
                .map(|(r, _)| r.clone())
                .collect()
        } else if changed.contains(&true) {
            unit.resources.clone()
        } else {
            Vec::new()
        }
    }

    fn commit(
        &self,
        record: DeploymentRecord,
        staged: &[Definition],
    ) -> Result<(), PortsError> {
        let mut state = self.state.write();
        let mut taken: HashSet<(&DefinitionKey, u32)> = state
            .definitions
            .iter()
            .map(|d| (&d.key, d.ordering.get()))
            .collect();
        for definition in staged {
            if !taken.insert((&definition.key, definition.ordering.get())) {
                return Err(PortsError::conflict(
                    "Definition",
                    &definition.key,
                    format!("ordering value {} already used", definition.ordering),
                ));
            }
        }
        drop(taken);
        state.definitions.extend_from_slice(staged);
        state.deployments.push(record);
        Ok(())
    }
}

fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize().as_slice())
}

#[async_trait]
impl DefinitionStore for MemoryBackend {
    async fn list_by_key(&self, key: &DefinitionKey) -> Result<Vec<Definition>, PortsError> {
        Ok(self
            .state
            .read()
            .definitions
            .iter()
            .filter(|d| d.key == *key)
            .cloned()
            .collect())
    }

    async fn get(&self, id: DefinitionId) -> Result<Option<Definition>, PortsError> {
        Ok(self
            .state
            .read()
            .definitions
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn latest_by_tag(
        &self,
        key: &DefinitionKey,
        tag: &VersionTag,
    ) -> Result<Option<Definition>, PortsError> {
        Ok(self
            .state
            .read()
            .definitions
            .iter()
            .filter(|d| d.key == *key && d.version_tag == *tag)
            .max_by_key(|d| d.ordering)
            .cloned())
    }

    async fn deployed_keys(&self) -> Result<Vec<DefinitionKey>, PortsError> {
        let mut keys: Vec<DefinitionKey> = self
            .state
            .read()
            .definitions
            .iter()
            .map(|d| d.key.clone())
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl InstanceStore for MemoryBackend {
    async fn list_by_definition_key(
        &self,
        key: &DefinitionKey,
    ) -> Result<Vec<RunningInstance>, PortsError> {
        Ok(self
            .state
            .read()
            .instances
            .iter()
            .filter(|i| i.definition_key == *key)
            .cloned()
            .collect())
    }

    async fn get(&self, id: InstanceId) -> Result<Option<RunningInstance>, PortsError> {
        Ok(self
            .state
            .read()
            .instances
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn rebind(&self, id: InstanceId, definition: DefinitionId) -> Result<(), PortsError> {
        let mut state = self.state.write();
        let key = state
            .definitions
            .iter()
            .find(|d| d.id == definition)
            .map(|d| d.key.clone())
            .ok_or_else(|| PortsError::not_found("Definition", definition))?;
        let instance = state
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| PortsError::not_found("Instance", id))?;
        if instance.definition_key != key {
            return Err(PortsError::conflict(
                "Instance",
                id,
                format!("cannot move from {} to a definition of {key}", instance.definition_key),
            ));
        }
        instance.definition_id = definition;
        Ok(())
    }
}

#[async_trait]
impl ExclusiveLock for MemoryBackend {
    async fn try_acquire(&self) -> Result<LockAcquisition, PortsError> {
        self.lock.try_acquire().await
    }
}

#[async_trait]
impl DeploymentSink for MemoryBackend {
    async fn deploy(
        &self,
        unit: DeploymentUnit,
        hooks: &dyn DeploymentHooks,
    ) -> Result<DeployedUnit, DeployError> {
        let resources = self.changed_resources(&unit);
        if resources.is_empty() {
            tracing::debug!(
                deployment = %unit.name,
                version_tag = %unit.version_tag,
                "no changed resources, skipping unit"
            );
            return Ok(DeployedUnit::default());
        }

        let deployment_id = DeploymentId::v4();
        let deployed_at: DateTime<Utc> = Utc::now();
        let mut staged: Vec<Definition> = Vec::new();
        for resource in &resources {
            for declared in declared_definitions(resource)? {
                hooks.validate(&unit.name, resource, &declared)?;
                let ordering = hooks.next_ordering(&declared, &staged).await?;
                staged.push(Definition {
                    id: DefinitionId::v4(),
                    key: declared.key,
                    version_tag: declared.version_tag,
                    ordering,
                    deployment_id,
                    resource_name: resource.name.clone(),
                    tenant_id: unit.tenant_id,
                    deployed_at,
                });
            }
        }

        let record = DeploymentRecord {
            name: unit.name.clone(),
            tenant_id: unit.tenant_id,
            resources: resources
                .iter()
                .map(|r| (r.name.clone(), content_hash(&r.content)))
                .collect(),
        };
        self.commit(record, &staged)?;
        tracing::debug!(
            deployment = %deployment_id,
            definitions = staged.len(),
            "deployment committed"
        );

        let mut overridden = Vec::new();
        for definition in &staged {
            overridden.extend(hooks.after_persist(definition).await);
        }
        Ok(DeployedUnit {
            definitions: staged,
            overridden,
        })
    }
}
