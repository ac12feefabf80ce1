//! Shared fixtures: a memory backend fed through the real deployment pipeline
//! and a recording migration action.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tagline_core::{
    Definition, DefinitionId, DefinitionKey, InstanceId, RunningInstance, VersionTag,
};
use tagline_deploy::{
    DeployOptions, DeploymentResource, TaggedDeploymentCoordinator, VersionTagPolicy,
};
use tagline_migration::{BoxError, MigrationAction, MigrationContext, MigrationDescriptor};
use tagline_ports::{InstanceStore, PortsError};
use tagline_store_memory::MemoryBackend;

pub fn key(raw: &str) -> DefinitionKey {
    DefinitionKey::new(raw).unwrap()
}

/// Deploy one definition of `key` per tag, in the given order.
pub async fn deploy(backend: &MemoryBackend, key: &str, tags: &[&str]) -> Vec<Definition> {
    let store = Arc::new(backend.clone());
    let policy = Arc::new(VersionTagPolicy::new(store.clone(), store.clone()));
    let coordinator = TaggedDeploymentCoordinator::new(store.clone(), store, policy);

    let mut deployed = Vec::new();
    for (round, tag) in tags.iter().enumerate() {
        let body = format!(
            r#"{{"definitions":[{{"key":"{key}","versionTag":"{tag}"}}]}}{}"#,
            " ".repeat(round)
        );
        let resource = DeploymentResource::new(format!("{key}-{tag}.bpmn"), body.into_bytes());
        let report = coordinator
            .deploy(vec![resource], &DeployOptions::default())
            .await
            .unwrap();
        assert!(report.is_clean(), "deployment failed: {:?}", report.failures);
        deployed.extend(report.deployed);
    }
    deployed
}

/// Rebinds like [`tagline_migration::RebindAction`] and records every hop as
/// `source -> target`. Fails on hops leaving `fail_from`.
#[derive(Default)]
pub struct RecordingAction {
    pub calls: Mutex<Vec<String>>,
    pub fail_from: Option<VersionTag>,
}

impl RecordingAction {
    pub fn failing_from(tag: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_from: Some(VersionTag::new(tag)),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MigrationAction for RecordingAction {
    async fn apply(&self, ctx: &MigrationContext<'_>) -> Result<(), BoxError> {
        self.calls.lock().push(format!(
            "{} -> {}",
            ctx.source.version_tag, ctx.target.version_tag
        ));
        if self.fail_from.as_ref() == Some(&ctx.source.version_tag) {
            return Err(format!("cannot leave {}", ctx.source.version_tag).into());
        }
        for &id in ctx.instance_ids {
            ctx.instances.rebind(id, ctx.target.id).await?;
        }
        Ok(())
    }
}

pub fn chain(
    k: &str,
    edges: &[(&str, &str)],
    action: &Arc<RecordingAction>,
) -> Vec<MigrationDescriptor> {
    edges
        .iter()
        .map(|(from, to)| {
            MigrationDescriptor::new(key(k), *from, *to, Arc::clone(action) as Arc<dyn MigrationAction>)
        })
        .collect()
}

/// Instance store that counts listing calls.
pub struct CountingInstances {
    pub inner: MemoryBackend,
    pub listings: AtomicUsize,
}

impl CountingInstances {
    pub fn new(inner: MemoryBackend) -> Self {
        Self {
            inner,
            listings: AtomicUsize::new(0),
        }
    }

    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstanceStore for CountingInstances {
    async fn list_by_definition_key(
        &self,
        key: &DefinitionKey,
    ) -> Result<Vec<RunningInstance>, PortsError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.inner.list_by_definition_key(key).await
    }

    async fn get(&self, id: InstanceId) -> Result<Option<RunningInstance>, PortsError> {
        InstanceStore::get(&self.inner, id).await
    }

    async fn rebind(&self, id: InstanceId, definition: DefinitionId) -> Result<(), PortsError> {
        self.inner.rebind(id, definition).await
    }
}

pub async fn bound_tag(backend: &MemoryBackend, instance: InstanceId) -> VersionTag {
    let instance = InstanceStore::get(backend, instance).await.unwrap().unwrap();
    tagline_ports::DefinitionStore::get(backend, instance.definition_id)
        .await
        .unwrap()
        .unwrap()
        .version_tag
}
