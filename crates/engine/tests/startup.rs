//! End-to-end startup: deploy through the memory backend, then auto-migrate.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tagline_core::{DefinitionKey, VersionTag};
use tagline_deploy::{DeployError, DeploymentResource};
use tagline_engine::{EngineConfig, EngineError, EngineStores, MigratingEngine, MigrationConfig};
use tagline_migration::{MigrationDescriptor, MigrationRegistry, RebindAction};
use tagline_ports::{DefinitionStore, InstanceStore, acquire_exclusive};
use tagline_store_memory::MemoryBackend;

fn resource(key: &str, tag: &str) -> DeploymentResource {
    DeploymentResource::new(
        format!("{key}-{tag}.bpmn"),
        format!(r#"{{"definitions":[{{"key":"{key}","versionTag":"{tag}"}}]}}"#).into_bytes(),
    )
}

fn registry(key: &str, edges: &[(&str, &str)]) -> Arc<MigrationRegistry> {
    let key = DefinitionKey::new(key).unwrap();
    let descriptors = edges.iter().map(|&(source, target)| {
        MigrationDescriptor::new(key.clone(), source, target, Arc::new(RebindAction))
    });
    Arc::new(MigrationRegistry::new(descriptors).unwrap())
}

fn engine(backend: &MemoryBackend, config: EngineConfig, registry: Arc<MigrationRegistry>) -> MigratingEngine {
    MigratingEngine::new(config, EngineStores::from_backend(Arc::new(backend.clone())), registry)
}

async fn bound_tag(backend: &MemoryBackend, instance: tagline_core::InstanceId) -> VersionTag {
    let instance = InstanceStore::get(backend, instance).await.unwrap().unwrap();
    DefinitionStore::get(backend, instance.definition_id)
        .await
        .unwrap()
        .unwrap()
        .version_tag
}

#[tokio::test]
async fn second_start_moves_instances_to_the_new_tag() {
    let backend = MemoryBackend::new();
    let registry = registry("invoice", &[("1.0", "2.0")]);

    let first = engine(&backend, EngineConfig::default(), Arc::clone(&registry))
        .start(vec![resource("invoice", "1.0")])
        .await
        .unwrap();
    assert!(first.is_clean());
    assert_eq!(first.deployment.deployed.len(), 1);
    assert_eq!(first.migration.as_ref().map(|m| m.hops_applied()), Some(0));

    let key = DefinitionKey::new("invoice").unwrap();
    let instance = backend.start_instance(&key).unwrap();

    let second = engine(&backend, EngineConfig::default(), registry)
        .start(vec![resource("invoice", "1.0"), resource("invoice", "2.0")])
        .await
        .unwrap();
    assert!(second.is_clean());
    // 1.0 is unchanged and skipped
    assert_eq!(second.deployment.deployed.len(), 1);
    let migration = second.migration.unwrap();
    assert_eq!(migration.instances_migrated(), 1);
    assert_eq!(migration.hops_applied(), 1);
    assert_eq!(bound_tag(&backend, instance.id).await, VersionTag::new("2.0"));
}

#[tokio::test]
async fn disabled_auto_migration_only_deploys() {
    let backend = MemoryBackend::new();
    let config = EngineConfig {
        migration: MigrationConfig {
            auto_migrate_on_start: false,
            ..MigrationConfig::default()
        },
        ..EngineConfig::default()
    };
    let engine = engine(&backend, config, registry("invoice", &[("1.0", "2.0")]));

    engine.start(vec![resource("invoice", "1.0")]).await.unwrap();
    let instance = backend
        .start_instance(&DefinitionKey::new("invoice").unwrap())
        .unwrap();

    let report = engine.start(vec![resource("invoice", "2.0")]).await.unwrap();
    assert!(report.migration.is_none());
    assert_eq!(bound_tag(&backend, instance.id).await, VersionTag::new("1.0"));

    let pass = engine.migrate().await.unwrap();
    assert_eq!(pass.instances_migrated(), 1);
    assert_eq!(bound_tag(&backend, instance.id).await, VersionTag::new("2.0"));
}

#[tokio::test]
async fn failed_unit_does_not_stop_migration() {
    let backend = MemoryBackend::new();
    let engine = engine(&backend, EngineConfig::default(), registry("invoice", &[("1.0", "2.0")]));

    engine.start(vec![resource("invoice", "1.0")]).await.unwrap();
    let instance = backend
        .start_instance(&DefinitionKey::new("invoice").unwrap())
        .unwrap();

    let report = engine
        .start(vec![
            resource("invoice", "2.0"),
            DeploymentResource::new("notes.txt", b"not a process".to_vec()),
        ])
        .await
        .unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.deployment.failures.len(), 1);
    assert_eq!(report.deployment.failures[0].resources, vec!["notes.txt".to_owned()]);
    assert_eq!(report.migration.map(|m| m.instances_migrated()), Some(1));
    assert_eq!(bound_tag(&backend, instance.id).await, VersionTag::new("2.0"));
}

#[tokio::test]
async fn held_lock_aborts_start() {
    let backend = MemoryBackend::new();
    let held = acquire_exclusive(backend.lock(), true).await.unwrap();
    assert!(held.is_some());

    let err = engine(&backend, EngineConfig::default(), registry("invoice", &[]))
        .start(vec![resource("invoice", "1.0")])
        .await
        .unwrap_err();
    assert!(
        matches!(err, EngineError::Deploy(DeployError::LockUnavailable { .. })),
        "got {err:?}"
    );
}

#[tokio::test]
async fn lock_can_be_switched_off() {
    let backend = MemoryBackend::new();
    let _held = acquire_exclusive(backend.lock(), true).await.unwrap();

    let mut config = EngineConfig::default();
    config.locking.use_exclusive_lock = false;
    let report = engine(&backend, config, registry("invoice", &[]))
        .start(vec![resource("invoice", "1.0")])
        .await
        .unwrap();
    assert_eq!(report.deployment.deployed.len(), 1);
    assert_eq!(report.migration.map(|m| m.keys_scanned), Some(1));
}
