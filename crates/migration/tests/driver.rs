mod common;

use std::sync::Arc;

use common::{CountingInstances, RecordingAction, bound_tag, chain, deploy, key};
use pretty_assertions::assert_eq;
use tagline_core::VersionTag;
use tagline_migration::{
    AutoMigrationDriver, DriverOptions, MigrationDescriptor, MigrationError, MigrationRegistry,
};
use tagline_ports::{ExclusiveLock, NoopLock, acquire_exclusive};
use tagline_store_memory::MemoryBackend;

fn driver(
    backend: &MemoryBackend,
    descriptors: Vec<MigrationDescriptor>,
    options: DriverOptions,
) -> AutoMigrationDriver {
    let store = Arc::new(backend.clone());
    let registry = Arc::new(MigrationRegistry::new(descriptors).unwrap());
    AutoMigrationDriver::new(registry, store.clone(), store.clone(), store, options)
}

#[tokio::test]
async fn one_pass_carries_an_instance_to_the_end_of_the_chain() {
    let backend = MemoryBackend::new();
    let deployed = deploy(&backend, "invoice", &["1.0", "2.0", "3.0"]).await;
    let instance = backend.start_instance_on(deployed[0].id).unwrap();

    let action = Arc::new(RecordingAction::default());
    let driver = driver(
        &backend,
        chain("invoice", &[("1.0", "2.0"), ("2.0", "3.0")], &action),
        DriverOptions::default(),
    );
    let report = driver.run_once().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.keys_scanned, 1);
    assert_eq!(report.instances_migrated(), 1);
    assert_eq!(report.hops_applied(), 2);
    assert_eq!(action.calls(), vec!["1.0 -> 2.0", "2.0 -> 3.0"]);
    assert_eq!(bound_tag(&backend, instance.id).await, VersionTag::new("3.0"));

    // A second pass finds nothing left to do.
    let again = driver.run_once().await.unwrap();
    assert!(again.outcomes.is_empty());
    assert_eq!(action.calls().len(), 2);
}

#[tokio::test]
async fn a_failing_instance_does_not_stop_its_siblings() {
    let backend = MemoryBackend::new();
    let deployed = deploy(&backend, "invoice", &["1.0", "2.0", "3.0"]).await;
    let failing = backend.start_instance_on(deployed[0].id).unwrap();
    let sibling = backend.start_instance_on(deployed[1].id).unwrap();

    let action = Arc::new(RecordingAction::failing_from("1.0"));
    let report = driver(
        &backend,
        chain("invoice", &[("1.0", "2.0"), ("2.0", "3.0")], &action),
        DriverOptions::default(),
    )
    .run_once()
    .await
    .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].instance_id, failing.id);
    assert!(matches!(
        report.failures[0].error,
        MigrationError::ActionFailed { .. }
    ));
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].instance_id, sibling.id);

    assert_eq!(bound_tag(&backend, failing.id).await, VersionTag::new("1.0"));
    assert_eq!(bound_tag(&backend, sibling.id).await, VersionTag::new("3.0"));
}

#[tokio::test]
async fn keys_without_migrations_are_not_queried() {
    let backend = MemoryBackend::new();
    let invoices = deploy(&backend, "invoice", &["1.0", "2.0"]).await;
    deploy(&backend, "shipping", &["1.0", "2.0"]).await;
    let instance = backend.start_instance_on(invoices[0].id).unwrap();
    backend.start_instance(&key("shipping")).unwrap();

    let store = Arc::new(backend.clone());
    let instances = Arc::new(CountingInstances::new(backend.clone()));
    let action = Arc::new(RecordingAction::default());
    let registry =
        Arc::new(MigrationRegistry::new(chain("invoice", &[("1.0", "2.0")], &action)).unwrap());
    let driver = AutoMigrationDriver::new(
        registry,
        store.clone(),
        instances.clone(),
        store,
        DriverOptions::default(),
    );

    let report = driver.run_once().await.unwrap();
    assert_eq!(report.keys_scanned, 2);
    assert_eq!(instances.listings(), 1);
    assert_eq!(bound_tag(&backend, instance.id).await, VersionTag::new("2.0"));
}

#[tokio::test]
async fn only_instances_on_a_source_tag_are_run() {
    let backend = MemoryBackend::new();
    let deployed = deploy(&backend, "invoice", &["1.0", "2.0", "3.0"]).await;
    backend.start_instance_on(deployed[0].id).unwrap();
    backend.start_instance_on(deployed[2].id).unwrap();

    let action = Arc::new(RecordingAction::default());
    let report = driver(
        &backend,
        chain("invoice", &[("1.0", "2.0")], &action),
        DriverOptions::default(),
    )
    .run_once()
    .await
    .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(action.calls(), vec!["1.0 -> 2.0"]);
}

#[tokio::test]
async fn concurrent_instances_all_complete() {
    let backend = MemoryBackend::new();
    let deployed = deploy(&backend, "invoice", &["1.0", "2.0", "3.0"]).await;
    let instances: Vec<_> = (0..8)
        .map(|_| backend.start_instance_on(deployed[0].id).unwrap())
        .collect();

    let action = Arc::new(RecordingAction::default());
    let report = driver(
        &backend,
        chain("invoice", &[("1.0", "2.0"), ("2.0", "3.0")], &action),
        DriverOptions {
            max_concurrent_instances: 4,
            ..DriverOptions::default()
        },
    )
    .run_once()
    .await
    .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.instances_migrated(), 8);
    assert_eq!(report.hops_applied(), 16);
    for instance in instances {
        assert_eq!(bound_tag(&backend, instance.id).await, VersionTag::new("3.0"));
    }
}

#[tokio::test]
async fn held_lock_aborts_the_pass() {
    let backend = MemoryBackend::new();
    let deployed = deploy(&backend, "invoice", &["1.0", "2.0"]).await;
    let instance = backend.start_instance_on(deployed[0].id).unwrap();
    let action = Arc::new(RecordingAction::default());
    let driver = driver(
        &backend,
        chain("invoice", &[("1.0", "2.0")], &action),
        DriverOptions::default(),
    );

    let held = acquire_exclusive(backend.lock(), true).await.unwrap();
    let err = driver.run_once().await.unwrap_err();
    assert!(matches!(err, MigrationError::LockUnavailable { .. }));
    assert!(action.calls().is_empty());

    drop(held);
    driver.run_once().await.unwrap();
    assert_eq!(bound_tag(&backend, instance.id).await, VersionTag::new("2.0"));
}

#[tokio::test]
async fn lock_is_released_after_the_pass() {
    let backend = MemoryBackend::new();
    deploy(&backend, "invoice", &["1.0"]).await;
    let driver = driver(&backend, Vec::new(), DriverOptions::default());

    driver.run_once().await.unwrap();
    assert!(!backend.lock().is_locked());
    assert!(matches!(
        backend.lock().try_acquire().await.unwrap(),
        tagline_ports::LockAcquisition::Acquired(_)
    ));
}

#[tokio::test]
async fn unsupported_lock_still_runs() {
    let backend = MemoryBackend::new();
    let deployed = deploy(&backend, "invoice", &["1.0", "2.0"]).await;
    let instance = backend.start_instance_on(deployed[0].id).unwrap();

    let store = Arc::new(backend.clone());
    let action = Arc::new(RecordingAction::default());
    let registry =
        Arc::new(MigrationRegistry::new(chain("invoice", &[("1.0", "2.0")], &action)).unwrap());
    let driver = AutoMigrationDriver::new(
        registry,
        store.clone(),
        store,
        Arc::new(NoopLock),
        DriverOptions::default(),
    );

    driver.run_once().await.unwrap();
    assert_eq!(bound_tag(&backend, instance.id).await, VersionTag::new("2.0"));
}
