//! Integration tests for the instance lifecycle
//!
//! Covers creation, retirement into the history archive, and recovery of
//! instances left archived-but-live by an interrupted writer.

mod common;

use common::fixtures::*;
use directory::database::{HealthStatus, ObservedHealth};
use directory::errors::DirectoryError;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
async fn test_register_create_update_retire_scenario() {
    let db = TestDatabase::new().await.unwrap();
    let monitor = db.health_monitor(Arc::new(StaticProbe::new(ObservedHealth::Up)));

    let service = db.services.register(acme_service()).await.unwrap();
    assert!(!service.service_id.is_nil());
    assert_eq!(service.created_at, service.updated_at);

    let instance = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();
    assert_eq!(instance.health_status, HealthStatus::Starting);
    assert_eq!(instance.host, hosts::PRIMARY);
    assert_eq!(instance.port, hosts::PRIMARY_PORT);
    assert_eq!(instance.created_at, instance.last_checked);

    monitor
        .update_health(instance.instance_id, ObservedHealth::Up)
        .await
        .unwrap();
    let current = db.instances.get(instance.instance_id).await.unwrap();
    assert_eq!(current.health_status, HealthStatus::Up);

    let record = db.instances.retire(instance.instance_id).await.unwrap();
    assert!(matches!(
        db.instances.get(instance.instance_id).await,
        Err(DirectoryError::NotFound { .. })
    ));
    assert_eq!(record.health_status(), Some(HealthStatus::Up));
    assert_eq!(record.started_at, instance.created_at);
    assert!(record.stopped_at >= record.started_at);

    let archived = db.archive.get_for_instance(instance.instance_id).await.unwrap();
    assert_eq!(archived.history_id, record.history_id);
    assert_eq!(archived.metrics["health_status"], "up");

    let second = db.instances.retire(instance.instance_id).await;
    assert!(matches!(second, Err(DirectoryError::NotFound { .. })));
    assert_eq!(db.history_count(instance.instance_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_requires_existing_service() {
    let db = TestDatabase::new().await.unwrap();

    let result = db.instances.create(instance_for(Uuid::new_v4())).await;

    assert!(matches!(result, Err(DirectoryError::NotFound { .. })));
    assert!(db.instances.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_validates_address() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();

    let mut no_port = instance_for(service.service_id);
    no_port.port = 0;
    let mut bad_latitude = instance_for(service.service_id);
    bad_latitude.latitude = 91.0;
    let bad_url = instance_at(service.service_id, "ftp://10.0.0.1/health");

    for request in [no_port, bad_latitude, bad_url] {
        let result = db.instances.create(request).await;
        assert!(matches!(result, Err(DirectoryError::Validation(_))));
    }
}

#[tokio::test]
async fn test_get_unknown_instance_is_not_found() {
    let db = TestDatabase::new().await.unwrap();

    let result = db.instances.get(Uuid::new_v4()).await;

    assert!(matches!(result, Err(DirectoryError::NotFound { .. })));
}

#[tokio::test]
async fn test_retire_unknown_instance_writes_no_history() {
    let db = TestDatabase::new().await.unwrap();
    let instance_id = Uuid::new_v4();

    let result = db.instances.retire(instance_id).await;

    assert!(matches!(result, Err(DirectoryError::NotFound { .. })));
    assert_eq!(db.history_count(instance_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_retire_archives_once() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let instance = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();

    let attempts = (0..4).map(|_| {
        let instances = db.instances.clone();
        let instance_id = instance.instance_id;
        tokio::spawn(async move { instances.retire(instance_id).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let not_found = results
        .iter()
        .filter(|r| matches!(r, Err(DirectoryError::NotFound { .. })))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(not_found, 3);
    assert_eq!(db.history_count(instance.instance_id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_retire_on_file_store_archives_once() {
    let db = TestDatabase::on_disk().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let attempts_per_instance = 8;

    for _ in 0..5 {
        let instance = db
            .instances
            .create(instance_for(service.service_id))
            .await
            .unwrap();

        let attempts = (0..attempts_per_instance).map(|_| {
            let instances = db.instances.clone();
            let instance_id = instance.instance_id;
            tokio::spawn(async move { instances.retire(instance_id).await })
        });
        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let not_found = results
            .iter()
            .filter(|r| matches!(r, Err(DirectoryError::NotFound { .. })))
            .count();
        assert_eq!(succeeded, 1, "results: {:?}", results);
        assert_eq!(not_found, attempts_per_instance - 1, "results: {:?}", results);
        assert_eq!(db.history_count(instance.instance_id).await.unwrap(), 1);
        assert!(matches!(
            db.instances.get(instance.instance_id).await,
            Err(DirectoryError::NotFound { .. })
        ));
    }
}

#[tokio::test]
async fn test_cancelled_retire_leaves_instance_live() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let instance = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();

    let cancelled = tokio::time::timeout(
        Duration::from_nanos(1),
        db.instances.retire(instance.instance_id),
    )
    .await;

    assert!(cancelled.is_err());
    let live = db.instances.get(instance.instance_id).await.unwrap();
    assert_eq!(live.instance_id, instance.instance_id);
    assert_eq!(db.history_count(instance.instance_id).await.unwrap(), 0);

    let record = db.instances.retire(instance.instance_id).await.unwrap();
    assert_eq!(record.instance_id, instance.instance_id);
    assert_eq!(db.history_count(instance.instance_id).await.unwrap(), 1);
    assert!(matches!(
        db.instances.retire(instance.instance_id).await,
        Err(DirectoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_retired_instance_leaves_live_listing() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let keep = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();
    let retire = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();

    db.instances.retire(retire.instance_id).await.unwrap();

    let live = db.instances.list_for_service(service.service_id).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].instance_id, keep.instance_id);

    let history = db.archive.list_for_service(service.service_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].instance_id, retire.instance_id);
}

#[tokio::test]
async fn test_archived_live_instance_reports_orphan_pending() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let instance = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();
    db.archive_without_delete(&instance).await.unwrap();

    let result = db.instances.get(instance.instance_id).await;

    match result {
        Err(e @ DirectoryError::OrphanPending { .. }) => assert!(e.is_retryable()),
        other => panic!("expected OrphanPending, got {:?}", other),
    }
    assert!(db
        .instances
        .list_for_service(service.service_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_retire_completes_orphan_without_rearchiving() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let instance = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();
    db.archive_without_delete(&instance).await.unwrap();
    let original = db.archive.get_for_instance(instance.instance_id).await.unwrap();

    let record = db.instances.retire(instance.instance_id).await.unwrap();

    assert_eq!(record.history_id, original.history_id);
    assert_eq!(db.history_count(instance.instance_id).await.unwrap(), 1);
    assert!(matches!(
        db.instances.get(instance.instance_id).await,
        Err(DirectoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_reconcile_removes_orphaned_rows() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let orphan = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();
    let healthy = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();
    db.archive_without_delete(&orphan).await.unwrap();

    let reconciled = db.instances.reconcile_orphans().await.unwrap();

    assert_eq!(reconciled, vec![orphan.instance_id]);
    assert!(matches!(
        db.instances.get(orphan.instance_id).await,
        Err(DirectoryError::NotFound { .. })
    ));
    assert!(db.instances.get(healthy.instance_id).await.is_ok());
    assert_eq!(db.history_count(orphan.instance_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_record_usage_accumulates_weighted_average() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let instance = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();

    db.instances
        .record_usage(instance.instance_id, 10, 20.0)
        .await
        .unwrap();
    let updated = db
        .instances
        .record_usage(instance.instance_id, 30, 40.0)
        .await
        .unwrap();

    assert_eq!(updated.transaction_count, 40);
    assert!((updated.avg_response_time - 35.0).abs() < 1e-9);

    let parent = db.services.get(service.service_id).await.unwrap();
    assert_eq!(parent.transaction_count, 40);
    assert!((parent.avg_response_time - 35.0).abs() < 1e-9);

    let record = db.instances.retire(instance.instance_id).await.unwrap();
    assert_eq!(record.transaction_count(), 40);
    assert!((record.avg_response_time() - 35.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_record_usage_on_retired_instance_is_not_found() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let instance = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();
    db.instances.retire(instance.instance_id).await.unwrap();

    let result = db.instances.record_usage(instance.instance_id, 1, 1.0).await;

    assert!(matches!(result, Err(DirectoryError::NotFound { .. })));
}
