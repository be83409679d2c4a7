//! Integration tests for per-service statistics

mod common;

use common::fixtures::*;
use directory::errors::DirectoryError;
use serde_json::Value;
use uuid::Uuid;

#[tokio::test]
async fn test_statistics_for_unknown_service_is_not_found() {
    let db = TestDatabase::new().await.unwrap();

    let result = db.statistics().retrieve_statistics(Uuid::new_v4()).await;

    assert!(matches!(result, Err(DirectoryError::NotFound { .. })));
}

#[tokio::test]
async fn test_statistics_for_empty_service_are_zero() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();

    let stats = db
        .statistics()
        .retrieve_statistics(service.service_id)
        .await
        .unwrap();

    assert_eq!(stats.service_id, service.service_id);
    assert_eq!(stats.transaction_count, 0);
    assert_eq!(stats.avg_response_time, 0.0);
}

#[tokio::test]
async fn test_statistics_combine_live_and_retired_instances() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();
    let live = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();
    let retired = db
        .instances
        .create(instance_for(service.service_id))
        .await
        .unwrap();

    db.instances
        .record_usage(live.instance_id, 30, 10.0)
        .await
        .unwrap();
    db.instances
        .record_usage(retired.instance_id, 10, 50.0)
        .await
        .unwrap();
    db.instances.retire(retired.instance_id).await.unwrap();

    let stats = db
        .statistics()
        .retrieve_statistics(service.service_id)
        .await
        .unwrap();

    assert_eq!(stats.transaction_count, 40);
    // (30 * 10 + 10 * 50) / 40
    assert!((stats.avg_response_time - 20.0).abs() < 1e-9);
    assert_eq!(stats.details["live_instances"], Value::from(1u64));
    assert_eq!(stats.details["retired_instances"], Value::from(1u64));
    assert_eq!(stats.details["instances_starting"], Value::from(1u64));
}

#[tokio::test]
async fn test_statistics_ignore_other_services() {
    let db = TestDatabase::new().await.unwrap();
    let acme = db.services.register(acme_service()).await.unwrap();
    let weather = db
        .services
        .register(service_details(names::WEATHER))
        .await
        .unwrap();
    let other = db
        .instances
        .create(instance_for(weather.service_id))
        .await
        .unwrap();
    db.instances
        .record_usage(other.instance_id, 100, 5.0)
        .await
        .unwrap();

    let stats = db
        .statistics()
        .retrieve_statistics(acme.service_id)
        .await
        .unwrap();

    assert_eq!(stats.transaction_count, 0);
}

#[tokio::test]
async fn test_statistics_serialize_average_response_time() {
    let db = TestDatabase::new().await.unwrap();
    let service = db.services.register(acme_service()).await.unwrap();

    let stats = db
        .statistics()
        .retrieve_statistics(service.service_id)
        .await
        .unwrap();
    let json = serde_json::to_value(&stats).unwrap();

    assert!(json.get("average_response_time").is_some());
    assert_eq!(json["service_id"], service.service_id.to_string());
}
