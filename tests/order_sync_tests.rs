mod common;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bricksync_backend::models::order::SyncStatus;
use bricksync_backend::services::client_cache::ClientCacheError;
use bricksync_backend::services::order_sync::{OrderSyncService, OrderSyncer, SyncError};

use common::{
    InMemoryCredentialStore, InMemoryOrderRepository, client_cache, envelope, error_envelope,
    order_json,
};

const USER: i64 = 7;

struct Harness {
    server: MockServer,
    repo: Arc<InMemoryOrderRepository>,
    service: Arc<OrderSyncService>,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let store = Arc::new(InMemoryCredentialStore::with_users(&[USER]));
    let repo = Arc::new(InMemoryOrderRepository::default());
    let clients = client_cache(&server.uri(), store);
    let service = Arc::new(OrderSyncService::new(clients, repo.clone()));
    Harness {
        server,
        repo,
        service,
    }
}

async fn mount_orders(server: &MockServer, orders: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(orders)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sync_creates_orders_and_completes() {
    let h = harness().await;
    mount_orders(
        &h.server,
        json!([
            order_json(1001, "2024-01-15T10:30:00.000Z", "42.50"),
            order_json(1002, "2024-01-16T08:00:00.000Z", "10.00"),
        ]),
    )
    .await;

    let run = h.service.sync_orders(USER).await.unwrap();

    assert_eq!(run.status, SyncStatus::Completed);
    assert_eq!(run.orders_count, 2);
    assert_eq!(run.error_message, None);

    let rows = h.repo.orders_for(USER);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].order.bricklink_order_id, 1001);
    assert_eq!(
        rows[0].order.date_ordered,
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    );
    assert_eq!(rows[0].order.cost.grand_total, Some(dec!(42.50)));
    assert_eq!(rows[0].order.payment.currency_code.as_deref(), Some("USD"));
    assert_eq!(rows[0].order.shipping.method, None);
}

#[tokio::test]
async fn test_second_sync_updates_instead_of_duplicating() {
    let h = harness().await;
    mount_orders(
        &h.server,
        json!([order_json(1001, "2024-01-15T10:30:00.000Z", "42.50")]),
    )
    .await;

    h.service.sync_orders(USER).await.unwrap();
    let first = h.repo.orders_for(USER);
    let second_run = h.service.sync_orders(USER).await.unwrap();
    let second = h.repo.orders_for(USER);

    assert_eq!(second_run.status, SyncStatus::Completed);
    assert_eq!(second_run.orders_count, 1);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, first[0].id);
    assert_eq!(second[0].created_at, first[0].created_at);
    assert!(second[0].updated_at >= first[0].updated_at);
    assert_eq!(h.repo.runs_for(USER).len(), 2);
}

#[tokio::test]
async fn test_empty_order_list_completes_with_zero() {
    let h = harness().await;
    mount_orders(&h.server, json!([])).await;

    let run = h.service.sync_orders(USER).await.unwrap();

    assert_eq!(run.status, SyncStatus::Completed);
    assert_eq!(run.orders_count, 0);
    assert!(h.repo.orders_for(USER).is_empty());
}

#[tokio::test]
async fn test_api_error_fails_run_without_writing_orders() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_envelope(
            401,
            "BAD_OAUTH_REQUEST",
            "Invalid signature",
        )))
        .mount(&h.server)
        .await;

    let err = h.service.sync_orders(USER).await.unwrap_err();
    assert!(matches!(err, SyncError::Api(_)), "got {:?}", err);

    let runs = h.repo.runs_for(USER);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, SyncStatus::Failed);
    assert!(runs[0].error_message.as_deref().unwrap().contains("BAD_OAUTH_REQUEST"));
    assert!(h.repo.orders_for(USER).is_empty());
}

#[tokio::test]
async fn test_cursor_comes_from_last_completed_run_only() {
    let h = harness().await;
    h.repo.push_run(
        USER,
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        SyncStatus::Completed,
    );
    h.repo.push_run(
        USER,
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        SyncStatus::Failed,
    );

    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(query_param("updated_after", "2024-03-01"))
        .and(query_param("direction", "in"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .expect(1)
        .mount(&h.server)
        .await;

    let run = h.service.sync_orders(USER).await.unwrap();
    assert_eq!(run.status, SyncStatus::Completed);
}

#[tokio::test]
async fn test_failed_run_does_not_move_cursor() {
    let h = harness().await;
    h.repo.push_run(
        USER,
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        SyncStatus::Completed,
    );
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;

    assert!(h.service.sync_orders(USER).await.is_err());

    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(query_param("updated_after", "2024-03-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .expect(1)
        .mount(&h.server)
        .await;

    let run = h.service.sync_orders(USER).await.unwrap();
    assert_eq!(run.status, SyncStatus::Completed);
}

#[tokio::test]
async fn test_partial_failure_completes_with_errors() {
    let h = harness().await;
    h.repo.fail_upserts_for(1002);
    mount_orders(
        &h.server,
        json!([
            order_json(1001, "2024-01-15T10:30:00.000Z", "42.50"),
            order_json(1002, "2024-01-16T08:00:00.000Z", "10.00"),
            order_json(1003, "2024-01-17T08:00:00.000Z", "5.00"),
        ]),
    )
    .await;

    let run = h.service.sync_orders(USER).await.unwrap();

    assert_eq!(run.status, SyncStatus::CompletedWithErrors);
    assert_eq!(run.orders_count, 2);
    let message = run.error_message.unwrap();
    assert!(message.starts_with("1 of 3 orders failed to sync"), "{}", message);
    assert!(message.contains("1002"));
    assert_eq!(h.repo.orders_for(USER).len(), 2);
}

#[tokio::test]
async fn test_unparseable_order_date_counts_as_failure() {
    let h = harness().await;
    mount_orders(
        &h.server,
        json!([
            order_json(1001, "2024-01-15T10:30:00.000Z", "42.50"),
            order_json(1002, "yesterday", "10.00"),
        ]),
    )
    .await;

    let run = h.service.sync_orders(USER).await.unwrap();

    assert_eq!(run.status, SyncStatus::CompletedWithErrors);
    assert_eq!(run.orders_count, 1);
    assert!(run.error_message.unwrap().contains("yesterday"));
}

#[tokio::test]
async fn test_every_order_failing_completes_with_errors() {
    let h = harness().await;
    h.repo.fail_upserts_for(1001);
    h.repo.fail_upserts_for(1002);
    mount_orders(
        &h.server,
        json!([
            order_json(1001, "2024-01-15T10:30:00.000Z", "42.50"),
            order_json(1002, "2024-01-16T08:00:00.000Z", "10.00"),
        ]),
    )
    .await;

    let run = h.service.sync_orders(USER).await.unwrap();

    assert_eq!(run.status, SyncStatus::CompletedWithErrors);
    assert_eq!(run.orders_count, 0);
    assert!(run.error_message.unwrap().starts_with("2 of 2 orders failed"));
    // Only completed runs move the cursor, so these orders are fetched again
    assert_eq!(
        h.repo.runs_for(USER).iter().filter(|r| r.status == SyncStatus::Completed).count(),
        0
    );
}

#[tokio::test]
async fn test_malformed_order_does_not_drop_valid_orders() {
    let h = harness().await;
    let mut malformed = order_json(1002, "2024-01-16T08:00:00.000Z", "10.00");
    malformed["total_weight"] = json!(12.5);
    mount_orders(
        &h.server,
        json!([order_json(1001, "2024-01-15T10:30:00.000Z", "42.50"), malformed]),
    )
    .await;

    let run = h.service.sync_orders(USER).await.unwrap();

    assert_eq!(run.status, SyncStatus::CompletedWithErrors);
    assert_eq!(run.orders_count, 1);
    let message = run.error_message.unwrap();
    assert!(message.starts_with("1 of 2 orders failed to sync"), "{}", message);
    assert!(message.contains("order 1002"), "{}", message);

    let rows = h.repo.orders_for(USER);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].order.bricklink_order_id, 1001);
}

#[tokio::test]
async fn test_second_sync_with_no_new_orders() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            order_json(1001, "2024-01-15T10:30:00.000Z", "42.50"),
            order_json(1002, "2024-01-16T08:00:00.000Z", "10.00"),
        ]))))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .mount(&h.server)
        .await;

    let first = h.service.sync_orders(USER).await.unwrap();
    assert_eq!(first.orders_count, 2);

    let second = h.service.sync_orders(USER).await.unwrap();

    assert_eq!(second.status, SyncStatus::Completed);
    assert_eq!(second.orders_count, 0);
    assert_eq!(second.error_message, None);
    assert_eq!(h.repo.orders_for(USER).len(), 2);
}

#[tokio::test]
async fn test_missing_credentials_fails_run() {
    let h = harness().await;

    let err = h.service.sync_orders(99).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Client(ClientCacheError::MissingCredentials { user_id: 99 })
    ));
    let runs = h.repo.runs_for(99);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, SyncStatus::Failed);
}

#[tokio::test]
async fn test_concurrent_sync_for_same_user_is_rejected() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!([])))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&h.server)
        .await;

    let service = h.service.clone();
    let first = tokio::spawn(async move { service.sync_orders(USER).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = h.service.sync_orders(USER).await.unwrap_err();
    assert!(matches!(err, SyncError::AlreadyRunning { user_id: USER }));

    let run = first.await.unwrap().unwrap();
    assert_eq!(run.status, SyncStatus::Completed);
    // The rejected attempt never recorded a run
    assert_eq!(h.repo.runs_for(USER).len(), 1);
}

#[tokio::test]
async fn test_cancelled_sync_records_failed_run() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .expect(0)
        .mount(&h.server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = h
        .service
        .sync_orders_with_cancellation(USER, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Cancelled { user_id: USER }));
    let runs = h.repo.runs_for(USER);
    assert_eq!(runs[0].status, SyncStatus::Failed);
    assert_eq!(runs[0].error_message.as_deref(), Some("sync cancelled"));
}

#[tokio::test]
async fn test_finalize_failure_is_reported() {
    let h = harness().await;
    h.repo.fail_finalize();
    mount_orders(
        &h.server,
        json!([order_json(1001, "2024-01-15T10:30:00.000Z", "42.50")]),
    )
    .await;

    let err = h.service.sync_orders(USER).await.unwrap_err();

    match err {
        SyncError::FinalizeFailed { run, .. } => {
            assert_eq!(run.status, SyncStatus::Completed);
            assert_eq!(run.orders_count, 1);
        }
        other => panic!("expected finalize failure, got {:?}", other),
    }
    // Orders were written even though the run row could not be closed
    assert_eq!(h.repo.orders_for(USER).len(), 1);
    assert_eq!(h.repo.runs_for(USER)[0].status, SyncStatus::InProgress);
}
