//! SellApp webhook intake through the full router.

mod common;

use axum::http::StatusCode;
use common::{MockFollowiz, post_json, provider_config, send, test_app};
use serde_json::{Value, json};

fn paid_order(id: Value) -> Value {
    json!({
        "event": "order.paid",
        "data": {
            "id": id,
            "product_variants": [{
                "quantity": 250,
                "additional_information": [
                    {"label": "Username", "value": ""},
                    {"label": "Post link", "value": "https://instagram.com/p/abc"}
                ]
            }]
        }
    })
}

#[tokio::test]
async fn other_events_are_acknowledged_and_ignored() {
    let provider = MockFollowiz::start(json!({"order": 1})).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json(
            "/api/sellapp-webhook",
            json!({"event": "order.created", "data": {"id": 5}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["ignored"], true);
    assert_eq!(provider.call_count(), 0);
    assert_eq!(test.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn paid_order_creates_followiz_order_and_stores_mapping() {
    let provider = MockFollowiz::start(json!({"order": "999"})).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json("/api/sellapp-webhook", paid_order(json!(31337))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"ok": true, "sellapp_order_id": "31337", "followiz_order_id": "999"})
    );

    let mapping = test
        .store
        .find_by_checkout_id("31337")
        .await
        .unwrap()
        .expect("mapping");
    assert_eq!(mapping.followiz_order_id, "999");

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["action"], "add");
    assert_eq!(requests[0]["key"], "secret");
    assert_eq!(requests[0]["service"], "42");
    assert_eq!(requests[0]["link"], "https://instagram.com/p/abc");
    assert_eq!(requests[0]["quantity"], "250");
}

#[tokio::test]
async fn paid_order_without_link_uses_fallback() {
    let provider = MockFollowiz::start(json!({"order": 12})).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json(
            "/api/sellapp-webhook",
            json!({"event": "order.paid", "data": {"id": "abc", "product_variants": []}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["followiz_order_id"], "12");
    let requests = provider.requests();
    assert_eq!(requests[0]["link"], "https://fallback.example/profile");
    assert_eq!(requests[0]["quantity"], "1");
}

#[tokio::test]
async fn supplied_followiz_id_is_stored_without_provider_call() {
    let provider = MockFollowiz::start(json!({"order": 1})).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json(
            "/api/sellapp-webhook",
            json!({"event": "order.paid", "data": {"id": 8, "followiz_order_id": 4444}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["followiz_order_id"], "4444");
    assert_eq!(provider.call_count(), 0);
    let mapping = test.store.find_by_checkout_id("8").await.unwrap().unwrap();
    assert_eq!(mapping.followiz_order_id, "4444");
}

#[tokio::test]
async fn paid_order_without_auto_create_config_is_acknowledged() {
    let provider = MockFollowiz::start(json!({"order": 1})).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), None)).await;

    let (status, body) = send(
        &test.app,
        post_json("/api/sellapp-webhook", paid_order(json!("77"))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "sellapp_order_id": "77"}));
    assert_eq!(provider.call_count(), 0);
    assert_eq!(test.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn provider_rejection_stores_nothing() {
    let provider = MockFollowiz::start(json!({"error": "Not enough funds on balance"})).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json("/api/sellapp-webhook", paid_order(json!(1))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Provider rejected the order");
    assert_eq!(body["details"], "Not enough funds on balance");
    assert_eq!(test.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn paid_order_without_id_is_rejected() {
    let provider = MockFollowiz::start(json!({"order": 1})).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json("/api/sellapp-webhook", json!({"event": "order.paid", "data": {}})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "data.id required");
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn ignored_event_with_odd_data_is_still_acknowledged() {
    let provider = MockFollowiz::start(json!({"order": 1})).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json(
            "/api/sellapp-webhook",
            json!({
                "event": "order.created",
                "data": {"id": 5, "product_variants": [{"quantity": "2", "additional_information": null}]}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ignored"], true);
    assert_eq!(provider.call_count(), 0);
    assert_eq!(test.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn paid_order_with_string_quantity_and_null_fields() {
    let provider = MockFollowiz::start(json!({"order": 321})).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json(
            "/api/sellapp-webhook",
            json!({
                "event": "order.paid",
                "data": {"id": 90, "product_variants": [{"quantity": "250", "additional_information": null}]}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["followiz_order_id"], "321");
    let requests = provider.requests();
    assert_eq!(requests[0]["quantity"], "250");
    assert_eq!(requests[0]["link"], "https://fallback.example/profile");
    assert_eq!(test.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn unreachable_provider_on_paid_order_stores_nothing() {
    let test = test_app(provider_config("http://127.0.0.1:1/api/v2", Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json("/api/sellapp-webhook", paid_order(json!(2))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to contact provider");
    assert_eq!(test.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn non_json_add_reply_stores_nothing() {
    let provider = MockFollowiz::start_raw("Service temporarily unavailable".to_string()).await;
    let test = test_app(provider_config(&provider.url, Some("secret"), Some("42"))).await;

    let (status, body) = send(
        &test.app,
        post_json("/api/sellapp-webhook", paid_order(json!(3))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Provider returned non-JSON");
    assert_eq!(provider.call_count(), 1);
    assert_eq!(test.store.count().await.unwrap(), 0);
}
