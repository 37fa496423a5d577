//! Lock endpoints over HTTP

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::{DateTime, Utc};
use serde_json::Value;

use common::{FakeIngressClient, IDENTITY_HEADER, TestContext};

fn lock_request(uri: &str, user: &str, namespace: &str, ingress: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((IDENTITY_HEADER, user))
        .set_form([("namespace", namespace), ("ingress", ingress)])
}

#[actix_web::test]
async fn test_lock_conflict_and_handover() {
    let ctx = TestContext::new(FakeIngressClient::default());
    let app = console_app!(ctx);

    let resp = test::call_service(&app, lock_request("/lock", "alice", "ns", "ing1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["owner"], "alice");

    // The response reports the entry that was recorded
    let recorded = ctx.state.lock_table.holder(&"ns/ing1".parse().unwrap()).unwrap();
    let acquired_at: DateTime<Utc> = body["data"]["acquiredAt"].as_str().unwrap().parse().unwrap();
    assert_eq!(acquired_at, recorded.acquired_at);

    let resp = test::call_service(&app, lock_request("/lock", "bob", "ns", "ing1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("alice"));

    // Re-acquire by the holder is allowed
    let resp = test::call_service(&app, lock_request("/lock", "alice", "ns", "ing1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, lock_request("/unlock", "alice", "ns", "ing1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["released"], true);

    let resp = test::call_service(&app, lock_request("/lock", "bob", "ns", "ing1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(ctx.state.lock_table.is_held_by(&"ns/ing1".parse().unwrap(), "bob"));
}

#[actix_web::test]
async fn test_unlock_by_non_owner_is_noop() {
    let ctx = TestContext::new(FakeIngressClient::default());
    let app = console_app!(ctx);

    test::call_service(&app, lock_request("/lock", "alice", "ns", "ing1").to_request()).await;

    let resp = test::call_service(&app, lock_request("/unlock", "bob", "ns", "ing1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["released"], false);

    assert!(ctx.state.lock_table.is_held_by(&"ns/ing1".parse().unwrap(), "alice"));
}

#[actix_web::test]
async fn test_lock_requires_identity() {
    let ctx = TestContext::new(FakeIngressClient::default());
    let app = console_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/lock")
        .set_form([("namespace", "ns"), ("ingress", "ing1")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(ctx.state.lock_table.is_empty());
}

#[actix_web::test]
async fn test_lock_rejects_blank_parameters() {
    let ctx = TestContext::new(FakeIngressClient::default());
    let app = console_app!(ctx);

    let resp = test::call_service(&app, lock_request("/lock", "alice", "", "ing1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("namespace"));
}

#[actix_web::test]
async fn test_list_locks() {
    let ctx = TestContext::new(FakeIngressClient::default());
    let app = console_app!(ctx);

    test::call_service(&app, lock_request("/lock", "alice", "ns", "a").to_request()).await;
    test::call_service(&app, lock_request("/lock", "bob", "ns", "b").to_request()).await;

    let req = test::TestRequest::get().uri("/locks").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let locks = body["data"].as_array().unwrap();
    assert_eq!(locks.len(), 2);
    assert_eq!(locks[0]["ingress"], "a");
    assert_eq!(locks[0]["owner"], "alice");
    assert_eq!(locks[1]["owner"], "bob");
    assert!(locks[1]["expiresAt"].is_string());
}
