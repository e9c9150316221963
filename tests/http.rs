//! HTTP adapter: list/show routes and error envelopes.

mod common;

use architect_presenter::{
    common_routes_with_ready, presenting_routes, DeclaredPresenter, PresenterCollection, PresentingState,
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use common::{blog_collection, blog_store, post_definition};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(collection: PresenterCollection) -> Router {
    let state = PresentingState::new(Arc::new(collection), Arc::new(blog_store()));
    common_routes_with_ready(state.clone()).merge(presenting_routes(state))
}

fn app() -> Router {
    app_with(blog_collection())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn list_returns_count_and_collections() {
    let (status, body) = get(app(), "/posts?per_page=2&page=2&include=comments:body&order=title:desc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(5));
    let ids: Vec<i64> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 2]);
    assert_eq!(body["comments"], json!([{"id": 3, "body": "third", "post_id": 2}]));
}

#[tokio::test]
async fn list_accepts_filters_and_fields() {
    let (status, body) = get(app(), "/posts?filters=published:false&fields=title_length").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["posts"][0]["title_length"], json!(4));
}

#[tokio::test]
async fn show_presents_one_record() {
    let (status, body) = get(app(), "/posts/4?include=users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["posts"][0]["title"], json!("delta"));
    assert_eq!(body["users"], json!([{"id": 1, "name": "ann"}]));
}

#[tokio::test]
async fn show_missing_record_is_not_found() {
    let (status, body) = get(app(), "/posts/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("not_found"));
}

#[tokio::test]
async fn show_rejects_non_numeric_ids() {
    let (status, body) = get(app(), "/posts/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("bad_request"));
}

#[tokio::test]
async fn unknown_names_are_not_found() {
    let (status, body) = get(app(), "/widgets").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("not_found"));
}

#[tokio::test]
async fn misconfigured_includes_are_server_errors() {
    let mut collection = PresenterCollection::new();
    collection
        .presents(DeclaredPresenter::new(post_definition()), &["Post"])
        .unwrap();
    collection.finalize_registration();

    let (status, body) = get(app_with(collection), "/posts?include=comments").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], json!("config_error"));
    assert!(body["error"]["message"].as_str().unwrap().contains("Comment"));
}

#[tokio::test]
async fn health_and_readiness() {
    let (status, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = get(app(), "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["finalized"], json!(true));
    assert_eq!(body["presenters"], json!(3));

    let (status, _) = get(app_with(PresenterCollection::new()), "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
