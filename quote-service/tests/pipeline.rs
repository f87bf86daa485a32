use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use quote_service::api::QuoteFetcher;
use quote_service::db::QuoteStore;
use quote_service::{router, AppState};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing::info;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UPSTREAM_PATH: &str = "/json/last/USD-BRL";

const QUOTE_BODY: &str = r#"{"USDBRL":{"code":"USD","codein":"BRL","name":"Dólar Americano/Real Brasileiro","high":"5.2731","low":"5.2188","varBid":"0.0214","pctChange":"0.41","bid":"5.25","ask":"5.2512","timestamp":"1700000000","create_date":"2023-11-14 19:13:20"}}"#;

struct Harness {
    _dir: TempDir,
    db_path: std::path::PathBuf,
    store: QuoteStore,
    app: Router,
}

impl Harness {
    async fn new(
        upstream: &MockServer,
        fetch_budget: Duration,
        store_budget: Duration,
        request_timeout: Option<Duration>,
    ) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("cotacao.db");
        let store = QuoteStore::open(&db_path, 2, store_budget)
            .await
            .expect("Failed to open store");

        let url = format!("{}{}", upstream.uri(), UPSTREAM_PATH);
        let fetcher = QuoteFetcher::with_client(reqwest::Client::new(), &url, "USDBRL", fetch_budget);
        let state = Arc::new(AppState {
            fetcher,
            store: store.clone(),
            request_timeout,
        });

        Self {
            _dir: dir,
            db_path,
            store,
            app: router(state),
        }
    }

    async fn get(&self, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = self
            .app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }
}

async fn upstream_with(template: ResponseTemplate) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(UPSTREAM_PATH))
        .respond_with(template)
        .mount(&mock_server)
        .await;
    mock_server
}

fn ok_quote() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(QUOTE_BODY)
}

#[test_log::test(tokio::test)]
async fn slow_upstream_returns_gateway_timeout_and_persists_nothing() {
    let upstream = upstream_with(ok_quote().set_delay(Duration::from_millis(600))).await;
    let harness = Harness::new(
        &upstream,
        Duration::from_millis(200),
        Duration::from_secs(1),
        None,
    )
    .await;

    let (status, _, body) = harness.get("/cotacao").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body.is_empty());
    assert_eq!(harness.store.count().await.unwrap(), 0);
}

#[test_log::test(tokio::test)]
async fn slow_store_returns_gateway_timeout_and_persists_nothing() {
    let upstream = upstream_with(ok_quote()).await;
    let harness = Harness::new(
        &upstream,
        Duration::from_secs(2),
        Duration::from_millis(10),
        None,
    )
    .await;

    // Hold the write lock from another connection so the insert cannot commit.
    let mut locker = SqliteConnection::connect_with(&SqliteConnectOptions::new().filename(&harness.db_path))
        .await
        .unwrap();
    sqlx::query("BEGIN EXCLUSIVE")
        .execute(&mut locker)
        .await
        .unwrap();

    let (status, _, body) = harness.get("/cotacao").await;

    sqlx::query("ROLLBACK").execute(&mut locker).await.unwrap();
    locker.close().await.unwrap();

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body.is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.store.count().await.unwrap(), 0);
}

#[test_log::test(tokio::test)]
async fn successful_request_returns_bid_and_persists_one_row() {
    let upstream = upstream_with(ok_quote()).await;
    let harness = Harness::new(
        &upstream,
        Duration::from_secs(2),
        Duration::from_secs(1),
        None,
    )
    .await;

    let (status, content_type, body) = harness.get("/cotacao").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "cotacao": "5.25" }));

    let records = harness.store.records().await.unwrap();
    info!(?records, "Persisted records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].dollar_exchange_rate, 5.25);
}

#[test_log::test(tokio::test)]
async fn sequential_requests_append_rows_in_identity_order() {
    let upstream = upstream_with(ok_quote()).await;
    let harness = Harness::new(
        &upstream,
        Duration::from_secs(2),
        Duration::from_secs(1),
        None,
    )
    .await;

    for _ in 0..5 {
        let (status, _, _) = harness.get("/cotacao").await;
        assert_eq!(status, StatusCode::OK);
    }

    let records = harness.store.records().await.unwrap();
    assert_eq!(records.len(), 5);
    assert!(records.windows(2).all(|pair| pair[0].id < pair[1].id));
}

#[test_log::test(tokio::test)]
async fn malformed_upstream_body_returns_internal_error() {
    let body = r#"{"USDBRL":{"code":"USD","codein":"BRL","name":"Dólar Americano/Real Brasileiro"}}"#;
    let upstream = upstream_with(ResponseTemplate::new(200).set_body_string(body)).await;
    let harness = Harness::new(
        &upstream,
        Duration::from_secs(2),
        Duration::from_secs(1),
        None,
    )
    .await;

    let (status, _, body) = harness.get("/cotacao").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
    assert_eq!(harness.store.count().await.unwrap(), 0);
}

#[test_log::test(tokio::test)]
async fn non_numeric_bid_returns_internal_error() {
    let body = QUOTE_BODY.replace(r#""bid":"5.25""#, r#""bid":"indisponível""#);
    let upstream = upstream_with(ResponseTemplate::new(200).set_body_string(body)).await;
    let harness = Harness::new(
        &upstream,
        Duration::from_secs(2),
        Duration::from_secs(1),
        None,
    )
    .await;

    let (status, _, _) = harness.get("/cotacao").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(harness.store.count().await.unwrap(), 0);
}

#[test_log::test(tokio::test)]
async fn upstream_error_status_returns_internal_error() {
    let upstream = upstream_with(ResponseTemplate::new(503)).await;
    let harness = Harness::new(
        &upstream,
        Duration::from_secs(2),
        Duration::from_secs(1),
        None,
    )
    .await;

    let (status, _, body) = harness.get("/cotacao").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[test_log::test(tokio::test)]
async fn unavailable_storage_returns_internal_error() {
    let upstream = upstream_with(ok_quote()).await;
    let harness = Harness::new(
        &upstream,
        Duration::from_secs(2),
        Duration::from_secs(1),
        None,
    )
    .await;
    harness.store.close().await;

    let (status, _, body) = harness.get("/cotacao").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[test_log::test(tokio::test)]
async fn request_deadline_caps_fetch_budget() {
    let upstream = upstream_with(ok_quote().set_delay(Duration::from_millis(400))).await;
    let harness = Harness::new(
        &upstream,
        Duration::from_secs(2),
        Duration::from_secs(1),
        Some(Duration::from_millis(100)),
    )
    .await;

    let (status, _, _) = harness.get("/cotacao").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(harness.store.count().await.unwrap(), 0);
}

#[test_log::test(tokio::test)]
async fn health_check_responds() {
    let upstream = MockServer::start().await;
    let harness = Harness::new(
        &upstream,
        Duration::from_millis(200),
        Duration::from_millis(10),
        None,
    )
    .await;

    let (status, content_type, _) = harness.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
}
