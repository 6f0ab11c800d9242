use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use common::filters::FilterParams;
use common::monitor_api::{FetchError, MonitorApi, MonitorClient};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Upstream {
    suspicious_query: Mutex<Option<String>>,
}

async fn smart_money() -> impl IntoResponse {
    Json(json!({"data": [
        {"user_id": "0xaaa", "roi": 0.42, "win_rate": 0.8, "profit": 12500.5, "trade_count": 9}
    ]}))
}

async fn whales() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "database locked")
}

async fn top_profit() -> impl IntoResponse {
    "this is not json"
}

async fn hot_markets() -> impl IntoResponse {
    Json(json!({}))
}

async fn suspicious(
    State(upstream): State<Arc<Upstream>>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    *upstream.suspicious_query.lock().unwrap() = query;
    Json(json!({"data": [
        {"user_id": "0x1234567890abcdef", "reason": "new_account_large_bet", "market_id": "0xmarket", "stake": 25000.0}
    ]}))
}

/// Serve a fake analytics API on an ephemeral port and return its base URL.
async fn spawn_upstream() -> (String, Arc<Upstream>) {
    let upstream = Arc::new(Upstream::default());
    let app = Router::new()
        .route("/monitor/smart-money", get(smart_money))
        .route("/monitor/whales", get(whales))
        .route("/rankings/top-profit", get(top_profit))
        .route("/markets/hot", get(hot_markets))
        .route("/monitor/suspicious-wallets", get(suspicious))
        .with_state(Arc::clone(&upstream));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), upstream)
}

#[tokio::test]
async fn fetches_and_decodes_records() {
    let (base, _upstream) = spawn_upstream().await;
    let client = MonitorClient::new(&base, None).unwrap();

    let rows = client.smart_money().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "0xaaa");
    assert_eq!(rows[0].trade_count, 9);
}

#[tokio::test]
async fn non_success_status_is_a_status_error() {
    let (base, _upstream) = spawn_upstream().await;
    let client = MonitorClient::new(&base, None).unwrap();

    let err = client.whales().await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Status {
            path: "/monitor/whales",
            status: 500
        }
    );
    assert_eq!(err.to_string(), "Request failed: 500");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let (base, _upstream) = spawn_upstream().await;
    let client = MonitorClient::new(&base, None).unwrap();

    let err = client.top_profit().await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { path: "/rankings/top-profit", .. }));
}

#[tokio::test]
async fn missing_data_field_is_an_empty_result() {
    let (base, _upstream) = spawn_upstream().await;
    let client = MonitorClient::new(&base, None).unwrap();

    let rows = client.hot_markets().await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn suspicious_wallets_sends_filter_query() {
    let (base, upstream) = spawn_upstream().await;
    let client = MonitorClient::new(&base, None).unwrap();
    let filters = FilterParams {
        min_stake: 5000.0,
        reinvest_max_days: 14.0,
        ..FilterParams::default()
    };

    let rows = client.suspicious_wallets(&filters).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reason, "new_account_large_bet");
    assert!(rows[0].first_trade_at.is_none());

    let query = upstream.suspicious_query.lock().unwrap().clone();
    assert_eq!(
        query.as_deref(),
        Some("account_age_days=30&large_stake=5000&profit_threshold=10000&reinvest_min_days=1&reinvest_max_days=14")
    );
}

#[tokio::test]
async fn unreachable_upstream_is_a_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = MonitorClient::new(&format!("http://{addr}"), None).unwrap();
    let err = client.smart_money().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { path: "/monitor/smart-money", .. }));
}
