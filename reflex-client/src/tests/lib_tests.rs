use super::*;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    submitted: Arc<Mutex<Vec<serde_json::Value>>>,
    withhold_cookie: bool,
}

fn has_user_cookie(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("user_id=test-user"))
}

async fn index(State(state): State<ServerState>) -> axum::response::Response {
    if state.withhold_cookie {
        return "ok".into_response();
    }
    ([(header::SET_COOKIE, "user_id=test-user; Path=/")], "ok").into_response()
}

async fn global_stats() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "mean": 280.0, "stdev": 35.0, "count": 3, "total_users": 3 }))
}

async fn submit(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    if !has_user_cookie(&headers) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "No user" })),
        );
    }
    state.submitted.lock().await.push(body);
    // no stdev fields
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "mean": 350.0,
            "count": 1,
            "percentile": 82.5,
            "global_mean": 300.0,
            "total_users": 4
        })),
    )
}

fn serve(listener: TcpListener, state: ServerState) {
    let app = Router::new()
        .route("/", get(index))
        .route("/global_stats", get(global_stats))
        .route("/submit", post(submit))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
}

async fn spawn_server_with(state: ServerState) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    serve(listener, state);
    Ok(format!("http://{addr}"))
}

async fn spawn_server() -> anyhow::Result<(String, ServerState)> {
    let state = ServerState::default();
    let url = spawn_server_with(state.clone()).await?;
    Ok((url, state))
}

#[test]
fn rejects_urls_without_http_scheme() {
    let err = StatsClient::new("localhost:5000").err().expect("invalid url");
    assert!(matches!(err, ClientError::InvalidUrl(_)));
}

#[test]
fn trims_trailing_slash() {
    let client = StatsClient::new("http://127.0.0.1:5000/").expect("client");
    assert_eq!(client.server_url(), "http://127.0.0.1:5000");
}

#[tokio::test]
async fn fetches_global_stats() {
    let (url, _state) = spawn_server().await.expect("server");
    let client = StatsClient::new(url).expect("client");
    let stats = client.global_stats().await.expect("global stats");
    assert_eq!(stats.mean, 280.0);
    assert_eq!(stats.stdev, Some(35.0));
    assert_eq!(stats.total_users, 3);
}

#[tokio::test]
async fn submit_without_session_connects_and_resubmits() {
    let (url, state) = spawn_server().await.expect("server");
    let client = StatsClient::new(url).expect("client");
    let snapshot = client.submit(&TrialResult::new(350)).await.expect("submit");
    assert_eq!(snapshot.count, 1);
    assert_eq!(state.submitted.lock().await.len(), 1);
}

#[tokio::test]
async fn refused_session_reports_no_user() {
    let state = ServerState {
        withhold_cookie: true,
        ..ServerState::default()
    };
    let url = spawn_server_with(state.clone()).await.expect("server");
    let client = StatsClient::new(url).expect("client");
    let err = client
        .submit(&TrialResult::new(350))
        .await
        .expect_err("no cookie issued");
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "No user");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(state.submitted.lock().await.is_empty());
}

#[tokio::test]
async fn submit_recovers_when_server_was_down_at_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = StatsClient::new(format!("http://{addr}")).expect("client");
    let err = client.connect().await.expect_err("nothing listening");
    assert!(matches!(err, ClientError::Http(_)));

    let state = ServerState::default();
    serve(TcpListener::bind(addr).await.expect("rebind"), state.clone());

    let snapshot = client.submit(&TrialResult::new(410)).await.expect("submit");
    assert_eq!(snapshot.total_users, 4);
    let submitted = state.submitted.lock().await;
    assert_eq!(submitted.as_slice(), &[serde_json::json!({ "time": 410 })]);
}

#[tokio::test]
async fn connect_then_submit_posts_time_and_defaults_missing_fields() {
    let (url, state) = spawn_server().await.expect("server");
    let client = StatsClient::new(url).expect("client");
    client.connect().await.expect("connect");

    let snapshot = client.submit(&TrialResult::new(350)).await.expect("submit");
    assert_eq!(snapshot.mean, 350.0);
    assert_eq!(snapshot.count, 1);
    assert_eq!(snapshot.stdev, None);
    assert_eq!(snapshot.curve_stdev(), 1.0);
    assert_eq!(snapshot.global_stdev, None);
    assert_eq!(snapshot.total_users, 4);

    let submitted = state.submitted.lock().await;
    assert_eq!(submitted.as_slice(), &[serde_json::json!({ "time": 350 })]);
}

#[tokio::test]
async fn unreachable_server_is_an_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = StatsClient::new(format!("http://{addr}")).expect("client");
    let err = client.global_stats().await.expect_err("nothing listening");
    assert!(matches!(err, ClientError::Http(_)));
}
