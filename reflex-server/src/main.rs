use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reflex_core::{GlobalStats, StatsSnapshot};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod stats;
mod storage;

use config::{load_settings, prepare_database_url};
use storage::{Storage, StorageError};

const USER_COOKIE: &str = "user_id";

#[derive(Clone)]
struct AppState {
    storage: Storage,
}

/// JSON error body `{"error": ...}` with a status code
#[derive(Debug)]
struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl From<StorageError> for ApiFailure {
    fn from(e: StorageError) -> Self {
        error!(error = %e, "storage failure");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let app = build_router(Arc::new(AppState { storage }));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "stats service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/global_stats", get(global_stats))
        .route("/submit", post(submit))
        .with_state(state)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

/// Reaction time in whole milliseconds from a submission body. Anything that
/// is not a finite, non-negative number is rejected.
fn parse_time(body: &[u8]) -> Option<i64> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let time = value.get("time")?.as_f64()?;
    (time.is_finite() && time >= 0.0).then(|| time.round() as i64)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, ApiFailure> {
    state.storage.health_check().await?;
    Ok("ok")
}

/// Landing route: hands out the anonymous identity cookie.
async fn index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiFailure> {
    let user_id = match cookie_value(&headers, USER_COOKIE) {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            state.storage.add_user(&id).await?;
            info!(user_id = %id, "new participant");
            id
        }
    };

    let cookie = HeaderValue::from_str(&format!("{USER_COOKIE}={user_id}; Path=/"))
        .map_err(|_| ApiFailure::bad_request("Invalid cookie"))?;
    Ok(([(header::SET_COOKIE, cookie)], "Reflex stats service").into_response())
}

async fn global_stats(State(state): State<Arc<AppState>>) -> Result<Json<GlobalStats>, ApiFailure> {
    Ok(Json(state.storage.global_stats().await?))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatsSnapshot>, ApiFailure> {
    let Some(user_id) = cookie_value(&headers, USER_COOKIE) else {
        warn!("submission without identity cookie");
        return Err(ApiFailure::bad_request("No user"));
    };
    let Some(time) = parse_time(&body) else {
        warn!(%user_id, "submission with invalid time");
        return Err(ApiFailure::bad_request("Invalid data"));
    };

    // a cookie from an earlier database is adopted as a new participant
    state.storage.add_user(&user_id).await?;
    state.storage.add_result(&user_id, time).await?;

    let user = state.storage.user_stats(&user_id).await?;
    let global = state.storage.global_stats().await?;
    let global_stdev = global.stdev.unwrap_or(0.0);
    let percentile = stats::percentile(user.mean, global.mean, global_stdev);
    info!(%user_id, time, mean = user.mean, count = user.count, percentile, "result recorded");

    Ok(Json(StatsSnapshot {
        mean: user.mean,
        stdev: Some(user.stdev),
        count: user.count,
        percentile,
        global_mean: global.mean,
        global_stdev: Some(global_stdev),
        total_users: global.total_users,
    }))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
