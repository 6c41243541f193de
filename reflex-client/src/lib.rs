//! HTTP client for the stats service.
//!
//! The service identifies an anonymous participant by a `user_id` cookie that
//! it hands out on `GET /`. [`StatsClient`] keeps a cookie store, so calling
//! [`StatsClient::connect`] once is enough for later submissions to be
//! attributed to the same participant. A submission the service rejects for
//! lack of that cookie reconnects and is sent once more.

use std::time::Duration;

use async_trait::async_trait;
use reflex_core::{GlobalStats, StatsSnapshot, TrialResult};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const NO_USER: &str = "No user";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{0}': expected http:// or https://")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    fn is_missing_session(&self) -> bool {
        matches!(self, Self::Status { status: 400, message } if message == NO_USER)
    }
}

/// The two calls the front end makes against the stats service.
#[async_trait]
pub trait StatsService: Send + Sync {
    async fn global_stats(&self) -> Result<GlobalStats, ClientError>;
    async fn submit(&self, result: &TrialResult) -> Result<StatsSnapshot, ClientError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct StatsClient {
    http: Client,
    server_url: String,
}

impl StatsClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self, ClientError> {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(server_url));
        }
        let http = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, server_url })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Loads the landing route so the service registers this participant and
    /// sets the identity cookie.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .get(format!("{}/", self.server_url))
            .send()
            .await?;
        check_status(response).await?;
        info!(server_url = %self.server_url, "stats session established");
        Ok(())
    }

    async fn post_result(&self, result: &TrialResult) -> Result<StatsSnapshot, ClientError> {
        let response = self
            .http
            .post(format!("{}/submit", self.server_url))
            .json(result)
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl StatsService for StatsClient {
    async fn global_stats(&self) -> Result<GlobalStats, ClientError> {
        let response = self
            .http
            .get(format!("{}/global_stats", self.server_url))
            .send()
            .await?;
        let stats: GlobalStats = read_json(response).await?;
        debug!(mean = stats.mean, total_users = stats.total_users, "global stats received");
        Ok(stats)
    }

    async fn submit(&self, result: &TrialResult) -> Result<StatsSnapshot, ClientError> {
        let snapshot = match self.post_result(result).await {
            Err(e) if e.is_missing_session() => {
                warn!("stats session missing, reconnecting before resubmitting");
                self.connect().await?;
                self.post_result(result).await?
            }
            other => other?,
        };
        debug!(
            time = result.reaction_time_ms,
            count = snapshot.count,
            percentile = snapshot.percentile,
            "trial submitted"
        );
        Ok(snapshot)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
