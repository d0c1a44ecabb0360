//! Treasure Data REST client.
//!
//! Implements the JobClient trait against the v3 job and table endpoints.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::types::{EngineKind, JobId, JobInfo, KillAck, SubmittedJob, TableEntry};
use super::JobClient;
use crate::error::{Result, TdError};

const USER_AGENT: &str = concat!("td-glance/", env!("CARGO_PKG_VERSION"));

/// Treasure Data job API client.
///
/// Requests carry no timeout; a hung call hangs the caller.
#[derive(Clone)]
pub struct TdClient {
    endpoint: Url,
    api_key: String,
    client: Client,
}

impl std::fmt::Debug for TdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TdClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl TdClient {
    /// Creates a new client for the given API key and endpoint.
    pub fn new(api_key: impl Into<String>, endpoint: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TdError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            api_key: api_key.into(),
            client,
        })
    }

    /// Builds an endpoint URL, percent-encoding each path segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TdError::config(format!("Invalid endpoint '{}'", self.endpoint)))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Sends an authenticated request and returns the body of a 2xx response.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String> {
        let response = request
            .header(AUTHORIZATION, format!("TD1 {}", self.api_key))
            .send()
            .await
            .map_err(|e| TdError::transport(format!("{what} request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TdError::transport(format!("Failed to read {what} response: {e}")))?;

        debug!("{} -> {}", what, status);

        if status.is_success() {
            Ok(body)
        } else {
            Err(Self::parse_error(status, &body))
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let body = self.send(request, what).await?;
        serde_json::from_str(&body)
            .map_err(|e| TdError::parse(format!("Unexpected {what} response: {e}")))
    }

    /// Maps a non-2xx response to a transport error carrying the API message.
    fn parse_error(status: StatusCode, body: &str) -> TdError {
        if status == StatusCode::UNAUTHORIZED {
            return TdError::transport("Authentication failed. Check your api_key.");
        }

        if let Ok(error_response) = serde_json::from_str::<TdErrorResponse>(body) {
            if let Some(message) = error_response.message.or(error_response.error) {
                return TdError::transport(format!("Treasure Data API error ({status}): {message}"));
            }
        }

        TdError::transport(format!("Treasure Data API error ({status}): {}", body.trim()))
    }
}

#[async_trait]
impl JobClient for TdClient {
    async fn submit(
        &self,
        database: &str,
        query: &str,
        engine: EngineKind,
    ) -> Result<SubmittedJob> {
        let url = self.url(&["v3", "job", "issue", engine.as_str(), database])?;
        let request = self.client.post(url).form(&[("query", query)]);
        let response: SubmitResponse = self.send_json(request, "submit").await?;

        Ok(SubmittedJob {
            job_id: response.job_id,
            engine,
        })
    }

    async fn status(&self, job_id: &JobId) -> Result<JobInfo> {
        let url = self.url(&["v3", "job", "show", job_id.as_str()])?;
        self.send_json(self.client.get(url), "status").await
    }

    async fn fetch_result(&self, job_id: &JobId) -> Result<String> {
        let mut url = self.url(&["v3", "job", "result", job_id.as_str()])?;
        url.query_pairs_mut().append_pair("format", "json");
        self.send(self.client.get(url), "result").await
    }

    async fn kill(&self, job_id: &JobId) -> Result<KillAck> {
        let url = self.url(&["v3", "job", "kill", job_id.as_str()])?;
        self.send_json(self.client.post(url), "kill").await
    }

    async fn list_tables(&self, database: &str) -> Result<Vec<TableEntry>> {
        let url = self.url(&["v3", "table", "list", database])?;
        let response: TableListResponse = self.send_json(self.client.get(url), "table list").await?;
        Ok(response.tables)
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: JobId,
}

#[derive(Debug, Deserialize)]
struct TableListResponse {
    #[serde(default)]
    tables: Vec<TableEntry>,
}

#[derive(Debug, Deserialize)]
struct TdErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
