//! HTTP client for the portal's import routes
//!
//! Throttled responses (429, or a body that reads like a rate-limit page) are
//! retried with backoff; anything else fails on the first attempt.

use std::time::Duration;

use clinic_common::retry::{is_rate_limit_message, retry_with_backoff, RetryPolicy};
use clinic_common::summary::DebriefRow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header carrying the portal service key
pub const API_KEY_HEADER: &str = "x-api-key";

const USER_AGENT: &str = concat!("clinic-import/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Import client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ClientError {
    /// Whether waiting and trying again could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::RateLimited(_) => true,
            ClientError::Api(_, body) | ClientError::Parse(body) => is_rate_limit_message(body),
            ClientError::Network(_) => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    rows: &'a [DebriefRow],
    #[serde(skip_serializing_if = "Option::is_none")]
    semester: Option<&'a str>,
}

/// Counts reported by the portal after an import
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResults {
    pub total_records: usize,
    pub inserted: usize,
    pub duplicates: usize,
    #[serde(default)]
    pub errors: Vec<String>,
    pub final_count: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportReport {
    pub success: bool,
    pub results: ImportResults,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditCounts {
    pub unique_clinics: Vec<String>,
    pub unique_clients: Vec<String>,
    pub unique_weeks: Vec<String>,
    pub clinic_count: usize,
    pub client_count: usize,
    pub week_count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub total_records: usize,
    pub audit: AuditCounts,
}

/// Client for one portal instance
pub struct ImportClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    policy: RetryPolicy,
}

impl ImportClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            policy: RetryPolicy::http_rate_limit(),
        })
    }

    /// Replace the default retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send debrief rows to be aggregated and stored
    pub async fn submit(&self, rows: &[DebriefRow], semester: Option<&str>) -> Result<ImportReport, ClientError> {
        let body = ImportRequest { rows, semester };
        let url = self.url("/api/import-debriefs");

        retry_with_backoff("import-debriefs", self.policy, ClientError::is_retryable, || async {
            let mut request = self.http_client.post(&url).json(&body);
            if let Some(key) = &self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }
            parse_response(request.send().await).await
        })
        .await
    }

    /// Fetch the stored summaries' audit counts
    pub async fn audit(&self) -> Result<AuditReport, ClientError> {
        let url = self.url("/api/import-debriefs");

        retry_with_backoff("audit-summaries", self.policy, ClientError::is_retryable, || async {
            let mut request = self.http_client.get(&url);
            if let Some(key) = &self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }
            parse_response(request.send().await).await
        })
        .await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    sent: reqwest::Result<reqwest::Response>,
) -> Result<T, ClientError> {
    let response = sent.map_err(|e| ClientError::Network(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ClientError::RateLimited(text));
    }
    if !status.is_success() {
        return Err(ClientError::Api(status.as_u16(), text));
    }

    serde_json::from_str(&text).map_err(|e| ClientError::Parse(format!("{}: {}", e, text)))
}
