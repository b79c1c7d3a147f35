/// HTTP plumbing shared by the upstream clients.
///
/// Every request is a single attempt bounded by the configured timeout. Non-2xx
/// responses become `CommonError::Upstream` with a size-capped copy of the body so
/// error messages stay readable.
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::CommonError;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_ERROR_BODY_BYTES: usize = 8 * 1024;

#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub max_error_body_bytes: usize,
    pub user_agent: String,
}

impl HttpClientConfig {
    /// Optional:
    /// - `HTTP_TIMEOUT_SECS` (default: 10)
    /// - `HTTP_MAX_ERROR_BODY_BYTES` (default: 8192)
    pub fn from_lookup<F>(user_agent: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let max_error_body_bytes = lookup("HTTP_MAX_ERROR_BODY_BYTES")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_ERROR_BODY_BYTES);

        Self {
            timeout,
            max_error_body_bytes,
            user_agent: user_agent.to_string(),
        }
    }

    pub fn build_client(&self) -> Result<reqwest::Client, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .build()?;
        Ok(http)
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_lookup("mcp-servers", |_| None)
    }
}

/// Decode a successful response body as JSON, or turn the failure into an upstream error.
pub async fn parse_json_response<T: DeserializeOwned>(
    resp: reqwest::Response,
    max_error_body_bytes: usize,
) -> Result<T, CommonError> {
    if resp.status().is_success() {
        let bytes = resp.bytes().await?;
        let json = serde_json::from_slice::<T>(&bytes)?;
        return Ok(json);
    }
    Err(to_upstream_error(resp, max_error_body_bytes).await)
}

async fn to_upstream_error(resp: reqwest::Response, max_error_body_bytes: usize) -> CommonError {
    let status = resp.status();
    let body = read_limited_text(resp, max_error_body_bytes).await;
    CommonError::Upstream { status, body }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}
