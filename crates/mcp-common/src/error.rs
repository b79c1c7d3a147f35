/// Error types shared across MCP server crates.
///
/// These errors represent failures talking to upstream HTTP services that are common to
/// every server in the workspace. Application-specific errors should be defined in each
/// server crate and wrap `CommonError` via `#[from]`.
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream returned error: status={status} body={body}")]
    Upstream { status: StatusCode, body: String },
}

impl CommonError {
    /// HTTP status reported by the upstream, if the failure carried one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CommonError::Request(e) => e.status(),
            CommonError::Upstream { status, .. } => Some(*status),
            CommonError::InvalidJson(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CommonError::Request(e) if e.is_timeout())
    }
}
