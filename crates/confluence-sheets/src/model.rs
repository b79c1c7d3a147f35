use serde::Deserialize;

/// A child page considered during a title search, with its match score.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCandidate {
    /// Content-service page id
    pub id: String,
    /// Display title as returned by the listing
    pub title: String,
    /// Similarity score in [0, 100]; exact numeric prefix hits are always 100
    pub score: f64,
}

/// The resolved page: its title and rendered body.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDetail {
    pub title: String,
    /// Rendered `export_view` markup, `None` when the detail payload lacks it
    pub body_content: Option<String>,
}

/// An entry from a parent page's direct-children listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChildPage {
    pub id: String,
    pub title: String,
}

/// How a query is matched against titles. The two modes never mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Entire query is ASCII digits; matched against the leading digit run of titles.
    Numeric(String),
    /// Anything else; matched by composite fuzzy score.
    FreeText(String),
}

impl SearchQuery {
    pub fn parse(query: &str) -> Self {
        if !query.is_empty() && query.chars().all(|c| c.is_ascii_digit()) {
            SearchQuery::Numeric(query.to_string())
        } else {
            SearchQuery::FreeText(query.to_string())
        }
    }
}

/// Caller-supplied sheet coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadsheetRange {
    /// 1-based row holding the header
    pub row: u32,
    /// 0-based offset into the header row
    pub column: usize,
    /// Maximum number of records returned
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigurationMissing,
    InputInvalid,
    RemoteFetchFailed,
    RemoteAuthFailed,
}

/// A failure reported back to the tool caller as an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigurationMissing, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputInvalid, message)
    }

    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RemoteFetchFailed, message)
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RemoteAuthFailed, message)
    }
}

/// Result of a tool operation: a payload, an explicit "no match", or a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Found(T),
    NotFound,
    Failure(ToolError),
}

impl<T> Outcome<T> {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Found(_) => "found",
            Outcome::NotFound => "not_found",
            Outcome::Failure(_) => "failure",
        }
    }
}

impl<T> From<ToolError> for Outcome<T> {
    fn from(err: ToolError) -> Self {
        Outcome::Failure(err)
    }
}

impl<T> From<Result<T, ToolError>> for Outcome<T> {
    fn from(result: Result<T, ToolError>) -> Self {
        match result {
            Ok(value) => Outcome::Found(value),
            Err(err) => Outcome::Failure(err),
        }
    }
}
