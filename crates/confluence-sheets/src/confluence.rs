/// Client for the Confluence REST v2 page API.
///
/// Only the two calls the resolver needs are implemented: listing a page's direct
/// children and fetching a page rendered in `export_view` format. Each call is a single
/// attempt with basic auth and the shared per-request timeout.
use std::future::Future;

use serde::Deserialize;
use tracing::debug;

use crate::config::ConfluenceSettings;
use crate::model::ChildPage;
use mcp_common::error::CommonError;
use mcp_common::http::parse_json_response;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] CommonError),

    #[error("invalid page id: {0:?}")]
    InvalidId(String),

    #[error("invalid Confluence base URL: {0}")]
    InvalidBaseUrl(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Http(e) if e.is_not_found())
    }
}

/// Raw page detail payload. Only the nested rendered body is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageDetailPayload {
    #[serde(default)]
    pub body: Option<PageBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageBody {
    #[serde(default)]
    pub export_view: Option<BodyRepresentation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BodyRepresentation {
    #[serde(default)]
    pub value: Option<String>,
}

impl PageDetailPayload {
    pub fn export_view(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.export_view.as_ref())
            .and_then(|v| v.value.as_deref())
    }

    #[cfg(test)]
    pub fn from_export_view(value: &str) -> Self {
        Self {
            body: Some(PageBody {
                export_view: Some(BodyRepresentation {
                    value: Some(value.to_string()),
                }),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChildrenResponse {
    #[serde(default)]
    results: Vec<ChildPage>,
}

/// Source of page hierarchy data for the resolver.
pub trait ContentSource {
    /// Direct children of `parent_id`, at most `limit` of them, in listing order.
    fn list_direct_children(
        &self,
        parent_id: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ChildPage>, FetchError>> + Send;

    /// Page detail with its rendered body. `Ok(None)` when the page does not exist.
    fn get_page_detail(
        &self,
        page_id: &str,
    ) -> impl Future<Output = Result<Option<PageDetailPayload>, FetchError>> + Send;
}

#[derive(Clone)]
pub struct ConfluenceClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    token: String,
    max_error_body_bytes: usize,
}

impl ConfluenceClient {
    pub fn new(http: reqwest::Client, settings: ConfluenceSettings, max_error_body_bytes: usize) -> Self {
        Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            user: settings.user,
            token: settings.token,
            max_error_body_bytes,
        }
    }

    /// `{base}/api/v2/pages/{id}[/{suffix}]` with the id percent-encoded as one segment.
    fn page_url(&self, page_id: &str, suffix: Option<&str>) -> Result<reqwest::Url, FetchError> {
        let id = page_id.trim();
        if matches!(id, "" | "." | "..") {
            return Err(FetchError::InvalidId(page_id.to_string()));
        }
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["api", "v2", "pages", id])
            .extend(suffix);
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: reqwest::Url,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .basic_auth(&self.user, Some(&self.token))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(CommonError::from)?;
        Ok(parse_json_response(resp, self.max_error_body_bytes).await?)
    }
}

impl ContentSource for ConfluenceClient {
    async fn list_direct_children(
        &self,
        parent_id: &str,
        limit: u32,
    ) -> Result<Vec<ChildPage>, FetchError> {
        let url = self.page_url(parent_id, Some("direct-children"))?;
        let response: ChildrenResponse = self
            .get_json(url, &[("limit", limit.to_string())])
            .await?;
        debug!(parent_id, children = response.results.len(), "listed direct children");
        Ok(response.results)
    }

    async fn get_page_detail(&self, page_id: &str) -> Result<Option<PageDetailPayload>, FetchError> {
        let url = self.page_url(page_id, None)?;
        match self
            .get_json::<PageDetailPayload>(url, &[("body-format", "export_view".to_string())])
            .await
        {
            Ok(detail) => Ok(Some(detail)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
