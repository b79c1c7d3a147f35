/// MCP server exposing Confluence page lookup and spreadsheet reads.
///
/// Exposes two tools:
/// - `get_page_info`: Resolve a title fragment or page number to one page under the configured roots
/// - `get_spreadsheet_data`: Read a header row and the records below it from the configured worksheet
///
/// Every call yields one JSON value: the result object, `null` when nothing matched, or an
/// `{"error": ...}` envelope.
use std::sync::Arc;

use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::confluence::ConfluenceClient;
use crate::error::AppError;
use crate::model::{Outcome, PageDetail, SpreadsheetRange};
use crate::normalize::normalize_query;
use crate::resolver::{self, ResolverOptions};
use crate::sheets;
use mcp_common::mcp_api::{
    ErrorResponse, GetPageInfoParams, GetSpreadsheetDataParams, PageInfoResponse,
};

#[derive(Clone)]
pub struct ConfluenceSheetsServer {
    config: Arc<Config>,
    http: reqwest::Client,
    /// `None` when the Confluence settings are incomplete.
    confluence: Option<ConfluenceClient>,
    tool_router: ToolRouter<ConfluenceSheetsServer>,
}

impl ConfluenceSheetsServer {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let http = config.http.build_client()?;
        let confluence = config.confluence().ok().map(|settings| {
            ConfluenceClient::new(http.clone(), settings, config.http.max_error_body_bytes)
        });

        Ok(Self {
            config: Arc::new(config),
            http,
            confluence,
            tool_router: Self::tool_router(),
        })
    }
}

#[tool_router]
impl ConfluenceSheetsServer {
    #[tool(description = "Find a Confluence page under the configured root pages by title fragment or page number and return its title and rendered body. Returns null when no page matches.")]
    async fn get_page_info(
        &self,
        Parameters(params): Parameters<GetPageInfoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let query = params.query.as_deref().map(normalize_query);
        let outcome = resolver::find_best_page(
            self.confluence.as_ref(),
            &self.config.page_ids,
            query.as_deref(),
            ResolverOptions::default(),
        )
        .await;
        info!(query = ?query, outcome = outcome.label(), "get_page_info");

        into_call_result(match outcome {
            Outcome::Found(page) => Outcome::Found(to_api_page(page)),
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Failure(e) => Outcome::Failure(e),
        })
    }

    #[tool(description = "Read the header at a 1-based row (starting from a 0-based column offset) of the configured worksheet, plus up to `count` records below the sheet's header area. Returns the header, the records and the total record count.")]
    async fn get_spreadsheet_data(
        &self,
        Parameters(params): Parameters<GetSpreadsheetDataParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let range = SpreadsheetRange {
            row: params.row,
            column: params.column,
            count: params.count.unwrap_or(self.config.default_count),
        };
        let outcome = sheets::read_range(&self.http, &self.config, range).await;
        info!(
            row = range.row,
            column = range.column,
            count = range.count,
            outcome = outcome.label(),
            "get_spreadsheet_data"
        );
        into_call_result(outcome)
    }
}

fn to_api_page(page: PageDetail) -> PageInfoResponse {
    PageInfoResponse {
        title: page.title,
        body_content: page.body_content,
    }
}

fn into_call_result<T: Serialize>(outcome: Outcome<T>) -> Result<CallToolResult, ErrorData> {
    match outcome {
        Outcome::Found(value) => serde_json::to_value(value)
            .map(CallToolResult::structured)
            .map_err(|e| ErrorData::internal_error(format!("cannot serialize result: {e}"), None)),
        Outcome::NotFound => Ok(CallToolResult::success(vec![Content::text("null")])),
        Outcome::Failure(e) => {
            let envelope = serde_json::to_value(ErrorResponse { error: e.message })
                .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
            Ok(CallToolResult::structured_error(envelope))
        }
    }
}

#[tool_handler]
impl ServerHandler for ConfluenceSheetsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "confluence-sheets".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Confluence and Google Sheets lookup server. Use get_page_info with a page \
                 title fragment or a page number (e.g. \"123\") to fetch one page from the \
                 configured Confluence roots; Hangul queries are romanized before matching. \
                 Use get_spreadsheet_data with a header row and column offset to read records \
                 from the configured worksheet."
                    .to_string(),
            ),
        }
    }
}
