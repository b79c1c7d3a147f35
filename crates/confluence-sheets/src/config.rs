use mcp_common::http::HttpClientConfig;

use crate::error::AppError;
use crate::model::ToolError;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_HEADER_ROW: u32 = 3;
const DEFAULT_RECORD_COUNT: usize = 10;
const USER_AGENT: &str = "mcp-servers/confluence-sheets";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Stdio,
}

/// Application configuration loaded once from the environment at startup.
///
/// Missing Confluence or Google values do not prevent startup: the affected tool
/// reports a configuration error on each call instead.
#[derive(Debug, Clone)]
pub struct Config {
    /// Confluence base URL, e.g. "https://example.atlassian.net/wiki"
    pub confluence_url: Option<String>,
    pub confluence_user: Option<String>,
    pub confluence_token: Option<String>,
    /// Root page ids whose direct children are searched, in priority order.
    pub page_ids: Vec<String>,
    /// Path to the Google service-account JSON key file.
    pub service_account_path: Option<String>,
    pub sheet_url: Option<String>,
    pub worksheet_name: Option<String>,
    pub sheets_api_url: String,
    /// 1-based row of the sheet's structural header; records start below it.
    pub header_row: u32,
    pub default_count: usize,
    pub listen_addr: String,
    pub transport: Transport,
    pub http: HttpClientConfig,
}

/// Confluence connection values, all present.
#[derive(Debug, Clone)]
pub struct ConfluenceSettings {
    pub base_url: String,
    pub user: String,
    pub token: String,
}

/// Spreadsheet location and credentials, all present.
#[derive(Debug, Clone)]
pub struct SheetSettings {
    pub service_account_path: String,
    pub sheet_url: String,
    pub worksheet_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from a key lookup.
    ///
    /// Tool settings (all optional at startup):
    /// - `CONFLUENCE_URL`, `CONFLUENCE_USER`, `CONFLUENCE_TOKEN`
    /// - `PAGES_IDS`: comma-separated root page ids
    /// - `GOOGLE_SERVICE_ACCOUNT_JSON`, `GOOGLE_SHEET_URL`, `GOOGLE_SHEET_NAME`
    ///
    /// Server settings:
    /// - `MCP_TRANSPORT`: "http" (default) or "stdio"
    /// - `MCP_HTTP_LISTEN_ADDR` (default: "0.0.0.0:8000")
    /// - `SHEET_HEADER_ROW` (default: 3), `SHEET_DEFAULT_COUNT` (default: 10)
    /// - `GOOGLE_SHEETS_API_URL` (default: "https://sheets.googleapis.com")
    /// - `HTTP_TIMEOUT_SECS`, `HTTP_MAX_ERROR_BODY_BYTES`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let transport = match value("MCP_TRANSPORT").as_deref().map(str::trim) {
            None => Transport::Http,
            Some(t) if t.eq_ignore_ascii_case("http") => Transport::Http,
            Some(t) if t.eq_ignore_ascii_case("stdio") => Transport::Stdio,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "MCP_TRANSPORT must be \"http\" or \"stdio\", got {other:?}"
                )))
            }
        };

        let page_ids = value("PAGES_IDS")
            .map(|ids| parse_page_ids(&ids))
            .unwrap_or_default();

        let header_row = value("SHEET_HEADER_ROW")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|&row| row > 0)
            .unwrap_or(DEFAULT_HEADER_ROW);

        let default_count = value("SHEET_DEFAULT_COUNT")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_RECORD_COUNT);

        Ok(Self {
            confluence_url: value("CONFLUENCE_URL"),
            confluence_user: value("CONFLUENCE_USER"),
            confluence_token: value("CONFLUENCE_TOKEN"),
            page_ids,
            service_account_path: value("GOOGLE_SERVICE_ACCOUNT_JSON"),
            sheet_url: value("GOOGLE_SHEET_URL"),
            worksheet_name: value("GOOGLE_SHEET_NAME"),
            sheets_api_url: value("GOOGLE_SHEETS_API_URL")
                .unwrap_or_else(|| DEFAULT_SHEETS_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            header_row,
            default_count,
            listen_addr: value("MCP_HTTP_LISTEN_ADDR")
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            transport,
            http: HttpClientConfig::from_lookup(USER_AGENT, &lookup),
        })
    }

    pub fn confluence(&self) -> Result<ConfluenceSettings, ToolError> {
        match (
            &self.confluence_url,
            &self.confluence_user,
            &self.confluence_token,
        ) {
            (Some(base_url), Some(user), Some(token)) => Ok(ConfluenceSettings {
                base_url: base_url.clone(),
                user: user.clone(),
                token: token.clone(),
            }),
            _ => Err(ToolError::config_missing(
                "Confluence environment variables are not set correctly \
                 (CONFLUENCE_URL, CONFLUENCE_USER, CONFLUENCE_TOKEN)",
            )),
        }
    }

    pub fn sheets(&self) -> Result<SheetSettings, ToolError> {
        let (Some(sheet_url), Some(worksheet_name)) = (&self.sheet_url, &self.worksheet_name)
        else {
            return Err(ToolError::config_missing(
                "GOOGLE_SHEET_URL and GOOGLE_SHEET_NAME environment variables are required",
            ));
        };
        let Some(service_account_path) = &self.service_account_path else {
            return Err(ToolError::config_missing(
                "GOOGLE_SERVICE_ACCOUNT_JSON environment variable is required",
            ));
        };
        Ok(SheetSettings {
            service_account_path: service_account_path.clone(),
            sheet_url: sheet_url.clone(),
            worksheet_name: worksheet_name.clone(),
        })
    }
}

fn parse_page_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
