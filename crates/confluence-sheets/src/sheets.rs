/// Tabular reads from a Google Sheets worksheet.
///
/// The whole worksheet is fetched once per call through the Sheets v4 values API. The
/// caller's header row (sliced from the requested column) names the fields; records are
/// the rows below the configured structural header row.
use std::collections::HashSet;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use tracing::{info, warn};

use crate::config::{Config, SheetSettings};
use crate::google_auth::{self, AuthError, ServiceAccountKey, SHEETS_READONLY_SCOPE};
use crate::model::{Outcome, SpreadsheetRange, ToolError};
use mcp_common::error::CommonError;
use mcp_common::http::parse_json_response;
use mcp_common::mcp_api::SpreadsheetDataResponse;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("invalid spreadsheet URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Http(#[from] CommonError),

    #[error("duplicate header name {0:?}")]
    DuplicateHeader(String),
}

impl SheetError {
    fn into_tool_error(self) -> ToolError {
        let message = format!("Spreadsheet access failed: {self}");
        match self {
            SheetError::InvalidUrl(_) => ToolError::config_missing(message),
            SheetError::Auth(_) => ToolError::auth_failed(message),
            SheetError::Http(_) | SheetError::DuplicateHeader(_) => ToolError::fetch_failed(message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Read the header at `range.row` and up to `range.count` records below the header depth.
pub async fn read_range(
    http: &reqwest::Client,
    config: &Config,
    range: SpreadsheetRange,
) -> Outcome<SpreadsheetDataResponse> {
    let settings = match config.sheets() {
        Ok(settings) => settings,
        Err(e) => return e.into(),
    };
    if range.row == 0 {
        return ToolError::invalid_input("row is 1-based and must be at least 1").into();
    }

    match fetch_values(http, config, &settings).await {
        Ok(values) => match build_sheet_data(&values, range, config.header_row) {
            Ok(data) => {
                info!(
                    row = range.row,
                    column = range.column,
                    returned = data.data.len(),
                    total = data.total_count,
                    "spreadsheet range read"
                );
                Outcome::Found(data)
            }
            Err(e) => Outcome::Failure(e.into_tool_error()),
        },
        Err(e) => {
            warn!(worksheet = %settings.worksheet_name, error = %e, "spreadsheet read failed");
            Outcome::Failure(e.into_tool_error())
        }
    }
}

async fn fetch_values(
    http: &reqwest::Client,
    config: &Config,
    settings: &SheetSettings,
) -> Result<Vec<Vec<String>>, SheetError> {
    let spreadsheet_id = spreadsheet_id(&settings.sheet_url)?;
    let key = ServiceAccountKey::from_file(&settings.service_account_path)?;
    let token = google_auth::fetch_access_token(
        http,
        &key,
        SHEETS_READONLY_SCOPE,
        config.http.max_error_body_bytes,
    )
    .await?;

    let url = values_url(&config.sheets_api_url, &spreadsheet_id, &settings.worksheet_name)?;
    let resp = http
        .get(url)
        .query(&[("majorDimension", "ROWS")])
        .bearer_auth(token)
        .send()
        .await
        .map_err(CommonError::from)?;
    let range: ValueRange = parse_json_response(resp, config.http.max_error_body_bytes).await?;
    Ok(range.values)
}

/// Spreadsheet id from a `https://docs.google.com/spreadsheets/d/{id}/...` URL.
pub fn spreadsheet_id(sheet_url: &str) -> Result<String, SheetError> {
    let id_re = Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("valid regex");
    id_re
        .captures(sheet_url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| SheetError::InvalidUrl(sheet_url.to_string()))
}

fn values_url(api_url: &str, spreadsheet_id: &str, worksheet: &str) -> Result<reqwest::Url, SheetError> {
    let mut url = reqwest::Url::parse(api_url)
        .map_err(|e| SheetError::InvalidUrl(format!("{api_url}: {e}")))?;
    // A quoted sheet name is an A1 range covering the whole worksheet.
    let range = format!("'{}'", worksheet.replace('\'', "''"));
    url.path_segments_mut()
        .map_err(|_| SheetError::InvalidUrl(api_url.to_string()))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range.as_str()]);
    Ok(url)
}

/// Shape worksheet rows into the header plus records.
///
/// `header_row` is the 1-based structural header; records are every row after it.
pub fn build_sheet_data(
    values: &[Vec<String>],
    range: SpreadsheetRange,
    header_row: u32,
) -> Result<SpreadsheetDataResponse, SheetError> {
    let header: Vec<String> = (range.row as usize)
        .checked_sub(1)
        .and_then(|index| values.get(index))
        .map(|row| row.iter().skip(range.column).cloned().collect())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    for name in header.iter().filter(|name| !name.is_empty()) {
        if !seen.insert(name.as_str()) {
            return Err(SheetError::DuplicateHeader(name.clone()));
        }
    }

    let records: Vec<Map<String, Value>> = values
        .iter()
        .skip(header_row as usize)
        .map(|row| to_record(row, range.column, &header))
        .collect();
    let total_count = records.len();

    Ok(SpreadsheetDataResponse {
        header,
        data: records.into_iter().take(range.count).collect(),
        total_count,
    })
}

fn to_record(row: &[String], column: usize, header: &[String]) -> Map<String, Value> {
    header
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .map(|(i, name)| {
            let cell = row.get(column + i).map(String::as_str).unwrap_or("");
            (name.clone(), numericise(cell))
        })
        .collect()
}

/// Integers and finite floats become JSON numbers; anything else stays text.
fn numericise(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::String(cell.to_string());
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}
