use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetPageInfoParams {
    /// Page title fragment or page number prefix, e.g. "Piggy Bam Ahoy", "Bingo", "123".
    pub query: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSpreadsheetDataParams {
    /// 1-based row number holding the header.
    pub row: u32,
    /// 0-based column offset where the header starts.
    pub column: usize,
    /// Maximum number of records to return (default: 10).
    pub count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageInfoResponse {
    pub title: String,
    /// Rendered page body, absent when the content service did not return one.
    pub body_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpreadsheetDataResponse {
    pub header: Vec<String>,
    pub data: Vec<Map<String, Value>>,
    /// Number of records available below the header, before `count` truncation.
    #[serde(rename = "totalCount")]
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
}
