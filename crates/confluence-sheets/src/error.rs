/// Startup-level errors. Tool calls never surface these; they report `ToolError`s.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] mcp_common::error::CommonError),
}
