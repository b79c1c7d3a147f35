mod config;
mod confluence;
mod error;
mod google_auth;
mod model;
mod normalize;
mod resolver;
mod server;
mod sheets;
mod similarity;
#[cfg(test)]
mod test_support;

use rmcp::{
    ServiceExt,
    transport::stdio,
    transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    },
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, Transport};
use server::ConfluenceSheetsServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries JSON-RPC in stdio mode
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting confluence-sheets MCP server");

    let config = Config::from_env()?;
    info!(
        confluence = config.confluence().is_ok(),
        root_pages = config.page_ids.len(),
        sheet = config.sheets().is_ok(),
        header_row = config.header_row,
        timeout_ms = config.http.timeout.as_millis(),
        "configuration loaded"
    );

    let transport = config.transport;
    let listen_addr = config.listen_addr.clone();
    let server = ConfluenceSheetsServer::new(config)?;

    match transport {
        Transport::Stdio => {
            info!("MCP server ready, serving on stdio");
            let service = server.serve(stdio()).await.inspect_err(|e| {
                tracing::error!(error = %e, "MCP server error");
            })?;
            service.waiting().await?;
        }
        Transport::Http => {
            let service = StreamableHttpService::new(
                move || Ok(server.clone()),
                LocalSessionManager::default().into(),
                StreamableHttpServerConfig::default(),
            );
            let router = axum::Router::new().nest_service("/mcp", service);
            let listener = TcpListener::bind(&listen_addr).await?;
            info!(listen_addr = %listen_addr, "MCP server ready, serving streamable HTTP on /mcp");
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "cannot listen for shutdown signal");
                    }
                })
                .await?;
        }
    }

    info!("MCP server shut down");
    Ok(())
}
