//! gmail-mcp-bridge: Gmail tools over MCP stdio or an HTTP bridge
//!
//! Exposes search, read, compose, draft and label operations on one Gmail
//! mailbox. Every tool returns bounded text (Markdown or JSON) and reports
//! failures as a one-line diagnostic instead of a protocol error.
//!
//! # Architecture
//!
//! - [`main`]: Process entry point with env loading and transport selection
//! - [`config`]: Environment-driven configuration
//! - [`errors`]: Application error model
//! - [`credentials`]: Injected bearer credential providers
//! - [`gmail`]: Authenticated Gmail REST transport
//! - [`ids`]: Opaque provider identifier validation
//! - [`payload`]: Message part tree normalization
//! - [`extract`]: Attachment text extraction
//! - [`compose`]: Outbound message construction
//! - [`render`]: Markdown/JSON document rendering
//! - [`governor`]: Response size bounding
//! - [`pagination`]: Provider continuation tokens
//! - [`models`]: Tool input DTOs
//! - [`tools`]: Transport-agnostic tool dispatch surface
//! - [`server`]: MCP adapter
//! - [`bridge`]: HTTP adapter

mod bridge;
mod compose;
mod config;
mod credentials;
mod errors;
mod extract;
mod gmail;
mod governor;
mod ids;
mod models;
mod pagination;
mod payload;
mod render;
mod server;
mod tools;

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use config::ServerConfig;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Transport adapter to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// MCP over stdin/stdout
    Stdio,
    /// HTTP tool bridge
    Bridge,
}

#[derive(Debug, Parser)]
#[command(version, about = "Gmail tools over MCP stdio or an HTTP bridge")]
struct Cli {
    /// Transport to serve
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,
    /// Bridge listen address; overrides GMAIL_MCP_BRIDGE_BIND
    #[arg(long)]
    bind: Option<String>,
}

/// Application entry point
///
/// Initializes tracing to stderr (stdout carries the MCP protocol), loads
/// config and serves the selected transport.
///
/// # Environment Variables
///
/// See [`ServerConfig::load_from_env`] for full configuration options.
///
/// # Example
///
/// ```no_run
/// GMAIL_MCP_ACCESS_TOKEN=ya29.a0Af... cargo run -- --transport bridge --bind 127.0.0.1:3002
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load_from_env()?;
    let tools = Arc::new(tools::MailboxTools::new(gmail::GmailClient::from_config(
        &config,
    )?));

    match cli.transport {
        Transport::Stdio => {
            info!("serving MCP over stdio");
            let service = server::GmailMcpServer::new(tools).serve(stdio()).await?;
            service.waiting().await?;
        }
        Transport::Bridge => {
            let addr = match cli.bind.as_deref() {
                Some(raw) => config::parse_socket_addr(raw)?,
                None => config.bridge_bind,
            };
            bridge::serve(tools, addr).await?;
        }
    }
    Ok(())
}
