//! sfmeta-mcp - MCP Server exposing the Salesforce report tools
//!
//! Speaks MCP (JSON-RPC) over stdio; logs go to stderr.

use clap::Parser;
use sfmeta::config::Config;
use sfmeta::mcp::McpServer;
use sfmeta::{observability, tools, Connection, SalesforceConnection};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sfmeta-mcp")]
#[command(about = "MCP Server - Salesforce report metadata tools")]
#[command(version)]
struct Cli {
    /// Org base URL (overrides SF_INSTANCE_URL)
    #[arg(long)]
    instance_url: Option<String>,

    /// OAuth access token (overrides SF_ACCESS_TOKEN)
    #[arg(long)]
    access_token: Option<String>,

    /// REST API version (overrides SF_API_VERSION)
    #[arg(long)]
    api_version: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    observability::init_tracing();

    let mut config = Config::load()?;
    config.apply_flags(cli.instance_url, cli.access_token, cli.api_version);
    if config.instance_url.is_empty() {
        tracing::warn!("no instance URL configured; tool calls will fail until SF_INSTANCE_URL is set");
    }

    let conn: Arc<dyn Connection> = Arc::new(SalesforceConnection::from_config(&config)?);
    let server = McpServer::new(tools::all_tools(conn));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server.run())?;

    Ok(())
}
