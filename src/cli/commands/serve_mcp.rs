//! `serve-mcp` command: run the MCP server over stdio.

use anyhow::Result;

use crate::config::Settings;
use crate::mcp::McpServer;

pub async fn run_serve_mcp(settings: Settings) -> Result<()> {
    let mut server = McpServer::new(settings);
    server.run().await
}
