//! MCP (Model Context Protocol) server for spiralmem.
//!
//! Allows AI assistants to use spiralmem as a tool: search, ingest, and
//! fetch transcripts over JSON-RPC 2.0 on stdio.

mod protocol;
mod server;
mod tools;

pub use server::McpServer;
