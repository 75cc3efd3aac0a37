//! MCP server implementation.

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use super::protocol::*;
use super::tools::get_tools;
use crate::cli::commands::context;
use crate::config::Settings;
use crate::pipeline::PipelineOptions;
use crate::platform::{self, DownloadOptions};
use crate::search::SearchFilters;
use crate::store::{SourceType, Store};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "spiralmem";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server for spiralmem, bridging JSON-RPC tool calls onto the store,
/// search, and pipeline facades.
pub struct McpServer {
    settings: Settings,
    store: Option<Store>,
}

impl McpServer {
    pub fn new(settings: Settings) -> Self {
        Self { settings, store: None }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        eprintln!("spiralmem MCP server starting...");

        for line in stdin.lock().lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    eprintln!("Failed to parse request: {e}");
                    let response = JsonRpcResponse::error(None, -32700, "Parse error");
                    writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
                    stdout.flush()?;
                    continue;
                }
            };

            let response = self.handle_request(request).await;
            writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
            stdout.flush()?;
        }

        Ok(())
    }

    async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "initialized" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(request.id, -32601, &format!("Method not found: {}", request.method)),
        }
    }

    fn handle_initialize(&mut self, id: Option<Value>) -> JsonRpcResponse {
        match context::open_store(&self.settings) {
            Ok(store) => {
                self.store = Some(store);
                eprintln!("Store opened");
            }
            Err(e) => {
                eprintln!("Failed to open store: {e}");
                return JsonRpcResponse::error(id, -32000, &format!("Init failed: {e}"));
            }
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities { tools: ToolsCapability { list_changed: false } },
            server_info: ServerInfo { name: SERVER_NAME.to_string(), version: SERVER_VERSION.to_string() },
        };
        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ToolsListResult { tools: get_tools() };
        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => return JsonRpcResponse::error(id, -32602, &format!("Invalid params: {e}")),
            },
            None => return JsonRpcResponse::error(id, -32602, "Missing params"),
        };

        let result = match params.name.as_str() {
            "search" => self.tool_search(params.arguments).await,
            "semantic_search" => self.tool_semantic_search(params.arguments).await,
            "add_video" => self.tool_add_video(params.arguments).await,
            "list_spaces" => self.tool_list_spaces(),
            "get_transcript" => self.tool_get_transcript(params.arguments),
            _ => ToolCallResult::error(format!("Unknown tool: {}", params.name)),
        };

        JsonRpcResponse::success(id, serde_json::to_value(result).unwrap())
    }

    fn store(&self) -> Result<&Store, ToolCallResult> {
        self.store.as_ref().ok_or_else(|| ToolCallResult::error("Server not initialized".to_string()))
    }

    async fn tool_search(&self, args: Option<Value>) -> ToolCallResult {
        let Some(args) = args else { return ToolCallResult::error("Missing arguments".to_string()) };
        let Some(query) = args.get("query").and_then(|v| v.as_str()) else {
            return ToolCallResult::error("Missing 'query' argument".to_string());
        };
        let limit = args.get("limit").and_then(|v| v.as_u64()).unwrap_or(5) as usize;

        let store = match self.store() {
            Ok(store) => store.clone(),
            Err(e) => return e,
        };
        let search_service = context::build_search_service(&self.settings, store);
        let filters = SearchFilters::with_limit(limit);

        match search_service.keyword(query, &filters) {
            Ok(results) if results.is_empty() => ToolCallResult::text("No matching results found.".to_string()),
            Ok(results) => ToolCallResult::text(render_results(&results)),
            Err(e) => ToolCallResult::error(format!("Search failed: {e}")),
        }
    }

    async fn tool_semantic_search(&self, args: Option<Value>) -> ToolCallResult {
        let Some(args) = args else { return ToolCallResult::error("Missing arguments".to_string()) };
        let Some(query) = args.get("query").and_then(|v| v.as_str()) else {
            return ToolCallResult::error("Missing 'query' argument".to_string());
        };
        let limit = args.get("limit").and_then(|v| v.as_u64()).unwrap_or(5) as usize;

        let store = match self.store() {
            Ok(store) => store.clone(),
            Err(e) => return e,
        };
        let search_service = context::build_search_service(&self.settings, store);
        let filters = SearchFilters::with_limit(limit);

        match search_service.vector(query, &filters).await {
            Ok(results) if results.is_empty() => ToolCallResult::text("No matching results found.".to_string()),
            Ok(results) => ToolCallResult::text(render_results(&results)),
            Err(_) => self.tool_search(Some(args)).await,
        }
    }

    async fn tool_add_video(&self, args: Option<Value>) -> ToolCallResult {
        let Some(args) = args else { return ToolCallResult::error("Missing arguments".to_string()) };
        let Some(input) = args.get("input").and_then(|v| v.as_str()) else {
            return ToolCallResult::error("Missing 'input' argument".to_string());
        };
        let space = args.get("space").and_then(|v| v.as_str());
        let title = args.get("title").and_then(|v| v.as_str()).map(str::to_string);

        let store = match self.store() {
            Ok(store) => store.clone(),
            Err(e) => return e,
        };
        let space_id = match context::resolve_space_id(&store, space) {
            Ok(id) => id,
            Err(e) => return ToolCallResult::error(format!("Could not resolve space: {e}")),
        };

        let (video_path, source_type) = match platform::parse_platform_url(input) {
            Ok(_) => {
                let downloader_binary = self.settings.platform.downloader_binary.clone().unwrap_or_else(|| "yt-dlp".to_string());
                let opts = DownloadOptions { output_dir: self.settings.temp_dir().join("downloads"), ..Default::default() };
                match platform::download_video(&downloader_binary, input, &opts).await {
                    Ok(downloaded) => (downloaded.path.to_string_lossy().to_string(), SourceType::Platform),
                    Err(e) => return ToolCallResult::error(format!("Download failed: {e}")),
                }
            }
            Err(_) => (input.to_string(), SourceType::Local),
        };

        let pipeline = context::build_pipeline(&self.settings, store);
        let mut options = PipelineOptions::new(self.settings.temp_dir(), &self.settings.chunking);
        options.custom_title = title;

        match pipeline.process_video(&video_path, &space_id, source_type, options).await {
            Ok(outcome) => match outcome.memory {
                Some(memory) => ToolCallResult::text(format!(
                    "Processed '{}' ({} chunks, memory id {})",
                    memory.title.as_deref().unwrap_or(&memory.source),
                    outcome.chunk_count,
                    memory.id
                )),
                None => ToolCallResult::error(format!("Job {} did not complete successfully", outcome.job.id)),
            },
            Err(e) => ToolCallResult::error(format!("Processing failed: {e}")),
        }
    }

    fn tool_list_spaces(&self) -> ToolCallResult {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => return e,
        };
        match store.spaces.list() {
            Ok(spaces) if spaces.is_empty() => ToolCallResult::text("No spaces yet.".to_string()),
            Ok(spaces) => {
                let mut out = String::new();
                for space in &spaces {
                    out.push_str(&format!("- {} ({})\n", space.name, space.id));
                }
                ToolCallResult::text(out)
            }
            Err(e) => ToolCallResult::error(format!("Failed to list spaces: {e}")),
        }
    }

    fn tool_get_transcript(&self, args: Option<Value>) -> ToolCallResult {
        let Some(args) = args else { return ToolCallResult::error("Missing arguments".to_string()) };
        let Some(memory_id) = args.get("memory_id").and_then(|v| v.as_str()) else {
            return ToolCallResult::error("Missing 'memory_id' argument".to_string());
        };
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => return e,
        };

        match store.processed_content.get_by_memory(memory_id) {
            Ok(Some(processed)) => match processed.transcript {
                Some(transcript) => ToolCallResult::text(transcript.full_text),
                None => ToolCallResult::error(format!("Memory {memory_id} has no stored transcript")),
            },
            Ok(None) => ToolCallResult::error(format!("No processed content found for memory {memory_id}")),
            Err(e) => ToolCallResult::error(format!("Failed to get transcript: {e}")),
        }
    }
}

fn render_results(results: &[crate::search::SearchResult]) -> String {
    let mut out = format!("Found {} results:\n\n", results.len());
    for (i, result) in results.iter().enumerate() {
        let title = result.memory.title.as_deref().unwrap_or(&result.memory.source);
        let content = result.chunk.as_ref().map(|c| c.chunk_text.as_str()).unwrap_or(&result.memory.content);
        out.push_str(&format!("{}. **{}** (score: {:.2})\n   {}\n\n", i + 1, title, result.similarity, truncate(content, 200)));
    }
    out
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
