//! Tool definitions exposed over MCP: a thin, narrow slice of the CLI
//! surface useful to an assistant driving spiralmem programmatically.

use serde_json::json;

use super::protocol::Tool;

pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "search".to_string(),
            description: "Keyword search over indexed memories and chunks.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "space": {"type": "string"},
                    "limit": {"type": "integer"}
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: "semantic_search".to_string(),
            description: "Vector search via the configured embedder, falling back to keyword search on failure."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "space": {"type": "string"},
                    "limit": {"type": "integer"},
                    "threshold": {"type": "number"}
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: "add_video".to_string(),
            description: "Run a local file or platform URL through the ingestion pipeline.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "input": {"type": "string"},
                    "space": {"type": "string"},
                    "title": {"type": "string"}
                },
                "required": ["input"]
            }),
        },
        Tool {
            name: "list_spaces".to_string(),
            description: "List the spaces memories are organized into.".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        },
        Tool {
            name: "get_transcript".to_string(),
            description: "Fetch the stored transcript for a memory id.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"memory_id": {"type": "string"}},
                "required": ["memory_id"]
            }),
        },
    ]
}
