//! `search` command: keyword search over indexed memories and chunks.

use anyhow::Result;

use crate::cli::Output;
use crate::config::Settings;
use crate::search::SearchFilters;

use super::context;

pub async fn run_search(
    query: &str,
    space: Option<String>,
    limit: Option<usize>,
    timestamps: bool,
    json: bool,
    settings: Settings,
) -> Result<()> {
    let store = context::open_store(&settings)?;
    let space_id = match &space {
        Some(name) => store.spaces.get_by_name(name)?.map(|s| s.id),
        None => None,
    };
    let search_service = context::build_search_service(&settings, store);

    let filters = SearchFilters {
        space_id,
        limit: limit.unwrap_or(settings.search.default_limit),
        ..SearchFilters::default()
    };

    let results = if timestamps {
        search_service.with_timestamps(query, &filters)
    } else {
        search_service.keyword(query, &filters)
    };

    let results = match results {
        Ok(results) => results,
        Err(e) => {
            if json {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
                return Ok(());
            }
            Output::error(&format!("Search failed: {e}"));
            return Err(anyhow::anyhow!("{}", e));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        Output::warning("No results found matching your query.");
        return Ok(());
    }

    Output::success(&format!("Found {} results", results.len()));
    for result in &results {
        let title = result.memory.title.as_deref().unwrap_or(&result.memory.source);
        let timestamp = result
            .timestamps
            .as_ref()
            .map(|t| format!("{}ms-{}ms", t.start_ms, t.end_ms))
            .unwrap_or_else(|| "n/a".to_string());
        let content = result.chunk.as_ref().map(|c| c.chunk_text.as_str()).unwrap_or(&result.memory.content);
        Output::search_result(title, &timestamp, result.similarity, content, Some(&result.memory.source));
    }

    Ok(())
}
