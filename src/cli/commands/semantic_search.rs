//! `semantic-search` command: vector search via the configured embedder,
//! falling back to keyword search if the vector path fails.

use anyhow::Result;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::search::SearchFilters;

use super::context;

#[allow(clippy::too_many_arguments)]
pub async fn run_semantic_search(
    query: &str,
    space: Option<String>,
    limit: Option<usize>,
    threshold: Option<f32>,
    timestamps: bool,
    json: bool,
    settings: Settings,
) -> Result<()> {
    if preflight::check(Operation::SemanticSearch, &settings).is_err() {
        Output::warning("no embedder configured, falling back to keyword search");
        return super::search::run_search(query, space, limit, timestamps, json, settings).await;
    }

    let store = context::open_store(&settings)?;
    let space_id = match &space {
        Some(name) => store.spaces.get_by_name(name)?.map(|s| s.id),
        None => None,
    };
    let mut effective_settings = settings.clone();
    if let Some(threshold) = threshold {
        effective_settings.search.vector_similarity_threshold = threshold;
    }
    let search_service = context::build_search_service(&effective_settings, store);

    let filters = SearchFilters {
        space_id,
        limit: limit.unwrap_or(settings.search.default_limit),
        ..SearchFilters::default()
    };

    let results = search_service.vector(query, &filters).await;
    let results = match results {
        Ok(results) => results,
        Err(e) => {
            Output::warning(&format!("vector search failed ({e}), falling back to keyword search"));
            return super::search::run_search(query, space, limit, timestamps, json, settings).await;
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
        let content = result.chunk.as_ref().map(|c| c.chunk_text.as_str()).unwrap_or(&result.memory.content);
        Output::search_result(title, "vector", result.similarity, content, Some(&result.memory.source));
    }

    Ok(())
}
