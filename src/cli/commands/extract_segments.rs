//! `extract-segments` command: flatten a timestamped search into
//! compilation-ready rows, printed as a table or CSV.

use anyhow::Result;

use crate::cli::Output;
use crate::config::Settings;
use crate::search::CompilationRequest;

use super::context;

pub fn run_extract_segments(
    query: &str,
    space: Option<String>,
    limit: Option<usize>,
    min_duration: Option<i64>,
    max_duration: Option<i64>,
    csv: bool,
    settings: Settings,
) -> Result<()> {
    let _ = space; // compilation extraction is not yet space-scoped; kept for CLI symmetry with other search commands
    let store = context::open_store(&settings)?;
    let search_service = context::build_search_service(&settings, store);

    let request = CompilationRequest {
        query: query.to_string(),
        min_duration_ms: min_duration.unwrap_or(0),
        max_duration_ms: max_duration.unwrap_or(i64::MAX),
        limit: limit.unwrap_or(settings.search.default_limit),
    };

    let rows = search_service.compilation_segments(&request)?;

    if rows.is_empty() {
        Output::warning("No segments matched your query.");
        return Ok(());
    }

    if csv {
        print!("{}", crate::search::rows_to_csv(&rows));
        return Ok(());
    }

    Output::success(&format!("Found {} segments", rows.len()));
    for row in &rows {
        println!(
            "  {} [{}ms-{}ms, {}ms] {}",
            row.title.as_deref().unwrap_or(&row.source),
            row.start_ms,
            row.end_ms,
            row.duration_ms(),
            row.text.chars().take(120).collect::<String>()
        );
        Output::kv("cut hint", &row.cut_hint());
    }

    Ok(())
}
