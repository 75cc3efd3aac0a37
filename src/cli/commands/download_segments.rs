//! `download-segments` command: download the platform segments matched by a
//! query, one file per range, grouped by source URL.

use anyhow::Result;

use crate::cli::Output;
use crate::config::Settings;
use crate::platform::DownloadSegmentsOptions;
use crate::search::{group_by_source, CompilationRequest};

use super::context;

#[allow(clippy::too_many_arguments)]
pub async fn run_download_segments(
    query: &str,
    space: Option<String>,
    limit: Option<usize>,
    min_duration: Option<i64>,
    max_duration: Option<i64>,
    quality: &str,
    output_dir: Option<String>,
    settings: Settings,
) -> Result<()> {
    let _ = space;
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

    let grouped = group_by_source(&rows);
    let downloader_binary = settings.platform.downloader_binary.clone().unwrap_or_else(|| "yt-dlp".to_string());
    let output_dir = output_dir.map(std::path::PathBuf::from).unwrap_or_else(|| settings.temp_dir().join("segments"));

    let mut total_ok = 0usize;
    let mut total_failed = 0usize;

    for (source, ranges) in &grouped {
        Output::info(&format!("Downloading {} segment(s) from {source}", ranges.len()));
        let opts = DownloadSegmentsOptions {
            quality: quality.to_string(),
            format: "mp4".to_string(),
            output_dir: output_dir.join(sanitize_for_dir(source)),
        };
        let results = crate::search::download_matched_segments(&downloader_binary, source, ranges, &opts).await;
        for result in &results {
            if result.success {
                total_ok += 1;
                if let Some(path) = &result.file_path {
                    Output::success(&format!("Saved: {}", path.display()));
                }
            } else {
                total_failed += 1;
                Output::warning(&format!("Segment failed: {}", result.error.as_deref().unwrap_or("unknown error")));
            }
        }
    }

    Output::success(&format!("{total_ok} segment(s) downloaded, {total_failed} failed"));
    Ok(())
}

fn sanitize_for_dir(source: &str) -> String {
    source.chars().map(|c| if c.is_alphanumeric() { c } else { '_' }).collect()
}
