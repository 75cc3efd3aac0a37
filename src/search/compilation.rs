//! Compilation-segment extraction: flatten a timestamped search's word
//! matches into duration-filtered rows, orderable as CSV for cut tools.

use super::{search_with_timestamps, SearchFilters};
use crate::error::Result;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct CompilationRequest {
    pub query: String,
    pub min_duration_ms: i64,
    pub max_duration_ms: i64,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct CompilationRow {
    pub source: String,
    pub title: Option<String>,
    pub text: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub speaker: Option<String>,
}

impl CompilationRow {
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// A cut-tool-friendly hint: `source@startMs-endMs`.
    pub fn cut_hint(&self) -> String {
        format!("{}@{}-{}", self.source, self.start_ms, self.end_ms)
    }
}

/// The tightest span covering a result's matched words, falling back to the
/// whole chunk range when no word-level matches were recovered.
fn candidate_span(result: &super::SearchResult) -> Option<(i64, i64)> {
    let ts = result.timestamps.as_ref()?;
    if ts.word_matches.is_empty() {
        return Some((ts.start_ms, ts.end_ms));
    }
    let start = ts.word_matches.iter().map(|w| w.start_ms).min()?;
    let end = ts.word_matches.iter().map(|w| w.end_ms).max()?;
    Some((start, end))
}

pub fn extract_compilation_segments(store: &Store, request: &CompilationRequest) -> Result<Vec<CompilationRow>> {
    let search_filters = SearchFilters::with_limit(request.limit.max(1) * 4);
    let results = search_with_timestamps(store, &request.query, &search_filters)?;

    let mut rows: Vec<CompilationRow> = Vec::new();
    for result in results {
        let Some((start_ms, end_ms)) = candidate_span(&result) else { continue };
        let duration = end_ms - start_ms;
        if duration < request.min_duration_ms || duration > request.max_duration_ms {
            continue;
        }
        let speaker = result.memory.metadata.get("speaker").and_then(|v| v.as_str()).map(str::to_string);
        let text = result.chunk.as_ref().map(|c| c.chunk_text.clone()).unwrap_or_else(|| result.memory.content.clone());

        rows.push(CompilationRow {
            source: result.memory.source.clone(),
            title: result.memory.title.clone(),
            text,
            start_ms,
            end_ms,
            speaker,
        });
    }

    rows.truncate(request.limit);
    Ok(rows)
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render rows as CSV: `source,title,text,start_ms,end_ms,duration_ms,speaker`.
pub fn rows_to_csv(rows: &[CompilationRow]) -> String {
    let mut out = String::from("source,title,text,start_ms,end_ms,duration_ms,speaker\n");
    for row in rows {
        out.push_str(&csv_escape(&row.source));
        out.push(',');
        out.push_str(&csv_escape(row.title.as_deref().unwrap_or("")));
        out.push(',');
        out.push_str(&csv_escape(&row.text));
        out.push(',');
        out.push_str(&row.start_ms.to_string());
        out.push(',');
        out.push_str(&row.end_ms.to_string());
        out.push(',');
        out.push_str(&row.duration_ms().to_string());
        out.push(',');
        out.push_str(&csv_escape(row.speaker.as_deref().unwrap_or("")));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escapes_commas_and_quotes() {
        let rows = vec![CompilationRow {
            source: "video, one".into(),
            title: Some("a \"quoted\" title".into()),
            text: "hello".into(),
            start_ms: 0,
            end_ms: 1000,
            speaker: None,
        }];
        let csv = rows_to_csv(&rows);
        assert!(csv.contains("\"video, one\""));
        assert!(csv.contains("\"a \"\"quoted\"\" title\""));
    }

    #[test]
    fn test_cut_hint_format() {
        let row = CompilationRow {
            source: "clip.mp4".into(),
            title: None,
            text: "hi".into(),
            start_ms: 1000,
            end_ms: 4000,
            speaker: None,
        };
        assert_eq!(row.cut_hint(), "clip.mp4@1000-4000");
        assert_eq!(row.duration_ms(), 3000);
    }
}
