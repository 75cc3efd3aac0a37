//! Timestamp-enriched search: attach each chunk result's `[startMs,endMs]`
//! plus per-word sub-matches drawn from the stored transcript snapshot.

use super::{keyword_search, tokenize, ResultTimestamps, SearchFilters, SearchResult, WordMatch};
use crate::error::Result;
use crate::store::{Store, TranscriptSnapshot};

fn collect_word_matches(transcript: &TranscriptSnapshot, start_ms: i64, end_ms: i64, tokens: &[String]) -> Vec<WordMatch> {
    transcript
        .segments
        .iter()
        .filter_map(|segment| segment.words.as_ref())
        .flatten()
        .filter(|word| word.start_ms >= start_ms && word.end_ms <= end_ms)
        .filter(|word| {
            let lower = word.word.to_lowercase();
            tokens.iter().any(|token| lower.contains(token.as_str()))
        })
        .map(|word| WordMatch { word: word.word.clone(), start_ms: word.start_ms, end_ms: word.end_ms })
        .collect()
}

pub fn search_with_timestamps(store: &Store, query: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
    let tokens = tokenize(query);
    let mut results = keyword_search(store, query, filters)?;

    for result in &mut results {
        let Some(chunk) = &result.chunk else { continue };
        let (Some(start_ms), Some(end_ms)) = (chunk.start_offset_ms, chunk.end_offset_ms) else { continue };

        let word_matches = store
            .processed_content
            .get_by_memory(&result.memory.id)?
            .and_then(|content| content.transcript)
            .map(|transcript| collect_word_matches(&transcript, start_ms, end_ms, &tokens))
            .unwrap_or_default();

        result.timestamps = Some(ResultTimestamps { start_ms, end_ms, word_matches });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContentType, NewMemory, TranscriptSegmentSnapshot, WordSnapshot};
    use serde_json::json;

    #[test]
    fn test_timestamps_attach_matching_words_only() {
        let store = Store::open_in_memory().unwrap();
        let space = store.spaces.default_space().unwrap();
        let (memory, chunks) = store
            .ingest_memory(
                &space.id,
                NewMemory {
                    space_id: Some(space.id.clone()),
                    content_type: ContentType::Video,
                    title: Some("rust talk".into()),
                    content: "rust programming overview".into(),
                    source: "local".into(),
                    file_path: None,
                    metadata: json!({}),
                },
                vec![("rust programming overview".to_string(), Some(0), Some(3000))],
                None,
            )
            .unwrap();

        let transcript = TranscriptSnapshot {
            language: Some("en".into()),
            duration_sec: 3.0,
            segment_count: 1,
            full_text: "rust programming overview".into(),
            segments: vec![TranscriptSegmentSnapshot {
                text: "rust programming overview".into(),
                start_sec: 0.0,
                end_sec: 3.0,
                confidence: None,
                words: Some(vec![
                    WordSnapshot { word: "rust".into(), start_ms: 0, end_ms: 500, confidence: None },
                    WordSnapshot { word: "programming".into(), start_ms: 500, end_ms: 1500, confidence: None },
                    WordSnapshot { word: "overview".into(), start_ms: 1500, end_ms: 2500, confidence: None },
                ]),
            }],
        };
        store.processed_content.create("job-1", &memory.id, chunks, None, Some(transcript), None, None).unwrap();

        let results = search_with_timestamps(&store, "rust overview", &SearchFilters::default()).unwrap();
        assert_eq!(results.len(), 1);
        let ts = results[0].timestamps.as_ref().unwrap();
        assert_eq!(ts.start_ms, 0);
        assert_eq!(ts.end_ms, 3000);
        let words: Vec<&str> = ts.word_matches.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["rust", "overview"]);
    }
}
