//! Keyword search: substring/token-overlap scoring over memory titles,
//! memory content, and chunk text — always available, no embedder required.

use super::{tokenize, MatchType, SearchFilters, SearchResult};
use crate::error::Result;
use crate::store::{Chunk, Store};

const HIGHLIGHT_RADIUS: usize = 50;
const MAX_HIGHLIGHTS: usize = 3;

/// Score `text` against `tokens` as `matchedTokens / totalTokens`, and
/// collect up to [`MAX_HIGHLIGHTS`] windows of `text` around each match.
fn score_and_highlight(text: &str, tokens: &[String]) -> (f32, Vec<String>) {
    if tokens.is_empty() {
        return (0.0, Vec::new());
    }
    let chars: Vec<char> = text.chars().collect();
    let lower = text.to_lowercase();
    let mut matched = 0usize;
    let mut highlights = Vec::new();

    for token in tokens {
        if let Some(byte_pos) = lower.find(token.as_str()) {
            matched += 1;
            if highlights.len() < MAX_HIGHLIGHTS {
                // Assumes lowercasing doesn't change the text's char count, true
                // for the transcript content this operates on.
                let char_pos = lower[..byte_pos].chars().count();
                let start = char_pos.saturating_sub(HIGHLIGHT_RADIUS);
                let end = (char_pos + HIGHLIGHT_RADIUS).min(chars.len());
                highlights.push(chars[start..end].iter().collect());
            }
        }
    }

    (matched as f32 / tokens.len() as f32, highlights)
}

/// Best-scoring chunk of `memory_id`, if any chunk matches at all.
fn best_chunk_match(store: &Store, memory_id: &str, tokens: &[String]) -> Result<Option<(Chunk, f32, Vec<String>)>> {
    let chunks = store.chunks.list_by_memory(memory_id)?;
    let mut best: Option<(Chunk, f32, Vec<String>)> = None;
    for chunk in chunks {
        let (score, highlights) = score_and_highlight(&chunk.chunk_text, tokens);
        if score > 0.0 && best.as_ref().map(|(_, s, _)| score > *s).unwrap_or(true) {
            best = Some((chunk, score, highlights));
        }
    }
    Ok(best)
}

pub fn keyword_search(store: &Store, query: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let memories = store.memories.list_for_search(filters.space_id.as_deref(), filters.content_types.as_deref())?;

    let mut scored = Vec::new();
    for memory in memories {
        if let Some(range) = &filters.date_range {
            if !range.contains(memory.created_at) {
                continue;
            }
        }

        let title_and_content = format!("{} {}", memory.title.clone().unwrap_or_default(), memory.content);
        let (memory_score, memory_highlights) = score_and_highlight(&title_and_content, &tokens);
        let chunk_match = best_chunk_match(store, &memory.id, &tokens)?;

        let (similarity, chunk, highlights) = match chunk_match {
            Some((chunk, chunk_score, chunk_highlights)) if chunk_score >= memory_score => {
                (chunk_score, Some(chunk), chunk_highlights)
            }
            _ if memory_score > 0.0 => (memory_score, None, memory_highlights),
            Some((chunk, chunk_score, chunk_highlights)) => (chunk_score, Some(chunk), chunk_highlights),
            None => continue,
        };

        if similarity <= 0.0 {
            continue;
        }

        scored.push(SearchResult {
            memory,
            chunk,
            similarity,
            highlights,
            timestamps: None,
            match_type: MatchType::Keyword,
        });
    }

    scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    let page = scored.into_iter().skip(filters.offset).take(filters.limit).collect();
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContentType, NewMemory};
    use serde_json::json;

    fn seed_memory(store: &Store, content: &str) -> crate::store::Memory {
        let space = store.spaces.default_space().unwrap();
        store
            .memories
            .create(
                &space.id,
                NewMemory {
                    space_id: Some(space.id.clone()),
                    content_type: ContentType::Video,
                    title: Some("demo talk".into()),
                    content: content.into(),
                    source: "local".into(),
                    file_path: None,
                    metadata: json!({}),
                },
            )
            .unwrap()
    }

    #[test]
    fn test_keyword_search_scores_by_token_overlap() {
        let store = Store::open_in_memory().unwrap();
        seed_memory(&store, "rust systems programming language overview");
        let results = keyword_search(&store, "rust language", &SearchFilters::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].similarity, 1.0);
    }

    #[test]
    fn test_keyword_search_ignores_short_tokens() {
        let store = Store::open_in_memory().unwrap();
        seed_memory(&store, "a rust talk");
        let results = keyword_search(&store, "to a", &SearchFilters::default()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_keyword_search_returns_no_results_when_nothing_matches() {
        let store = Store::open_in_memory().unwrap();
        seed_memory(&store, "completely unrelated content here");
        let results = keyword_search(&store, "rust", &SearchFilters::default()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_highlight_window_is_centered_on_match() {
        let text = "x".repeat(100) + "rust" + &"y".repeat(100);
        let (score, highlights) = score_and_highlight(&text, &["rust".to_string()]);
        assert_eq!(score, 1.0);
        assert_eq!(highlights.len(), 1);
        assert!(highlights[0].contains("rust"));
    }
}
