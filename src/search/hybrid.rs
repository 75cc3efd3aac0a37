//! Hybrid search: fuse vector and keyword results by content id, with
//! graceful degradation to keyword-only when vector search fails.

use std::collections::HashMap;

use super::{keyword_search, vector_search, MatchType, SearchFilters, SearchResult};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::Store;

#[derive(Debug, Clone, Copy)]
pub struct HybridWeights {
    pub vector_weight: f32,
    pub keyword_weight: f32,
}

pub struct HybridSearchOutcome {
    pub results: Vec<SearchResult>,
    /// Set when vector search was attempted but failed; keyword results still returned.
    pub vector_search_failed: bool,
}

struct Fused {
    result: SearchResult,
    vector_score: f32,
    keyword_score: f32,
}

pub async fn hybrid_search(
    store: &Store,
    embedder: Option<&dyn Embedder>,
    query: &str,
    model: &str,
    weights: HybridWeights,
    similarity_threshold: f32,
    filters: &SearchFilters,
) -> Result<HybridSearchOutcome> {
    let mut by_content: HashMap<String, Fused> = HashMap::new();
    let mut vector_search_failed = false;

    // Fetch generously for each leg so fusion has enough candidates to dedupe
    // and rank before the caller's limit/offset is applied.
    let wide_filters = SearchFilters { limit: (filters.limit + filters.offset).max(50) * 4, offset: 0, ..filters.clone() };

    if weights.vector_weight > 0.0 {
        match embedder {
            Some(embedder) => {
                match vector_search(store, embedder, query, model, similarity_threshold, &wide_filters).await {
                    Ok(results) => {
                        for result in results {
                            let key = result.content_id().to_string();
                            let score = result.similarity;
                            by_content
                                .entry(key)
                                .and_modify(|f| f.vector_score = f.vector_score.max(score))
                                .or_insert(Fused { vector_score: score, keyword_score: 0.0, result });
                        }
                    }
                    Err(_) => vector_search_failed = true,
                }
            }
            None => vector_search_failed = true,
        }
    }

    if weights.keyword_weight > 0.0 {
        let results = keyword_search(store, query, &wide_filters)?;
        for result in results {
            let key = result.content_id().to_string();
            let score = result.similarity;
            match by_content.get_mut(&key) {
                Some(fused) => {
                    fused.keyword_score = fused.keyword_score.max(score);
                    fused.result.highlights.extend(result.highlights);
                }
                None => {
                    by_content.insert(key, Fused { vector_score: 0.0, keyword_score: score, result });
                }
            }
        }
    }

    let mut fused: Vec<Fused> = by_content.into_values().collect();
    for f in &mut fused {
        f.result.similarity = f.vector_score * weights.vector_weight + f.keyword_score * weights.keyword_weight;
        f.result.match_type = match (f.vector_score > 0.0, f.keyword_score > 0.0) {
            (true, true) => MatchType::Hybrid,
            (true, false) => MatchType::Vector,
            (false, true) => MatchType::Keyword,
            (false, false) => MatchType::Hybrid,
        };
        f.result.highlights.truncate(3);
        f.result.highlights.dedup();
    }

    fused.sort_by(|a, b| b.result.similarity.partial_cmp(&a.result.similarity).unwrap_or(std::cmp::Ordering::Equal));
    let results = fused
        .into_iter()
        .skip(filters.offset)
        .take(filters.limit)
        .map(|f| f.result)
        .collect();

    Ok(HybridSearchOutcome { results, vector_search_failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContentType, NewMemory};
    use serde_json::json;

    #[tokio::test]
    async fn test_hybrid_falls_back_to_keyword_only_without_embedder() {
        let store = Store::open_in_memory().unwrap();
        let space = store.spaces.default_space().unwrap();
        store
            .memories
            .create(
                &space.id,
                NewMemory {
                    space_id: Some(space.id.clone()),
                    content_type: ContentType::Video,
                    title: Some("rust talk".into()),
                    content: "rust programming deep dive".into(),
                    source: "local".into(),
                    file_path: None,
                    metadata: json!({}),
                },
            )
            .unwrap();

        let weights = HybridWeights { vector_weight: 0.3, keyword_weight: 0.7 };
        let outcome = hybrid_search(&store, None, "rust programming", "test-model", weights, 0.6, &SearchFilters::default())
            .await
            .unwrap();

        assert!(outcome.vector_search_failed);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].match_type, MatchType::Keyword);
    }
}
