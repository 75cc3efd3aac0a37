//! Vector search: embed the query, brute-force cosine similarity over the
//! model's indexed embeddings, threshold, and enrich by id.
//!
//! `cosine_similarity` is kept near-verbatim from the teacher's
//! `vector_store::cosine_similarity`.

use super::{MatchType, SearchFilters, SearchResult};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::{EmbeddingContentType, Store};

/// Compute cosine similarity between two vectors; 0 if either norm is 0 or
/// the vectors have mismatched lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

pub async fn vector_search(
    store: &Store,
    embedder: &dyn Embedder,
    query: &str,
    model: &str,
    similarity_threshold: f32,
    filters: &SearchFilters,
) -> Result<Vec<SearchResult>> {
    let query_vector = embedder.embed(query).await?;
    let embeddings = store.embeddings.list_by_model(EmbeddingContentType::Chunk, model)?;

    let mut scored = Vec::new();
    for embedding in embeddings {
        let similarity = cosine_similarity(&query_vector, &embedding.vector);
        if similarity < similarity_threshold {
            continue;
        }
        let Some(chunk) = store.chunks.get(&embedding.content_id)? else { continue };
        let Some(memory) = store.memories.get(&chunk.memory_id)? else { continue };

        if let Some(space_id) = &filters.space_id {
            if &memory.space_id != space_id {
                continue;
            }
        }
        if let Some(range) = &filters.date_range {
            if !range.contains(memory.created_at) {
                continue;
            }
        }

        scored.push(SearchResult {
            memory,
            chunk: Some(chunk),
            similarity,
            highlights: Vec::new(),
            timestamps: None,
            match_type: MatchType::Vector,
        });
    }

    scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    let page = scored.into_iter().skip(filters.offset).take(filters.limit).collect();
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_opposite_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_zero_vector_is_zero() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
