//! Hybrid search over ingested memories (spec 4.7): keyword, vector, and
//! fused scoring sharing one `SearchResult` shape, plus timestamp
//! enrichment, compilation-segment extraction, and platform segment
//! download dispatch.
//!
//! Grounded on teacher's `vector_store::cosine_similarity` (kept verbatim
//! in [`vector::cosine_similarity`]) and `rag::context::ContextBuilder`'s
//! embed-then-enrich shape.

mod compilation;
mod hybrid;
mod keyword;
mod platform_download;
mod timestamps;
mod vector;

pub use compilation::{rows_to_csv, CompilationRequest, CompilationRow};
pub use hybrid::{hybrid_search, HybridSearchOutcome, HybridWeights};
pub use keyword::keyword_search;
pub use platform_download::{download_matched_segments, group_by_source};
pub use timestamps::search_with_timestamps;
pub use vector::{cosine_similarity, vector_search};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SearchSettings;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::{Chunk, ContentType, Memory, Store};

/// How a result was matched, for hybrid fusion bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Vector,
    Keyword,
    Hybrid,
}

/// A single sub-word match within a result's timestamp window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordMatch {
    pub word: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Timestamp enrichment for a chunk-backed result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTimestamps {
    pub start_ms: i64,
    pub end_ms: i64,
    pub word_matches: Vec<WordMatch>,
}

/// Common shape returned by every search mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub memory: Memory,
    pub chunk: Option<Chunk>,
    pub similarity: f32,
    pub highlights: Vec<String>,
    pub timestamps: Option<ResultTimestamps>,
    pub match_type: MatchType,
}

impl SearchResult {
    /// Dedup key used by hybrid fusion: the chunk id when present, else the memory id.
    pub fn content_id(&self) -> &str {
        self.chunk.as_ref().map(|c| c.id.as_str()).unwrap_or(self.memory.id.as_str())
    }
}

/// Inclusive date range filter.
#[derive(Debug, Clone)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map(|f| at >= f).unwrap_or(true) && self.to.map(|t| at <= t).unwrap_or(true)
    }
}

/// Common query filters shared by every search mode.
#[derive(Debug, Clone)]
pub struct SearchFilters {
    pub space_id: Option<String>,
    pub content_types: Option<Vec<ContentType>>,
    pub date_range: Option<DateRange>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self { space_id: None, content_types: None, date_range: None, limit: 10, offset: 0 }
    }
}

impl SearchFilters {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit, ..Self::default() }
    }
}

/// Tokenize a query the way every search mode scores against: lowercase,
/// split on whitespace, drop tokens of length <= 2.
pub(crate) fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(|t| t.to_lowercase()).filter(|t| t.chars().count() > 2).collect()
}

/// Facade bundling the store, an optional embedder, and the configured
/// thresholds/weights, mirroring [`crate::pipeline::Pipeline`]'s shape.
pub struct SearchService {
    store: Store,
    embedder: Option<std::sync::Arc<dyn Embedder>>,
    settings: SearchSettings,
    embedding_model: String,
}

impl SearchService {
    pub fn new(
        store: Store,
        embedder: Option<std::sync::Arc<dyn Embedder>>,
        settings: SearchSettings,
        embedding_model: String,
    ) -> Self {
        Self { store, embedder, settings, embedding_model }
    }

    pub fn keyword(&self, query: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
        keyword_search(&self.store, query, filters)
    }

    pub async fn vector(&self, query: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| crate::error::SpiralmemError::Validation("vector search requires an embedder".into()))?;
        vector_search(
            &self.store,
            embedder.as_ref(),
            query,
            &self.embedding_model,
            self.settings.vector_similarity_threshold,
            filters,
        )
        .await
    }

    pub async fn hybrid(&self, query: &str, filters: &SearchFilters) -> Result<HybridSearchOutcome> {
        let weights = HybridWeights { vector_weight: self.settings.vector_weight, keyword_weight: self.settings.keyword_weight };
        hybrid_search(
            &self.store,
            self.embedder.as_deref(),
            query,
            &self.embedding_model,
            weights,
            self.settings.hybrid_similarity_threshold,
            filters,
        )
        .await
    }

    pub fn with_timestamps(&self, query: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
        search_with_timestamps(&self.store, query, filters)
    }

    pub fn compilation_segments(&self, request: &CompilationRequest) -> Result<Vec<CompilationRow>> {
        compilation::extract_compilation_segments(&self.store, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_short_tokens() {
        let tokens = tokenize("the Rust is a systems language");
        assert_eq!(tokens, vec!["rust", "systems", "language"]);
    }

    #[test]
    fn test_date_range_bounds() {
        let now = Utc::now();
        let range = DateRange { from: Some(now - chrono::Duration::hours(1)), to: Some(now + chrono::Duration::hours(1)) };
        assert!(range.contains(now));
        assert!(!range.contains(now - chrono::Duration::hours(2)));
    }
}
