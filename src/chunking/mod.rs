//! Content chunking: breaks a transcript into overlapping, sentence-aligned
//! text chunks with timestamp provenance, grounded on the teacher's
//! `chunking/temporal.rs` iterative-accumulation style.

mod algorithm;

pub use algorithm::chunk_transcript;

use serde::{Deserialize, Serialize};

use crate::config::ChunkingSettings;

/// A chunk of content produced from a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChunk {
    pub content: String,
    pub chunk_index: i32,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub word_count: usize,
    pub character_count: usize,
}

impl ContentChunk {
    pub fn duration(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// Configuration for chunking, per spec 4.4 (chars, not seconds).
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size, in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in characters.
    pub overlap_size: usize,
    /// Carry segment timestamps onto chunks.
    pub preserve_timestamps: bool,
    /// Back off to the nearest sentence terminator within the last 25% of the chunk.
    pub sentence_break: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            overlap_size: 80,
            preserve_timestamps: true,
            sentence_break: true,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            overlap_size: settings.overlap_size,
            preserve_timestamps: settings.preserve_timestamps,
            sentence_break: settings.sentence_break,
        }
    }
}

/// Result of chunking one transcript: the chunks plus the fraction that
/// carry both a start and an end time.
#[derive(Debug, Clone)]
pub struct ChunkingResult {
    pub chunks: Vec<ContentChunk>,
    pub timestamp_coverage: f64,
}
