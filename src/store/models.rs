//! Entity types persisted by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

/// A logical partition grouping memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub settings: Json,
    pub created_at: DateTime<Utc>,
}

/// The kind of content a memory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Document,
    Video,
    Url,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Document => "document",
            ContentType::Video => "video",
            ContentType::Url => "url",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = crate::error::SpiralmemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ContentType::Text),
            "document" => Ok(ContentType::Document),
            "video" => Ok(ContentType::Video),
            "url" => Ok(ContentType::Url),
            other => Err(crate::error::SpiralmemError::Validation(format!(
                "unknown content type: {other}"
            ))),
        }
    }
}

/// The logical unit of ingested content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub space_id: String,
    pub content_type: ContentType,
    pub title: Option<String>,
    pub content: String,
    pub source: String,
    pub file_path: Option<String>,
    pub metadata: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a memory.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub space_id: Option<String>,
    pub content_type: ContentType,
    pub title: Option<String>,
    pub content: String,
    pub source: String,
    pub file_path: Option<String>,
    pub metadata: Json,
}

/// A sub-piece of a memory, sized for retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub memory_id: String,
    pub chunk_text: String,
    pub chunk_order: i64,
    pub start_offset_ms: Option<i64>,
    pub end_offset_ms: Option<i64>,
    pub metadata: Json,
    pub created_at: DateTime<Utc>,
}

/// Content types an embedding may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingContentType {
    Chunk,
    Memory,
    Frame,
}

impl EmbeddingContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingContentType::Chunk => "chunk",
            EmbeddingContentType::Memory => "memory",
            EmbeddingContentType::Frame => "frame",
        }
    }
}

impl std::str::FromStr for EmbeddingContentType {
    type Err = crate::error::SpiralmemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chunk" => Ok(EmbeddingContentType::Chunk),
            "memory" => Ok(EmbeddingContentType::Memory),
            "frame" => Ok(EmbeddingContentType::Frame),
            other => Err(crate::error::SpiralmemError::Validation(format!(
                "unknown embedding content type: {other}"
            ))),
        }
    }
}

/// A fixed-dimension dense vector representing a piece of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEmbedding {
    pub id: String,
    pub content_id: String,
    pub content_type: EmbeddingContentType,
    pub model: String,
    pub dimensions: usize,
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl VectorEmbedding {
    /// The composite key `(contentId, contentType, model)` encoded as a single id.
    pub fn composite_id(content_id: &str, content_type: EmbeddingContentType, model: &str) -> String {
        format!("{}:{}:{}", content_id, content_type.as_str(), model)
    }
}

/// Source kind for a video processing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Local,
    Youtube,
    Platform,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Local => "local",
            SourceType::Youtube => "youtube",
            SourceType::Platform => "platform",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = crate::error::SpiralmemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(SourceType::Local),
            "youtube" => Ok(SourceType::Youtube),
            "platform" => Ok(SourceType::Platform),
            other => Err(crate::error::SpiralmemError::Validation(format!(
                "unknown source type: {other}"
            ))),
        }
    }
}

/// Status of a `VideoProcessingJob`. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::str::FromStr for JobStatus {
    type Err = crate::error::SpiralmemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(crate::error::SpiralmemError::Validation(format!(
                "unknown job status: {other}"
            ))),
        }
    }
}

/// Status of an individual pipeline step within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for StepStatus {
    type Err = crate::error::SpiralmemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "running" => Ok(StepStatus::Running),
            "completed" => Ok(StepStatus::Completed),
            "failed" => Ok(StepStatus::Failed),
            other => Err(crate::error::SpiralmemError::Validation(format!(
                "unknown step status: {other}"
            ))),
        }
    }
}

/// A single step of the video-ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStep {
    pub name: String,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
    pub metadata: Option<Json>,
}

impl ProcessingStep {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Pending,
            started_at: None,
            ended_at: None,
            duration_ms: None,
            error: None,
            metadata: None,
        }
    }
}

/// One execution of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoProcessingJob {
    pub id: String,
    pub source_id: String,
    pub source_type: SourceType,
    pub status: JobStatus,
    pub progress: u8,
    pub video_path: Option<String>,
    pub audio_path: Option<String>,
    pub transcript_path: Option<String>,
    pub processing_steps: Vec<ProcessingStep>,
    pub metadata: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl VideoProcessingJob {
    pub fn new(source_id: impl Into<String>, source_type: SourceType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            source_id: source_id.into(),
            source_type,
            status: JobStatus::Pending,
            progress: 0,
            video_path: None,
            audio_path: None,
            transcript_path: None,
            processing_steps: Vec::new(),
            metadata: Json::Object(Default::default()),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// A transcript segment, with optional word-level timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegmentSnapshot {
    pub text: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub confidence: Option<f32>,
    pub words: Option<Vec<WordSnapshot>>,
}

/// A single transcribed word with millisecond timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordSnapshot {
    pub word: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub confidence: Option<f32>,
}

/// Transcript snapshot stored alongside a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSnapshot {
    pub language: Option<String>,
    pub duration_sec: f64,
    pub segment_count: usize,
    pub full_text: String,
    pub segments: Vec<TranscriptSegmentSnapshot>,
}

/// Content produced by a completed job; exists 1:1 with the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedVideoContent {
    pub id: String,
    pub job_id: String,
    pub memory_id: String,
    pub chunks: Vec<Chunk>,
    pub embeddings: Option<Vec<VectorEmbedding>>,
    pub transcript: Option<TranscriptSnapshot>,
    pub frames: Option<Json>,
    pub thumbnails: Option<Json>,
    pub metadata: Json,
    pub created_at: DateTime<Utc>,
}

/// Supported platforms for URL-based indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Spotify,
    Zoom,
    Teams,
    Vimeo,
    Rumble,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Spotify => "spotify",
            Platform::Zoom => "zoom",
            Platform::Teams => "teams",
            Platform::Vimeo => "vimeo",
            Platform::Rumble => "rumble",
        }
    }
}

/// Per-URL indexing metadata for a platform video (no full download required).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformVideo {
    pub id: String,
    pub memory_id: String,
    pub platform: Platform,
    pub platform_video_id: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<f64>,
    pub upload_date: Option<DateTime<Utc>>,
    pub channel_info: Option<Json>,
    pub playlist_info: Option<Json>,
    pub platform_metadata: Json,
    pub last_indexed: DateTime<Utc>,
    pub accessibility_data: Option<Json>,
}

/// A transcript keyed by a platform video id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformTranscript {
    pub id: String,
    pub platform_video_id: String,
    pub full_text: String,
    pub segments: Vec<TranscriptSegmentSnapshot>,
    pub created_at: DateTime<Utc>,
}

/// The kind of video a deep link targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    Local,
    Platform,
}

impl VideoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::Local => "local",
            VideoType::Platform => "platform",
        }
    }
}

/// A platform URL including a timestamp for direct navigation to a moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoDeepLink {
    pub id: String,
    pub video_id: String,
    pub video_type: VideoType,
    pub timestamp_start_sec: f64,
    pub timestamp_end_sec: Option<f64>,
    pub deeplink_url: String,
    pub context_summary: Option<String>,
    pub search_keywords: Option<String>,
    pub confidence_score: f32,
    pub created_at: DateTime<Utc>,
}

/// A unique (case-insensitive) label attachable to memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Serialize an `f32` embedding to a little-endian byte blob for SQLite storage.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for v in embedding {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Deserialize a little-endian byte blob back into an `f32` embedding.
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_byte_roundtrip() {
        let original = vec![0.1_f32, -2.5, 3.333, 0.0];
        let bytes = embedding_to_bytes(&original);
        let restored = bytes_to_embedding(&bytes);
        assert_eq!(original, restored);
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_composite_embedding_id() {
        let id = VectorEmbedding::composite_id("chunk-1", EmbeddingContentType::Chunk, "text-embedding-3-small");
        assert_eq!(id, "chunk-1:chunk:text-embedding-3-small");
    }
}
