//! Configuration settings for spiralmem.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub media: MediaSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub store: StoreSettings,
    pub search: SearchSettings,
    pub pipeline: PipelineSettings,
    pub channel: ChannelSettings,
    pub platform: PlatformSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (db, audio/, transcripts/, frames/, thumbnails/, temp/).
    pub data_dir: String,
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.spiralmem".to_string(),
            temp_dir: "/tmp/spiralmem".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Settings for the media adapters (probe/extract-audio/extract-frames/thumbnail).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Name (or path) of the decoder/probe binary (ffmpeg-compatible).
    pub ffmpeg_binary: String,
    /// Name (or path) of the probe binary (ffprobe-compatible).
    pub ffprobe_binary: String,
    /// Timeout in seconds for `probe`.
    pub probe_timeout_secs: u64,
    /// Floor (and multiplier target) for audio-extraction timeout: max(2 * target duration, this).
    pub audio_extract_min_timeout_secs: u64,
    /// Timeout in seconds for frame sampling.
    pub frame_sample_timeout_secs: u64,
    /// Maximum concurrent ffmpeg-like subprocesses.
    pub max_concurrent_subprocesses: usize,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            ffmpeg_binary: "ffmpeg".to_string(),
            ffprobe_binary: "ffprobe".to_string(),
            probe_timeout_secs: 30,
            audio_extract_min_timeout_secs: 300,
            frame_sample_timeout_secs: 300,
            max_concurrent_subprocesses: 2,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Name (or path) of the local speech-recognition binary.
    pub binary: String,
    /// Model name passed through to the binary, if it supports model selection.
    pub model: String,
    /// Duration in seconds for splitting long audio files before transcribing.
    pub chunk_duration_seconds: u32,
    /// Maximum media duration to process (in seconds).
    pub max_duration_seconds: u32,
    /// Maximum concurrent chunk transcriptions.
    pub max_concurrent_chunks: usize,
    /// Timeout in seconds for a single transcription invocation.
    pub timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            binary: "whisper-cli".to_string(),
            model: "base".to_string(),
            chunk_duration_seconds: 120,
            max_duration_seconds: 7200,
            max_concurrent_chunks: 3,
            timeout_secs: 600,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Batch size for embedding requests.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 100,
        }
    }
}

/// Content chunking settings (spec 4.4: char-based, sentence-aligned, overlapping).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk size, in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in characters.
    pub overlap_size: usize,
    /// Preserve segment timestamps on chunks.
    pub preserve_timestamps: bool,
    /// Back off to the nearest sentence terminator within the chunk's last 25%.
    pub sentence_break: bool,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            overlap_size: 80,
            preserve_timestamps: true,
            sentence_break: true,
        }
    }
}

/// Store (database) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the SQLite database file.
    pub db_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: "~/.spiralmem/spiralmem.db".to_string(),
        }
    }
}

/// Search settings, including the hybrid-search default weights.
///
/// The source material used two different defaults for hybrid weighting (one path
/// defaulted to keyword-only, another to 0.3/0.7); we expose both weights and default
/// to 0.3 vector / 0.7 keyword, documented here per the spec's open question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Default result limit when a command doesn't specify one.
    pub default_limit: usize,
    /// Minimum cosine similarity for vector-only search.
    pub vector_similarity_threshold: f32,
    /// Minimum combined score for hybrid search.
    pub hybrid_similarity_threshold: f32,
    /// Weight given to the vector score in hybrid search.
    pub vector_weight: f32,
    /// Weight given to the keyword score in hybrid search.
    pub keyword_weight: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            vector_similarity_threshold: 0.7,
            hybrid_similarity_threshold: 0.6,
            vector_weight: 0.3,
            keyword_weight: 0.7,
        }
    }
}

/// Pipeline (video-ingestion state machine) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Per batch-item timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Retry attempts for a batch item before giving up.
    pub retry_attempts: u32,
    /// Fixed delay between retries, in milliseconds.
    pub retry_delay_ms: u64,
    /// Job heap watermark in bytes before a GC-hint cooldown is applied.
    pub memory_watermark_bytes: u64,
    /// Video-file extensions accepted by the validation step.
    pub allowed_video_extensions: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5 * 60 * 1000,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            memory_watermark_bytes: 1024 * 1024 * 1024,
            allowed_video_extensions: [
                "mp4", "avi", "mov", "mkv", "webm", "flv", "wmv", "m4v",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Channel orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    /// Default batch size for dispatch.
    pub batch_size: usize,
    /// Default number of jobs processed concurrently within a batch.
    pub concurrent_processing: usize,
    /// Shorts below this duration (seconds) are dropped unless `include_shorts` is set.
    pub shorts_threshold_secs: u32,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            concurrent_processing: 2,
            shorts_threshold_secs: 60,
        }
    }
}

/// Platform (YouTube, etc.) settings and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlatformSettings {
    /// Name (or path) of the platform downloader binary (yt-dlp compatible).
    pub downloader_binary: Option<String>,
    /// Per-platform API keys, read from `SPIRALMEM_<PLATFORM>_API_KEY` env vars if unset here.
    pub api_keys: HashMap<String, String>,
    /// Default max resolution (height) for YouTube URL downloads.
    pub youtube_max_height: u32,
    /// Default max download size, in bytes.
    pub youtube_max_bytes: u64,
    /// Default max download duration, in seconds.
    pub youtube_max_duration_secs: u32,
}

impl PlatformSettings {
    /// Look up an API key for a platform, checking settings first then the environment.
    pub fn api_key(&self, platform: &str) -> Option<String> {
        if let Some(key) = self.api_keys.get(platform) {
            return Some(key.clone());
        }
        std::env::var(format!("SPIRALMEM_{}_API_KEY", platform.to_uppercase())).ok()
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SpiralmemError::System(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spiralmem")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded database path.
    pub fn db_path(&self) -> PathBuf {
        Self::expand_path(&self.store.db_path)
    }

    /// Audio artifact directory, under the data directory.
    pub fn audio_dir(&self) -> PathBuf {
        self.data_dir().join("audio")
    }

    /// Transcript artifact directory, under the data directory.
    pub fn transcripts_dir(&self) -> PathBuf {
        self.data_dir().join("transcripts")
    }

    /// Frame artifact directory, under the data directory.
    pub fn frames_dir(&self) -> PathBuf {
        self.data_dir().join("frames")
    }

    /// Thumbnail artifact directory, under the data directory.
    pub fn thumbnails_dir(&self) -> PathBuf {
        self.data_dir().join("thumbnails")
    }

    /// Create all sibling artifact directories plus the data and temp dirs.
    pub fn ensure_directories(&self) -> crate::error::Result<()> {
        for dir in [
            self.data_dir(),
            self.temp_dir(),
            self.audio_dir(),
            self.transcripts_dir(),
            self.frames_dir(),
            self.thumbnails_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_roundtrip_toml() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.chunking.chunk_size, settings.chunking.chunk_size);
    }

    #[test]
    fn test_hybrid_weight_defaults() {
        let s = SearchSettings::default();
        assert!((s.vector_weight - 0.3).abs() < f32::EPSILON);
        assert!((s.keyword_weight - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_platform_api_key_falls_back_to_env() {
        std::env::set_var("SPIRALMEM_YOUTUBE_API_KEY", "test-key");
        let settings = PlatformSettings::default();
        assert_eq!(settings.api_key("youtube"), Some("test-key".to_string()));
        std::env::remove_var("SPIRALMEM_YOUTUBE_API_KEY");
    }
}
