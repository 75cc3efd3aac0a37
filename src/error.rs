//! Error types for spiralmem.

use thiserror::Error;

/// Library-level error type for spiralmem operations.
#[derive(Error, Debug)]
pub enum SpiralmemError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Media tool '{tool}' {}: {stderr_tail}", if *timed_out { "timed out" } else { "failed" })]
    MediaTool {
        tool: String,
        exit_code: Option<i32>,
        stderr_tail: String,
        timed_out: bool,
    },

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Platform quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Unsupported platform for url: {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("System error: {0}")]
    System(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

impl SpiralmemError {
    /// Build a `MediaTool` error from a subprocess name and captured stderr.
    pub fn media_tool(tool: impl Into<String>, exit_code: Option<i32>, stderr: &str) -> Self {
        Self::MediaTool {
            tool: tool.into(),
            exit_code,
            stderr_tail: tail(stderr, 2000),
            timed_out: false,
        }
    }

    /// Build a `MediaTool` timeout error.
    pub fn media_timeout(tool: impl Into<String>) -> Self {
        Self::MediaTool {
            tool: tool.into(),
            exit_code: None,
            stderr_tail: String::new(),
            timed_out: true,
        }
    }
}

/// Truncate a string to its last `max_len` bytes on a char boundary, for safe user display.
fn tail(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut start = s.len() - max_len;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &s[start..])
}

/// Result type alias for spiralmem operations.
pub type Result<T> = std::result::Result<T, SpiralmemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_truncates_on_boundary() {
        let long = "a".repeat(3000);
        let t = tail(&long, 2000);
        assert!(t.starts_with("..."));
        assert_eq!(t.len(), 2003);
    }

    #[test]
    fn test_media_tool_display() {
        let e = SpiralmemError::media_timeout("ffprobe");
        assert!(format!("{}", e).contains("timed out"));
    }
}
