//! Data models for transcription, matching the transcriber adapter contract.

use serde::{Deserialize, Serialize};

/// A single transcribed word with millisecond timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub confidence: Option<f32>,
}

/// A transcript segment; word-level timestamps may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub confidence: Option<f32>,
    pub words: Option<Vec<Word>>,
}

impl TranscriptSegment {
    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

/// Options controlling a single `transcribe` invocation.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    pub language: Option<String>,
    pub model: Option<String>,
    pub output_directory: std::path::PathBuf,
}

/// Result of transcribing one audio file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeResult {
    pub success: bool,
    pub text: String,
    pub language: Option<String>,
    pub duration_sec: f64,
    pub average_confidence: Option<f32>,
    pub segments: Vec<TranscriptSegment>,
    pub output_file_path: String,
}

impl TranscribeResult {
    pub fn text_between(&self, start: f64, end: f64) -> String {
        self.segments
            .iter()
            .filter(|s| s.start_sec >= start && s.end_sec <= end)
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Format seconds as MM:SS or HH:MM:SS, used by CLI display.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_under_an_hour() {
        assert_eq!(format_timestamp(65.0), "01:05");
    }

    #[test]
    fn test_format_timestamp_over_an_hour() {
        assert_eq!(format_timestamp(3665.0), "01:01:05");
    }

    #[test]
    fn test_text_between_filters_by_window() {
        let result = TranscribeResult {
            success: true,
            text: "First Second Third".into(),
            language: None,
            duration_sec: 15.0,
            average_confidence: None,
            segments: vec![
                TranscriptSegment {
                    text: "First".into(),
                    start_sec: 0.0,
                    end_sec: 5.0,
                    confidence: None,
                    words: None,
                },
                TranscriptSegment {
                    text: "Second".into(),
                    start_sec: 5.0,
                    end_sec: 10.0,
                    confidence: None,
                    words: None,
                },
            ],
            output_file_path: String::new(),
        };
        assert_eq!(result.text_between(5.0, 10.0), "Second");
    }
}
