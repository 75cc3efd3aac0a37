//! Transcription: turns an extracted audio file into timestamped text via a
//! configured local speech-recognition binary.

mod format;
mod local;
mod models;

pub use format::{format_transcript, OutputFormat, SegmentExport, TranscriptExport};
pub use local::LocalTranscriber;
pub use models::{format_timestamp, TranscribeOptions, TranscribeResult, TranscriptSegment, Word};

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// Adapter contract for transcribing one audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path, opts: &TranscribeOptions) -> Result<TranscribeResult>;
}
