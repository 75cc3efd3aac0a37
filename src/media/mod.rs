//! Media adapters: strongly-typed wrappers around `ffmpeg`/`ffprobe`, each
//! spawned with an argument vector, a per-invocation timeout, and
//! process-group kill on expiry. Grounded on the teacher's
//! `audio/downloader.rs` subprocess idiom.

mod audio;
mod frames;
mod probe;
mod process;

pub use audio::{extract_audio, AudioFormat, ExtractAudioOptions, ExtractAudioResult};
pub use frames::{
    extract_frames, generate_thumbnail, ExtractFramesOptions, FrameInfo, GenerateThumbnailOptions,
    SamplingMethod, ThumbnailPosition,
};
pub use probe::{probe, ProbeResult, Quality};
pub use process::{require_success, run_tool, ToolOutput};

use crate::config::MediaSettings;
use crate::error::Result;

/// Binds the media operations to a configured pair of binaries.
#[derive(Clone)]
pub struct MediaAdapter {
    ffmpeg_binary: String,
    ffprobe_binary: String,
}

impl MediaAdapter {
    pub fn new(settings: &MediaSettings) -> Self {
        Self {
            ffmpeg_binary: settings.ffmpeg_binary.clone(),
            ffprobe_binary: settings.ffprobe_binary.clone(),
        }
    }

    pub async fn probe(&self, path: &str) -> Result<ProbeResult> {
        probe(&self.ffprobe_binary, path).await
    }

    pub async fn extract_audio(&self, input: &str, opts: &ExtractAudioOptions) -> Result<ExtractAudioResult> {
        audio::extract_audio(&self.ffmpeg_binary, &self.ffprobe_binary, input, opts).await
    }

    pub async fn extract_frames(&self, input: &str, opts: &ExtractFramesOptions) -> Result<Vec<FrameInfo>> {
        frames::extract_frames(&self.ffmpeg_binary, &self.ffprobe_binary, input, opts).await
    }

    pub async fn generate_thumbnail(&self, input: &str, opts: &GenerateThumbnailOptions) -> Result<FrameInfo> {
        frames::generate_thumbnail(&self.ffmpeg_binary, &self.ffprobe_binary, input, opts).await
    }
}
