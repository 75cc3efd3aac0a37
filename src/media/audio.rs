//! `extractAudio(input, opts)`: transcription-optimal audio extraction via `ffmpeg`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

use super::probe::probe;
use super::process::{require_success, run_tool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    M4a,
}

impl AudioFormat {
    fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
        }
    }

    fn codec_args(&self) -> &'static [&'static str] {
        match self {
            AudioFormat::Wav => &["-c:a", "pcm_s16le"],
            AudioFormat::Mp3 => &["-c:a", "libmp3lame"],
            AudioFormat::Flac => &["-c:a", "flac"],
            AudioFormat::M4a => &["-c:a", "aac"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractAudioOptions {
    pub format: AudioFormat,
    pub sample_rate: u32,
    pub channels: u32,
    pub bitrate: Option<String>,
    pub normalize: bool,
    pub denoise: bool,
    pub output_dir: PathBuf,
    pub max_duration_sec: Option<f64>,
    pub keep_original_duration: bool,
}

impl ExtractAudioOptions {
    /// Transcription-optimal defaults: 16 kHz mono WAV, loudness-normalized, denoised.
    pub fn optimal(output_dir: PathBuf) -> Self {
        Self {
            format: AudioFormat::Wav,
            sample_rate: 16_000,
            channels: 1,
            bitrate: None,
            normalize: true,
            denoise: true,
            output_dir,
            max_duration_sec: None,
            keep_original_duration: false,
        }
    }

    /// Fast preset: same sample rate/channels, filters disabled.
    pub fn fast(output_dir: PathBuf) -> Self {
        Self {
            normalize: false,
            denoise: false,
            ..Self::optimal(output_dir)
        }
    }
}

pub struct ExtractAudioResult {
    pub output_path: PathBuf,
    pub duration_sec: f64,
    pub file_size: u64,
    pub sample_rate: u32,
    pub channels: u32,
    pub extraction_ms: u64,
}

fn timeout_for(target_duration: Option<f64>) -> Duration {
    let min_secs = 300.0;
    let scaled = target_duration.map(|d| d * 2.0).unwrap_or(min_secs);
    Duration::from_secs_f64(scaled.max(min_secs))
}

/// Pick a collision-free output path by appending a timestamp suffix when needed.
fn resolve_output_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let candidate = dir.join(format!("{stem}.{extension}"));
    if !candidate.exists() {
        return candidate;
    }
    let suffix = chrono::Utc::now().timestamp_millis();
    dir.join(format!("{stem}-{suffix}.{extension}"))
}

pub async fn extract_audio(
    ffmpeg_binary: &str,
    ffprobe_binary: &str,
    input: &str,
    opts: &ExtractAudioOptions,
) -> Result<ExtractAudioResult> {
    std::fs::create_dir_all(&opts.output_dir)?;
    let stem = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let output_path = resolve_output_path(&opts.output_dir, stem, opts.format.extension());

    let mut filters = Vec::new();
    if opts.denoise {
        filters.push("afftdn".to_string());
    }
    if opts.normalize {
        filters.push("loudnorm".to_string());
    }

    let sample_rate_str = opts.sample_rate.to_string();
    let channels_str = opts.channels.to_string();
    let output_path_str = output_path.to_string_lossy().to_string();
    let filter_chain = filters.join(",");
    let max_duration_str = opts.max_duration_sec.map(|d| d.to_string());

    let mut args: Vec<&str> = vec!["-y", "-i", input, "-vn", "-ar", &sample_rate_str, "-ac", &channels_str];
    args.extend(opts.format.codec_args());
    if let Some(bitrate) = &opts.bitrate {
        args.push("-b:a");
        args.push(bitrate);
    }
    if !filters.is_empty() {
        args.push("-af");
        args.push(&filter_chain);
    }
    if let Some(max_duration) = &max_duration_str {
        args.push("-t");
        args.push(max_duration);
    }
    args.push(&output_path_str);

    let started = std::time::Instant::now();
    let timeout = timeout_for(opts.max_duration_sec);
    let output = run_tool(ffmpeg_binary, &args, timeout).await?;
    require_success(ffmpeg_binary, output)?;
    let extraction_ms = started.elapsed().as_millis() as u64;

    let probed = probe(ffprobe_binary, &output_path_str).await?;
    let file_size = std::fs::metadata(&output_path)?.len();

    Ok(ExtractAudioResult {
        output_path,
        duration_sec: probed.duration_sec,
        file_size,
        sample_rate: opts.sample_rate,
        channels: opts.channels,
        extraction_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_for_respects_minimum() {
        assert_eq!(timeout_for(Some(10.0)), Duration::from_secs(300));
    }

    #[test]
    fn test_timeout_for_scales_with_target() {
        assert_eq!(timeout_for(Some(1000.0)), Duration::from_secs(2000));
    }

    #[test]
    fn test_resolve_output_path_avoids_collision() {
        let dir = std::env::temp_dir().join(format!("spiralmem-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let first = resolve_output_path(&dir, "clip", "wav");
        std::fs::write(&first, b"").unwrap();
        let second = resolve_output_path(&dir, "clip", "wav");
        assert_ne!(first, second);
        std::fs::remove_dir_all(&dir).ok();
    }
}
