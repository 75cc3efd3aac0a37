//! `probe(path)`: structured `ffprobe` metadata plus a deterministic quality tier.
//!
//! Grounded on `vmatresu-viralclipai/backend/crates/vclip-media/src/probe.rs`'s
//! `ffprobe -print_format json` parsing shape.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::Result;

use super::process::{require_success, run_tool};

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VideoStreamInfo {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AudioStreamInfo {
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    pub bitrate: Option<u64>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MediaTags {
    pub creation_time: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ProbeResult {
    pub duration_sec: f64,
    pub format: String,
    pub size: u64,
    pub bitrate: Option<u64>,
    pub video_stream: Option<VideoStreamInfo>,
    pub audio_stream: Option<AudioStreamInfo>,
    pub chapters: Vec<Json>,
    pub tags: MediaTags,
    pub estimated_quality: Quality,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
    chapters: Option<Vec<Json>>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
    format_name: Option<String>,
    tags: Option<Json>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    bit_rate: Option<String>,
}

/// Parse an `ffprobe` `"num/den"` or plain-float frame-rate string.
pub fn parse_frame_rate(s: &str) -> f64 {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().unwrap_or(0.0);
        let den: f64 = den.parse().unwrap_or(1.0);
        if den == 0.0 {
            0.0
        } else {
            num / den
        }
    } else {
        s.parse().unwrap_or(0.0)
    }
}

fn quality_tier(height: u32, bits_per_pixel: f64) -> Quality {
    if height >= 2160 {
        if bits_per_pixel > 0.1 {
            Quality::VeryHigh
        } else {
            Quality::High
        }
    } else if height >= 1080 {
        if bits_per_pixel > 0.05 {
            Quality::High
        } else {
            Quality::Medium
        }
    } else if height >= 720 {
        if bits_per_pixel > 0.03 {
            Quality::Medium
        } else {
            Quality::Low
        }
    } else if bits_per_pixel > 0.02 {
        Quality::Medium
    } else {
        Quality::Low
    }
}

fn bits_per_pixel(bitrate: Option<u64>, width: u32, height: u32, fps: f64) -> f64 {
    match bitrate {
        Some(bitrate) if width > 0 && height > 0 && fps > 0.0 => {
            bitrate as f64 / (width as f64 * height as f64 * fps)
        }
        _ => 0.0,
    }
}

/// Probe a media file with `ffprobe`, returning structured metadata and a
/// deterministic quality tier derived from resolution and bits-per-pixel.
pub async fn probe(ffprobe_binary: &str, path: &str) -> Result<ProbeResult> {
    let output = run_tool(
        ffprobe_binary,
        &[
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            "-show_chapters",
            path,
        ],
        PROBE_TIMEOUT,
    )
    .await?;
    let output = require_success(ffprobe_binary, output)?;

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let duration_sec: f64 = parsed
        .format
        .duration
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0);
    let size: u64 = parsed.format.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0);
    let bitrate: Option<u64> = parsed.format.bit_rate.as_deref().and_then(|s| s.parse().ok());

    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .map(|s| {
            let fps = s
                .avg_frame_rate
                .as_deref()
                .or(s.r_frame_rate.as_deref())
                .map(parse_frame_rate)
                .unwrap_or(0.0);
            VideoStreamInfo {
                codec: s.codec_name.clone().unwrap_or_default(),
                width: s.width.unwrap_or(0),
                height: s.height.unwrap_or(0),
                fps,
            }
        });

    let audio_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|s| AudioStreamInfo {
            codec: s.codec_name.clone().unwrap_or_default(),
            sample_rate: s.sample_rate.as_deref().and_then(|s| s.parse().ok()),
            channels: s.channels,
            bitrate: s.bit_rate.as_deref().and_then(|s| s.parse().ok()),
        });

    let tags = parsed
        .format
        .tags
        .as_ref()
        .map(|tags| MediaTags {
            creation_time: tags.get("creation_time").and_then(|v| v.as_str()).map(String::from),
            title: tags.get("title").and_then(|v| v.as_str()).map(String::from),
            artist: tags.get("artist").and_then(|v| v.as_str()).map(String::from),
            album: tags.get("album").and_then(|v| v.as_str()).map(String::from),
            comment: tags.get("comment").and_then(|v| v.as_str()).map(String::from),
        })
        .unwrap_or_default();

    let quality = match &video_stream {
        Some(v) => quality_tier(v.height, bits_per_pixel(bitrate, v.width, v.height, v.fps)),
        None => Quality::Low,
    };

    Ok(ProbeResult {
        duration_sec,
        format: parsed.format.format_name.unwrap_or_default(),
        size,
        bitrate,
        video_stream,
        audio_stream,
        chapters: parsed.chapters.unwrap_or_default(),
        tags,
        estimated_quality: quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate_fraction() {
        assert!((parse_frame_rate("30000/1001") - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_frame_rate_plain() {
        assert_eq!(parse_frame_rate("25"), 25.0);
    }

    #[test]
    fn test_quality_tier_4k_high_bitrate() {
        assert_eq!(quality_tier(2160, 0.15), Quality::VeryHigh);
    }

    #[test]
    fn test_quality_tier_720p_low_bitrate() {
        assert_eq!(quality_tier(720, 0.01), Quality::Low);
    }

    #[test]
    fn test_bits_per_pixel_zero_without_video_dims() {
        assert_eq!(bits_per_pixel(Some(1000), 0, 0, 30.0), 0.0);
    }
}
