//! `extractFrames(input, opts)` / `generateThumbnail(input, opts)`: frame sampling via `ffmpeg`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SpiralmemError};

use super::probe::probe;
use super::process::{require_success, run_tool};

const FRAME_SAMPLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMethod {
    Uniform,
    Keyframes,
    SceneChange,
    QualityBased,
}

#[derive(Debug, Clone)]
pub struct ExtractFramesOptions {
    pub method: SamplingMethod,
    pub frame_count: u32,
    pub start_time_sec: f64,
    pub end_time_sec: Option<f64>,
    pub scene_threshold: f64,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub jpeg_quality: u8,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FrameInfo {
    pub filename: String,
    pub filepath: String,
    pub timestamp_sec: f64,
    pub frame_number: u32,
    pub is_keyframe: Option<bool>,
    pub scene_score: Option<f64>,
    pub quality_score: Option<f64>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
}

fn scale_filter(opts: &ExtractFramesOptions) -> Option<String> {
    match (opts.max_width, opts.max_height) {
        (Some(w), Some(h)) => Some(format!("scale='min({w},iw)':'min({h},ih)':force_original_aspect_ratio=decrease")),
        (Some(w), None) => Some(format!("scale={w}:-1")),
        (None, Some(h)) => Some(format!("scale=-1:{h}")),
        (None, None) => None,
    }
}

/// Extract a single frame at `timestamp_sec`, returning its on-disk path and dimensions.
async fn extract_single_frame(
    ffmpeg_binary: &str,
    input: &str,
    timestamp_sec: f64,
    frame_number: u32,
    opts: &ExtractFramesOptions,
    filename_prefix: &str,
) -> Result<(PathBuf, u32, u32, u64)> {
    std::fs::create_dir_all(&opts.output_dir)?;
    let filename = format!("{filename_prefix}-{frame_number:05}.jpg");
    let output_path = opts.output_dir.join(&filename);
    let output_path_str = output_path.to_string_lossy().to_string();
    let timestamp_str = format!("{timestamp_sec:.3}");
    let quality_str = (31 - (opts.jpeg_quality as i32 * 30 / 100)).clamp(2, 31).to_string();
    let scale = scale_filter(opts);

    let mut args: Vec<&str> = vec!["-y", "-ss", &timestamp_str, "-i", input, "-frames:v", "1", "-q:v", &quality_str];
    if let Some(scale) = &scale {
        args.push("-vf");
        args.push(scale);
    }
    args.push(&output_path_str);

    let output = run_tool(ffmpeg_binary, &args, FRAME_SAMPLE_TIMEOUT).await?;
    require_success(ffmpeg_binary, output)?;

    let meta = std::fs::metadata(&output_path)?;
    // Dimensions aren't re-probed per frame; callers that need exact values
    // can probe the output file. We report the requested cap as a proxy.
    let width = opts.max_width.unwrap_or(0);
    let height = opts.max_height.unwrap_or(0);
    Ok((output_path, width, height, meta.len()))
}

fn uniform_timestamps(opts: &ExtractFramesOptions, duration_sec: f64) -> Vec<f64> {
    let end = opts.end_time_sec.unwrap_or(duration_sec).min(duration_sec);
    let span = (end - opts.start_time_sec).max(0.0);
    if opts.frame_count == 0 || span <= 0.0 {
        return Vec::new();
    }
    let interval = span / opts.frame_count as f64;
    (0..opts.frame_count)
        .map(|i| opts.start_time_sec + interval * i as f64)
        .collect()
}

/// Pick up to `count` entries from a sorted slice, spread evenly across it.
fn sample_evenly(values: &[f64], count: usize) -> Vec<f64> {
    if count == 0 || values.is_empty() {
        return Vec::new();
    }
    if values.len() <= count {
        return values.to_vec();
    }
    let step = values.len() as f64 / count as f64;
    (0..count).map(|i| values[((i as f64 * step) as usize).min(values.len() - 1)]).collect()
}

/// List actual keyframe (IDR/I-frame) timestamps via `ffprobe -skip_frame nokey`,
/// so keyframe sampling lands on real cut points instead of an arbitrary grid.
async fn probe_keyframe_timestamps(ffprobe_binary: &str, input: &str) -> Result<Vec<f64>> {
    let output = run_tool(
        ffprobe_binary,
        &[
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-skip_frame",
            "nokey",
            "-show_entries",
            "frame=pkt_pts_time",
            "-of",
            "csv=p=0",
            input,
        ],
        FRAME_SAMPLE_TIMEOUT,
    )
    .await?;
    let output = require_success(ffprobe_binary, output)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().filter_map(|line| line.trim().parse::<f64>().ok()).collect())
}

/// Detect scene-change timestamps with ffmpeg's `select` filter thresholded by
/// `scene_threshold`, reading each selected frame's `pts_time`/`lavfi.scene_score`
/// out of `metadata=print:file=-`'s stdout dump.
async fn scene_change_timestamps(ffmpeg_binary: &str, input: &str, scene_threshold: f64) -> Result<Vec<(f64, f64)>> {
    let filter = format!("select='gt(scene,{scene_threshold})',metadata=print:file=-");
    let output = run_tool(ffmpeg_binary, &["-i", input, "-vf", &filter, "-f", "null", "-"], FRAME_SAMPLE_TIMEOUT).await?;
    let output = require_success(ffmpeg_binary, output)?;
    Ok(parse_scene_metadata(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_scene_metadata(raw: &str) -> Vec<(f64, f64)> {
    let mut results = Vec::new();
    let mut pending_pts: Option<f64> = None;
    for line in raw.lines() {
        if let Some(rest) = line.split("pts_time:").nth(1) {
            pending_pts = rest.split_whitespace().next().and_then(|s| s.parse().ok());
        } else if let Some(rest) = line.split("lavfi.scene_score=").nth(1) {
            if let (Some(pts), Ok(score)) = (pending_pts, rest.trim().parse::<f64>()) {
                results.push((pts, score));
                pending_pts = None;
            }
        }
    }
    results
}

/// A timestamp to sample plus whatever the sampling method already knows about it.
struct Candidate {
    ts: f64,
    is_keyframe: Option<bool>,
    scene_score: Option<f64>,
}

pub async fn extract_frames(
    ffmpeg_binary: &str,
    ffprobe_binary: &str,
    input: &str,
    opts: &ExtractFramesOptions,
) -> Result<Vec<FrameInfo>> {
    let probed = probe(ffprobe_binary, input).await?;
    let window_end = opts.end_time_sec.unwrap_or(probed.duration_sec).min(probed.duration_sec);

    let candidates: Vec<Candidate> = match opts.method {
        SamplingMethod::Uniform => uniform_timestamps(opts, probed.duration_sec)
            .into_iter()
            .map(|ts| Candidate { ts, is_keyframe: None, scene_score: None })
            .collect(),
        SamplingMethod::Keyframes => {
            let mut keyframes = probe_keyframe_timestamps(ffprobe_binary, input).await?;
            keyframes.retain(|ts| *ts >= opts.start_time_sec && *ts <= window_end);
            if keyframes.is_empty() {
                uniform_timestamps(opts, probed.duration_sec)
                    .into_iter()
                    .map(|ts| Candidate { ts, is_keyframe: Some(false), scene_score: None })
                    .collect()
            } else {
                sample_evenly(&keyframes, opts.frame_count as usize)
                    .into_iter()
                    .map(|ts| Candidate { ts, is_keyframe: Some(true), scene_score: None })
                    .collect()
            }
        }
        SamplingMethod::SceneChange => {
            let mut detected = scene_change_timestamps(ffmpeg_binary, input, opts.scene_threshold).await?;
            detected.retain(|(ts, _)| *ts >= opts.start_time_sec && *ts <= window_end);
            if detected.is_empty() {
                uniform_timestamps(opts, probed.duration_sec)
                    .into_iter()
                    .map(|ts| Candidate { ts, is_keyframe: None, scene_score: None })
                    .collect()
            } else {
                detected.truncate(opts.frame_count as usize);
                detected.into_iter().map(|(ts, score)| Candidate { ts, is_keyframe: None, scene_score: Some(score) }).collect()
            }
        }
        SamplingMethod::QualityBased => {
            let mut wide = opts.clone();
            wide.frame_count = opts.frame_count.saturating_mul(3);
            uniform_timestamps(&wide, probed.duration_sec)
                .into_iter()
                .map(|ts| Candidate { ts, is_keyframe: None, scene_score: None })
                .collect()
        }
    };

    if candidates.is_empty() {
        return Err(SpiralmemError::Validation(
            "no frame timestamps in requested window".to_string(),
        ));
    }

    let mut frames = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let (path, width, height, size) =
            extract_single_frame(ffmpeg_binary, input, candidate.ts, i as u32, opts, "frame").await?;
        frames.push(FrameInfo {
            filename: path.file_name().unwrap_or_default().to_string_lossy().to_string(),
            filepath: path.to_string_lossy().to_string(),
            timestamp_sec: candidate.ts,
            frame_number: i as u32,
            is_keyframe: candidate.is_keyframe,
            scene_score: candidate.scene_score,
            quality_score: matches!(opts.method, SamplingMethod::QualityBased).then_some(size as f64),
            width,
            height,
            file_size: size,
        });
    }

    if opts.method == SamplingMethod::QualityBased {
        frames.sort_by(|a, b| b.file_size.cmp(&a.file_size));
        frames.truncate(opts.frame_count as usize);
        for (i, frame) in frames.iter_mut().enumerate() {
            frame.frame_number = i as u32;
        }
    }

    Ok(frames)
}

#[derive(Debug, Clone, Copy)]
pub enum ThumbnailPosition {
    Start,
    Middle,
    End,
    BestQuality,
}

pub struct GenerateThumbnailOptions {
    pub explicit_timestamp_sec: Option<f64>,
    pub position: ThumbnailPosition,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub jpeg_quality: u8,
    pub output_dir: PathBuf,
}

fn resolve_thumbnail_timestamp(opts: &GenerateThumbnailOptions, duration_sec: f64) -> f64 {
    if let Some(explicit) = opts.explicit_timestamp_sec {
        return explicit;
    }
    match opts.position {
        ThumbnailPosition::Start => (10.0_f64).min(duration_sec * 0.1),
        ThumbnailPosition::Middle => duration_sec / 2.0,
        ThumbnailPosition::End => (duration_sec - 10.0).max(0.0),
        ThumbnailPosition::BestQuality => duration_sec / 2.0,
    }
}

pub async fn generate_thumbnail(
    ffmpeg_binary: &str,
    ffprobe_binary: &str,
    input: &str,
    opts: &GenerateThumbnailOptions,
) -> Result<FrameInfo> {
    let probed = probe(ffprobe_binary, input).await?;
    let timestamp = resolve_thumbnail_timestamp(opts, probed.duration_sec);

    let frame_opts = ExtractFramesOptions {
        method: SamplingMethod::Uniform,
        frame_count: 1,
        start_time_sec: timestamp,
        end_time_sec: Some(timestamp),
        scene_threshold: 0.0,
        max_width: opts.max_width,
        max_height: opts.max_height,
        jpeg_quality: opts.jpeg_quality,
        output_dir: opts.output_dir.clone(),
    };
    let (path, width, height, size) =
        extract_single_frame(ffmpeg_binary, input, timestamp, 0, &frame_opts, "thumbnail").await?;

    Ok(FrameInfo {
        filename: path.file_name().unwrap_or_default().to_string_lossy().to_string(),
        filepath: path.to_string_lossy().to_string(),
        timestamp_sec: timestamp,
        frame_number: 0,
        is_keyframe: None,
        scene_score: None,
        quality_score: None,
        width,
        height,
        file_size: size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_opts(output_dir: PathBuf) -> ExtractFramesOptions {
        ExtractFramesOptions {
            method: SamplingMethod::Uniform,
            frame_count: 4,
            start_time_sec: 0.0,
            end_time_sec: None,
            scene_threshold: 0.3,
            max_width: Some(640),
            max_height: None,
            jpeg_quality: 80,
            output_dir,
        }
    }

    #[test]
    fn test_uniform_timestamps_even_spacing() {
        let opts = base_opts(PathBuf::from("/tmp"));
        let ts = uniform_timestamps(&opts, 40.0);
        assert_eq!(ts.len(), 4);
        assert_eq!(ts[0], 0.0);
        assert_eq!(ts[1], 10.0);
    }

    #[test]
    fn test_uniform_timestamps_empty_on_zero_span() {
        let mut opts = base_opts(PathBuf::from("/tmp"));
        opts.start_time_sec = 10.0;
        opts.end_time_sec = Some(10.0);
        assert!(uniform_timestamps(&opts, 40.0).is_empty());
    }

    #[test]
    fn test_thumbnail_position_start_caps_at_ten_percent() {
        let opts = GenerateThumbnailOptions {
            explicit_timestamp_sec: None,
            position: ThumbnailPosition::Start,
            max_width: None,
            max_height: None,
            jpeg_quality: 80,
            output_dir: PathBuf::from("/tmp"),
        };
        assert_eq!(resolve_thumbnail_timestamp(&opts, 50.0), 5.0);
        assert_eq!(resolve_thumbnail_timestamp(&opts, 500.0), 10.0);
    }

    #[test]
    fn test_sample_evenly_spreads_across_range() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let sampled = sample_evenly(&values, 5);
        assert_eq!(sampled.len(), 5);
        assert_eq!(sampled[0], 0.0);
        assert!(sampled.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_sample_evenly_returns_all_when_fewer_than_count() {
        let values = vec![1.0, 2.0, 3.0];
        assert_eq!(sample_evenly(&values, 10), values);
    }

    #[test]
    fn test_parse_scene_metadata_pairs_pts_with_score() {
        let raw = "frame:12 pts:34560 pts_time:12.34\nlavfi.scene_score=0.512345\nframe:40 pts:50000 pts_time:20.0\nlavfi.scene_score=0.61\n";
        let parsed = parse_scene_metadata(raw);
        assert_eq!(parsed.len(), 2);
        assert!((parsed[0].0 - 12.34).abs() < 1e-6);
        assert!((parsed[0].1 - 0.512345).abs() < 1e-6);
        assert!((parsed[1].0 - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_explicit_timestamp_wins() {
        let opts = GenerateThumbnailOptions {
            explicit_timestamp_sec: Some(42.0),
            position: ThumbnailPosition::Middle,
            max_width: None,
            max_height: None,
            jpeg_quality: 80,
            output_dir: PathBuf::from("/tmp"),
        };
        assert_eq!(resolve_thumbnail_timestamp(&opts, 100.0), 42.0);
    }
}
