//! Single-video and segment downloads via an external downloader binary
//! (`yt-dlp` by default), grounded on the teacher's `audio/downloader.rs`
//! subprocess-spawning idiom.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SpiralmemError};
use crate::media::{require_success, run_tool, ToolOutput};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(1800);

/// Markers that indicate the downloader hit a platform rate limit or quota
/// rather than an ordinary failure (private video, network hiccup, etc).
const QUOTA_MARKERS: &[&str] = &[
    "429",
    "too many requests",
    "quota",
    "rate limit",
    "rate-limited",
    "sign in to confirm",
];

fn classify_failure(binary: &str, output: ToolOutput) -> SpiralmemError {
    let stderr_lower = output.stderr.to_lowercase();
    if QUOTA_MARKERS.iter().any(|marker| stderr_lower.contains(marker)) {
        SpiralmemError::QuotaExceeded(output.stderr.lines().last().unwrap_or("rate limited").to_string())
    } else {
        require_success(binary, output).unwrap_err()
    }
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub max_height: u32,
    pub max_bytes: Option<u64>,
    pub max_duration_sec: Option<f64>,
    pub output_dir: PathBuf,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_height: 720,
            max_bytes: Some(500 * 1024 * 1024),
            max_duration_sec: Some(3600.0),
            output_dir: PathBuf::from("."),
        }
    }
}

pub struct DownloadedVideo {
    pub path: PathBuf,
    pub suggested_title: String,
    pub duration_sec: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
    filesize_approx: Option<u64>,
    #[serde(rename = "_filename")]
    filename: Option<String>,
    requested_downloads: Option<Vec<YtDlpRequestedDownload>>,
}

#[derive(Debug, Deserialize)]
struct YtDlpRequestedDownload {
    filepath: Option<String>,
}

/// Download a single video, bounded by height/size/duration, printing a JSON
/// info record we parse to recover the resolved file path and title.
pub async fn download_video(binary: &str, url: &str, opts: &DownloadOptions) -> Result<DownloadedVideo> {
    std::fs::create_dir_all(&opts.output_dir)?;
    let format = format!("bestvideo[height<={}]+bestaudio/best[height<={}]", opts.max_height, opts.max_height);
    let output_template = opts.output_dir.join("%(id)s.%(ext)s");
    let output_template_str = output_template.to_string_lossy().to_string();

    let mut args = vec![
        "-f",
        &format,
        "--merge-output-format",
        "mp4",
        "-o",
        &output_template_str,
        "--print-json",
        "--no-progress",
    ];
    let max_duration_str = opts.max_duration_sec.map(|d| format!("*{}", d as u64));
    if let Some(constraint) = &max_duration_str {
        args.push("--match-filter");
        args.push(constraint);
    }
    args.push(url);

    let output = run_tool(binary, &args, DOWNLOAD_TIMEOUT).await?;
    if !output.status_success {
        return Err(classify_failure(binary, output));
    }

    let info: YtDlpInfo = serde_json::from_slice(&output.stdout)
        .map_err(|e| SpiralmemError::Platform(format!("could not parse downloader output: {e}")))?;

    if let (Some(max_bytes), Some(size)) = (opts.max_bytes, info.filesize_approx) {
        if size > max_bytes {
            return Err(SpiralmemError::Platform(format!(
                "download exceeds max size ({size} > {max_bytes} bytes)"
            )));
        }
    }

    let path = info
        .requested_downloads
        .and_then(|mut d| d.pop())
        .and_then(|d| d.filepath)
        .or(info.filename)
        .map(PathBuf::from)
        .ok_or_else(|| SpiralmemError::Platform("downloader did not report an output path".to_string()))?;

    Ok(DownloadedVideo {
        suggested_title: info.title.unwrap_or_else(|| "untitled".to_string()),
        duration_sec: info.duration,
        path,
    })
}

pub struct SegmentRange {
    pub start_sec: f64,
    pub end_sec: f64,
}

pub struct SegmentDownloadResult {
    pub success: bool,
    pub file_path: Option<PathBuf>,
    pub duration_sec: Option<f64>,
    pub error: Option<String>,
}

pub struct DownloadSegmentsOptions {
    pub quality: String,
    pub format: String,
    pub output_dir: PathBuf,
}

/// Download just the requested time ranges of a single URL, one subprocess
/// invocation per segment so a single failing range doesn't abort the rest.
pub async fn download_segments(
    binary: &str,
    url: &str,
    ranges: &[SegmentRange],
    opts: &DownloadSegmentsOptions,
) -> Vec<SegmentDownloadResult> {
    std::fs::create_dir_all(&opts.output_dir).ok();
    let mut results = Vec::with_capacity(ranges.len());
    for (i, range) in ranges.iter().enumerate() {
        let section = format!("*{}-{}", range.start_sec, range.end_sec);
        let output_template = opts.output_dir.join(format!("segment-{i:03}.%(ext)s"));
        let output_template_str = output_template.to_string_lossy().to_string();
        let format_arg = format!("best[height<={}]", opts.quality);
        let args = vec![
            "--download-sections",
            &section,
            "-f",
            &format_arg,
            "-o",
            &output_template_str,
            "--no-progress",
            url,
        ];
        let outcome = match run_tool(binary, &args, DOWNLOAD_TIMEOUT).await {
            Ok(o) if o.status_success => Ok(o),
            Ok(o) => Err(classify_failure(binary, o)),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(_) => results.push(SegmentDownloadResult {
                success: true,
                file_path: Some(PathBuf::from(format!(
                    "{}/segment-{i:03}.{}",
                    opts.output_dir.display(),
                    opts.format
                ))),
                duration_sec: Some(range.end_sec - range.start_sec),
                error: None,
            }),
            Err(e) => results.push(SegmentDownloadResult {
                success: false,
                file_path: None,
                duration_sec: None,
                error: Some(e.to_string()),
            }),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_output(stderr: &str) -> ToolOutput {
        ToolOutput { stdout: Vec::new(), stderr: stderr.to_string(), status_success: false, exit_code: Some(1) }
    }

    #[test]
    fn test_classify_failure_recognizes_quota_markers() {
        let err = classify_failure("yt-dlp", failed_output("ERROR: HTTP Error 429: Too Many Requests"));
        assert!(matches!(err, SpiralmemError::QuotaExceeded(_)));
    }

    #[test]
    fn test_classify_failure_falls_back_to_media_tool_error() {
        let err = classify_failure("yt-dlp", failed_output("ERROR: Video unavailable"));
        assert!(matches!(err, SpiralmemError::MediaTool { .. }));
    }

    #[test]
    fn test_default_options_match_youtube_mode_limits() {
        let opts = DownloadOptions::default();
        assert_eq!(opts.max_height, 720);
        assert_eq!(opts.max_bytes, Some(500 * 1024 * 1024));
        assert_eq!(opts.max_duration_sec, Some(3600.0));
    }
}
