//! Channel orchestrator (spec 4.8): discover, filter, sort, and dispatch a
//! channel's videos through the pipeline in concurrency-bounded batches.
//!
//! Grounded on the teacher's `cli/commands/transcribe.rs::run_transcribe_playlist`
//! (list-then-loop shape over a platform source), rebuilt around a
//! `Semaphore`-bounded batch dispatcher per spec section 5 rather than the
//! teacher's strictly sequential loop.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::error::{Result, SpiralmemError};
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::platform::{self, ChannelVideoSummary, DownloadOptions};
use crate::store::SourceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityMode {
    NewestFirst,
    OldestFirst,
    MostPopular,
    LongestFirst,
}

#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub min_duration_sec: Option<f64>,
    pub max_duration_sec: Option<f64>,
    pub include_shorts: bool,
    pub include_live_streams: bool,
    pub keyword_filter: Option<Vec<String>>,
    pub exclude_keywords: Option<Vec<String>>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            min_duration_sec: None,
            max_duration_sec: None,
            include_shorts: false,
            include_live_streams: true,
            keyword_filter: None,
            exclude_keywords: None,
        }
    }
}

impl FilterOptions {
    /// True if `video` should be kept.
    pub fn keep(&self, video: &ChannelVideoSummary, shorts_threshold_secs: u32) -> bool {
        if let Some(duration) = video.duration_sec {
            if let Some(min) = self.min_duration_sec {
                if duration < min {
                    return false;
                }
            }
            if let Some(max) = self.max_duration_sec {
                if duration > max {
                    return false;
                }
            }
            if !self.include_shorts && duration < shorts_threshold_secs as f64 {
                return false;
            }
        } else if !self.include_shorts && video.is_short {
            return false;
        }

        if !self.include_live_streams && video.is_live {
            return false;
        }

        let title_lower = video.title.to_lowercase();
        if let Some(keywords) = &self.keyword_filter {
            if !keywords.is_empty() && !keywords.iter().any(|k| title_lower.contains(&k.to_lowercase())) {
                return false;
            }
        }
        if let Some(excludes) = &self.exclude_keywords {
            if excludes.iter().any(|k| title_lower.contains(&k.to_lowercase())) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct ChannelProcessingOptions {
    pub batch_size: usize,
    pub concurrent_processing: usize,
    pub enable_transcripts: bool,
    pub enable_frame_extraction: bool,
}

/// Per-video-download + pipeline-processing inputs, independent of the
/// discovery/filter/sort stages above.
pub struct ChannelOrchestratorOptions {
    pub max_videos: usize,
    pub filter: FilterOptions,
    pub processing: ChannelProcessingOptions,
    pub priority_mode: PriorityMode,
    pub space_id: String,
    pub downloader_binary: String,
    pub download_dir: PathBuf,
    pub pipeline_output_dir: PathBuf,
    pub shorts_threshold_secs: u32,
}

/// Aggregate progress, recomputed and emitted after every per-video outcome.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    pub total_to_process: usize,
    pub successfully_processed: usize,
    pub failed_processing: usize,
    pub overall_progress_pct: u8,
    pub estimated_time_remaining_ms: Option<u64>,
}

pub type ProgressCallback = Arc<dyn Fn(ChannelProgress) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct VideoProcessingOutcome {
    pub video: ChannelVideoSummary,
    pub memory_id: Option<String>,
    pub chunk_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub url: String,
    pub videos_discovered: usize,
}

pub struct ChannelResult {
    pub channel_info: ChannelInfo,
    pub discovery_results: Vec<ChannelVideoSummary>,
    pub processing_results: Vec<VideoProcessingOutcome>,
    /// No content-analysis engine is specified; always `None`, kept as a slot
    /// for a future analysis pass rather than dropped from the result shape.
    pub content_analysis: Option<serde_json::Value>,
    pub errors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Sorts `videos` in place by `mode`. Missing fields sort last within their tier.
fn sort_videos(videos: &mut [ChannelVideoSummary], mode: PriorityMode) {
    match mode {
        PriorityMode::NewestFirst => {
            videos.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        }
        PriorityMode::OldestFirst => {
            videos.sort_by(|a, b| a.upload_date.cmp(&b.upload_date));
        }
        PriorityMode::MostPopular => {
            videos.sort_by(|a, b| b.view_count.unwrap_or(0).cmp(&a.view_count.unwrap_or(0)));
        }
        PriorityMode::LongestFirst => {
            videos.sort_by(|a, b| {
                b.duration_sec
                    .unwrap_or(0.0)
                    .partial_cmp(&a.duration_sec.unwrap_or(0.0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }
}

/// Discovers, filters, sorts, and dispatches a channel's videos through the
/// pipeline, honoring `concurrent_processing` within each `batch_size` slice.
pub struct ChannelOrchestrator {
    pipeline: Arc<Pipeline>,
}

impl ChannelOrchestrator {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    #[instrument(skip(self, options, on_progress), fields(channel_url = %channel_url))]
    pub async fn process_channel(
        &self,
        channel_url: &str,
        options: ChannelOrchestratorOptions,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ChannelResult> {
        let mut discovered =
            platform::list_channel_videos(&options.downloader_binary, channel_url, options.max_videos).await?;
        let channel_info = ChannelInfo { url: channel_url.to_string(), videos_discovered: discovered.len() };

        let mut filtered: Vec<ChannelVideoSummary> = discovered
            .drain(..)
            .filter(|v| options.filter.keep(v, options.shorts_threshold_secs))
            .collect();
        sort_videos(&mut filtered, options.priority_mode);

        let total_to_process = filtered.len();
        let successfully_processed = Arc::new(AtomicUsize::new(0));
        let failed_processing = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        let mut results: Vec<VideoProcessingOutcome> = Vec::with_capacity(total_to_process);
        let mut errors: Vec<String> = Vec::new();
        let mut quota_exhausted = false;

        for batch in filtered.chunks(options.processing.batch_size.max(1)) {
            if quota_exhausted {
                break;
            }

            let semaphore = Arc::new(Semaphore::new(options.processing.concurrent_processing.max(1)));
            let mut handles = Vec::with_capacity(batch.len());

            for video in batch {
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
                let pipeline = self.pipeline.clone();
                let video = video.clone();
                let space_id = options.space_id.clone();
                let downloader_binary = options.downloader_binary.clone();
                let download_dir = options.download_dir.clone();
                let pipeline_output_dir = options.pipeline_output_dir.clone();
                let enable_transcripts = options.processing.enable_transcripts;
                let enable_frame_extraction = options.processing.enable_frame_extraction;

                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    process_one_video(
                        &pipeline,
                        &video,
                        &space_id,
                        &downloader_binary,
                        &download_dir,
                        &pipeline_output_dir,
                        enable_transcripts,
                        enable_frame_extraction,
                    )
                    .await
                }));
            }

            for handle in handles {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(join_err) => VideoProcessingOutcome {
                        video: ChannelVideoSummary {
                            video_id: String::new(),
                            url: String::new(),
                            title: "unknown".into(),
                            duration_sec: None,
                            upload_date: None,
                            is_short: false,
                            is_live: false,
                            view_count: None,
                        },
                        memory_id: None,
                        chunk_count: 0,
                        error: Some(format!("processing task panicked: {join_err}")),
                    },
                };

                match &outcome.error {
                    None => {
                        successfully_processed.fetch_add(1, Ordering::Relaxed);
                    }
                    Some(message) => {
                        warn!(video_url = %outcome.video.url, error = %message, "channel video processing failed");
                        failed_processing.fetch_add(1, Ordering::Relaxed);
                        errors.push(format!("{}: {}", outcome.video.url, message));
                        if message.contains("quota") || message.to_lowercase().contains("quota exceeded") {
                            quota_exhausted = true;
                        }
                    }
                }

                results.push(outcome);

                if let Some(callback) = &on_progress {
                    let processed = results.len();
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    let per_item_ms = if processed > 0 { elapsed_ms / processed as u64 } else { 0 };
                    let remaining = total_to_process.saturating_sub(processed);
                    callback(ChannelProgress {
                        total_to_process,
                        successfully_processed: successfully_processed.load(Ordering::Relaxed),
                        failed_processing: failed_processing.load(Ordering::Relaxed),
                        overall_progress_pct: if total_to_process == 0 {
                            100
                        } else {
                            ((processed * 100) / total_to_process) as u8
                        },
                        estimated_time_remaining_ms: Some(per_item_ms * remaining as u64),
                    });
                }
            }
        }

        let mut recommendations = Vec::new();
        if quota_exhausted {
            recommendations.push(
                "platform quota exhausted; remaining videos were not dispatched. Retry later or reduce maxVideos."
                    .to_string(),
            );
        }
        if total_to_process == 0 {
            recommendations.push("no videos matched the filter criteria".to_string());
        }

        Ok(ChannelResult {
            channel_info,
            discovery_results: filtered,
            processing_results: results,
            content_analysis: None,
            errors,
            recommendations,
        })
    }
}

async fn process_one_video(
    pipeline: &Pipeline,
    video: &ChannelVideoSummary,
    space_id: &str,
    downloader_binary: &str,
    download_dir: &PathBuf,
    pipeline_output_dir: &PathBuf,
    enable_transcripts: bool,
    enable_frame_extraction: bool,
) -> VideoProcessingOutcome {
    let download = platform::download_video(
        downloader_binary,
        &video.url,
        &DownloadOptions { output_dir: download_dir.clone(), ..Default::default() },
    )
    .await;

    let downloaded = match download {
        Ok(downloaded) => downloaded,
        Err(e) => {
            return VideoProcessingOutcome {
                video: video.clone(),
                memory_id: None,
                chunk_count: 0,
                error: Some(quota_aware_message(&e)),
            }
        }
    };

    let video_path = downloaded.path.to_string_lossy().to_string();
    let mut pipeline_options = PipelineOptions::new(pipeline_output_dir.clone(), &crate::config::ChunkingSettings::default());
    pipeline_options.enable_transcription = enable_transcripts;
    pipeline_options.enable_frame_sampling = enable_frame_extraction;
    pipeline_options.custom_title = Some(video.title.clone());

    match pipeline.process_video(&video_path, space_id, SourceType::Platform, pipeline_options).await {
        Ok(outcome) => VideoProcessingOutcome {
            video: video.clone(),
            memory_id: outcome.memory.map(|m| m.id),
            chunk_count: outcome.chunk_count,
            error: None,
        },
        Err(e) => {
            VideoProcessingOutcome { video: video.clone(), memory_id: None, chunk_count: 0, error: Some(quota_aware_message(&e)) }
        }
    }
}

fn quota_aware_message(error: &SpiralmemError) -> String {
    match error {
        SpiralmemError::QuotaExceeded(detail) => format!("quota exceeded: {detail}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(title: &str, duration_sec: Option<f64>, is_short: bool, is_live: bool, view_count: Option<u64>, upload_date: &str) -> ChannelVideoSummary {
        ChannelVideoSummary {
            video_id: title.to_string(),
            url: format!("https://example.com/{title}"),
            title: title.to_string(),
            duration_sec,
            upload_date: Some(upload_date.to_string()),
            is_short,
            is_live,
            view_count,
        }
    }

    #[test]
    fn test_filter_drops_shorts_by_default() {
        let filter = FilterOptions::default();
        let short = video("short", Some(30.0), true, false, None, "20260101");
        assert!(!filter.keep(&short, 60));
    }

    #[test]
    fn test_filter_keeps_shorts_when_included() {
        let filter = FilterOptions { include_shorts: true, ..FilterOptions::default() };
        let short = video("short", Some(30.0), true, false, None, "20260101");
        assert!(filter.keep(&short, 60));
    }

    #[test]
    fn test_filter_respects_duration_bounds() {
        let filter = FilterOptions { min_duration_sec: Some(120.0), max_duration_sec: Some(600.0), ..FilterOptions::default() };
        assert!(!filter.keep(&video("too short", Some(60.0), false, false, None, "20260101"), 60));
        assert!(!filter.keep(&video("too long", Some(900.0), false, false, None, "20260101"), 60));
        assert!(filter.keep(&video("just right", Some(300.0), false, false, None, "20260101"), 60));
    }

    #[test]
    fn test_filter_excludes_keyword_matches() {
        let filter = FilterOptions { exclude_keywords: Some(vec!["clip".into()]), ..FilterOptions::default() };
        assert!(!filter.keep(&video("funny clip compilation", Some(120.0), false, false, None, "20260101"), 60));
    }

    #[test]
    fn test_filter_drops_live_streams_when_excluded() {
        let filter = FilterOptions { include_live_streams: false, ..FilterOptions::default() };
        assert!(!filter.keep(&video("live now", Some(120.0), false, true, None, "20260101"), 60));
    }

    #[test]
    fn test_sort_most_popular_orders_by_views_desc() {
        let mut videos = vec![
            video("a", Some(100.0), false, false, Some(10), "20260101"),
            video("b", Some(100.0), false, false, Some(1000), "20260101"),
            video("c", Some(100.0), false, false, Some(500), "20260101"),
        ];
        sort_videos(&mut videos, PriorityMode::MostPopular);
        assert_eq!(videos.iter().map(|v| v.title.as_str()).collect::<Vec<_>>(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_longest_first_orders_by_duration_desc() {
        let mut videos = vec![
            video("short", Some(60.0), false, false, None, "20260101"),
            video("long", Some(3600.0), false, false, None, "20260101"),
        ];
        sort_videos(&mut videos, PriorityMode::LongestFirst);
        assert_eq!(videos[0].title, "long");
    }

    #[test]
    fn test_sort_newest_first_orders_by_upload_date_desc() {
        let mut videos = vec![video("old", Some(10.0), false, false, None, "20200101"), video("new", Some(10.0), false, false, None, "20260101")];
        sort_videos(&mut videos, PriorityMode::NewestFirst);
        assert_eq!(videos[0].title, "new");
    }
}
