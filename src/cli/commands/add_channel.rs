//! `add-channel` command: discover, filter, sort, and dispatch a channel's
//! videos through the pipeline via [`crate::channel::ChannelOrchestrator`].

use std::sync::Arc;

use anyhow::Result;

use crate::channel::{
    ChannelOrchestrator, ChannelOrchestratorOptions, ChannelProcessingOptions, FilterOptions, PriorityMode,
};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;

use super::context;

#[allow(clippy::too_many_arguments)]
pub async fn run_add_channel(
    url: &str,
    max_videos: Option<usize>,
    space: Option<String>,
    min_duration: Option<f64>,
    max_duration: Option<f64>,
    include_shorts: bool,
    exclude_keywords: Option<Vec<String>>,
    include_keywords: Option<Vec<String>>,
    priority: &str,
    dry_run: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::AddChannel, &settings)?;

    let priority_mode = parse_priority(priority)?;

    let store = context::open_store(&settings)?;
    let space_id = context::resolve_space_id(&store, space.as_deref())?;
    let downloader_binary = settings.platform.downloader_binary.clone().unwrap_or_else(|| "yt-dlp".to_string());

    let filter = FilterOptions {
        min_duration_sec: min_duration,
        max_duration_sec: max_duration,
        include_shorts,
        include_live_streams: true,
        keyword_filter: include_keywords,
        exclude_keywords,
    };

    if dry_run {
        Output::header("Discovering channel videos (dry run)");
        let mut discovered =
            crate::platform::list_channel_videos(&downloader_binary, url, max_videos.unwrap_or(50)).await?;
        let total_discovered = discovered.len();
        let matched: Vec<_> = discovered.drain(..).filter(|v| filter.keep(v, settings.channel.shorts_threshold_secs)).collect();
        Output::success(&format!("{total_discovered} videos discovered, {} match the filter", matched.len()));
        for video in &matched {
            Output::list_item(&format!("{} ({})", video.title, video.url));
        }
        return Ok(());
    }

    let options = ChannelOrchestratorOptions {
        max_videos: max_videos.unwrap_or(50),
        filter,
        processing: ChannelProcessingOptions {
            batch_size: settings.channel.batch_size,
            concurrent_processing: settings.channel.concurrent_processing,
            enable_transcripts: true,
            enable_frame_extraction: true,
        },
        priority_mode,
        space_id,
        downloader_binary,
        download_dir: settings.temp_dir().join("channel-downloads"),
        pipeline_output_dir: settings.temp_dir(),
        shorts_threshold_secs: settings.channel.shorts_threshold_secs,
    };

    let pipeline = Arc::new(context::build_pipeline(&settings, store));
    let orchestrator = ChannelOrchestrator::new(pipeline);

    let spinner = Output::spinner("Processing channel...");
    let progress_callback: crate::channel::ProgressCallback = Arc::new(move |progress| {
        println!(
            "  [{}%] {}/{} processed ({} failed)",
            progress.overall_progress_pct, progress.successfully_processed, progress.total_to_process, progress.failed_processing
        );
    });

    let result = orchestrator.process_channel(url, options, Some(progress_callback)).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            Output::success(&format!(
                "Processed {}/{} videos from {} discovered",
                result.processing_results.iter().filter(|r| r.error.is_none()).count(),
                result.processing_results.len(),
                result.discovery_results.len()
            ));
            for outcome in &result.processing_results {
                if let Some(error) = &outcome.error {
                    Output::warning(&format!("{}: {}", outcome.video.title, error));
                }
            }
            for recommendation in &result.recommendations {
                Output::info(recommendation);
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Channel processing failed: {e}"));
            Err(anyhow::anyhow!("{}", e))
        }
    }
}

fn parse_priority(priority: &str) -> Result<PriorityMode> {
    match priority {
        "newest-first" => Ok(PriorityMode::NewestFirst),
        "oldest-first" => Ok(PriorityMode::OldestFirst),
        "most-popular" => Ok(PriorityMode::MostPopular),
        "longest-first" => Ok(PriorityMode::LongestFirst),
        other => Err(anyhow::anyhow!(
            "unknown priority mode '{other}': expected newest-first, oldest-first, most-popular, or longest-first"
        )),
    }
}
