//! `add-video` command: run a local file or platform URL through the
//! ingestion pipeline.

use anyhow::Result;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::PipelineOptions;
use crate::platform::{self, DownloadOptions};
use crate::store::SourceType;

use super::context;

#[allow(clippy::too_many_arguments)]
pub async fn run_add_video(
    input: &str,
    space: Option<String>,
    title: Option<String>,
    _model: Option<String>,
    no_transcription: bool,
    keep_video: bool,
    no_keep_audio: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::AddVideo, &settings)?;

    let store = context::open_store(&settings)?;
    let space_id = context::resolve_space_id(&store, space.as_deref())?;

    let (video_path, source_type) = match platform::parse_platform_url(input) {
        Ok(_) => {
            Output::info("Downloading from platform URL...");
            let spinner = Output::spinner("Downloading...");
            let download_opts = DownloadOptions {
                max_height: settings.platform.youtube_max_height,
                max_bytes: Some(settings.platform.youtube_max_bytes),
                max_duration_sec: Some(settings.platform.youtube_max_duration_secs as f64),
                output_dir: settings.temp_dir().join("downloads"),
            };
            let downloader_binary = settings.platform.downloader_binary.clone().unwrap_or_else(|| "yt-dlp".to_string());
            let downloaded = platform::download_video(&downloader_binary, input, &download_opts).await;
            spinner.finish_and_clear();
            let downloaded = downloaded.map_err(|e| anyhow::anyhow!("download failed: {e}"))?;
            Output::success(&format!("Downloaded: {}", downloaded.suggested_title));
            (downloaded.path.to_string_lossy().to_string(), SourceType::Platform)
        }
        Err(_) => {
            if !std::path::Path::new(input).exists() {
                return Err(anyhow::anyhow!("file not found: {input}"));
            }
            (input.to_string(), SourceType::Local)
        }
    };

    let pipeline = context::build_pipeline(&settings, store);

    let mut options = PipelineOptions::new(settings.temp_dir(), &settings.chunking);
    options.enable_transcription = !no_transcription;
    options.custom_title = title;
    options.cleanup_video_after_processing = !keep_video;
    options.keep_audio_files = !no_keep_audio;

    let spinner = Output::spinner("Processing video...");
    let outcome = pipeline.process_video(&video_path, &space_id, source_type, options).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(outcome) => {
            match &outcome.memory {
                Some(memory) => {
                    Output::success(&format!("Processed: {}", memory.title.as_deref().unwrap_or(&memory.source)));
                    Output::kv("memory id", &memory.id);
                    Output::kv("chunks", &outcome.chunk_count.to_string());
                }
                None => Output::warning(&format!("Job {} did not complete successfully", outcome.job.id)),
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Processing failed: {e}"));
            Err(anyhow::anyhow!("{}", e))
        }
    }
}
