//! spiralmem CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spiralmem::cli::{commands, Cli, Commands};
use spiralmem::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| format!("spiralmem={log_level}"))))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };
    settings.ensure_directories()?;

    match &cli.command {
        Commands::Init { test_mode, force } => {
            commands::run_init(&settings, *test_mode, *force)?;
        }

        Commands::AddVideo { input, space, title, model, no_transcription, keep_video, no_keep_audio } => {
            commands::run_add_video(
                input,
                space.clone(),
                title.clone(),
                model.clone(),
                *no_transcription,
                *keep_video,
                *no_keep_audio,
                settings,
            )
            .await?;
        }

        Commands::Search { query, space, limit, timestamps, json } => {
            commands::run_search(query, space.clone(), *limit, *timestamps, *json, settings).await?;
        }

        Commands::SemanticSearch { query, space, limit, threshold, timestamps, json } => {
            commands::run_semantic_search(query, space.clone(), *limit, *threshold, *timestamps, *json, settings)
                .await?;
        }

        Commands::ExtractSegments { query, space, limit, min_duration, max_duration, csv } => {
            commands::run_extract_segments(query, space.clone(), *limit, *min_duration, *max_duration, *csv, settings)?;
        }

        Commands::DownloadSegments { query, space, limit, min_duration, max_duration, quality, output_dir } => {
            commands::run_download_segments(
                query,
                space.clone(),
                *limit,
                *min_duration,
                *max_duration,
                quality,
                output_dir.clone(),
                settings,
            )
            .await?;
        }

        Commands::GenerateEmbeddings { memory_ids, force, batch_size } => {
            commands::run_generate_embeddings(memory_ids.clone(), *force, *batch_size, settings).await?;
        }

        Commands::VectorStats { json } => {
            commands::run_vector_stats(*json, settings)?;
        }

        Commands::AddChannel {
            url,
            max_videos,
            space,
            min_duration,
            max_duration,
            include_shorts,
            exclude_keywords,
            include_keywords,
            priority,
            dry_run,
        } => {
            commands::run_add_channel(
                url,
                *max_videos,
                space.clone(),
                *min_duration,
                *max_duration,
                *include_shorts,
                exclude_keywords.clone(),
                include_keywords.clone(),
                priority,
                *dry_run,
                settings,
            )
            .await?;
        }

        Commands::Spaces => {
            commands::run_spaces(settings)?;
        }

        Commands::CreateSpace { name, description } => {
            commands::run_create_space(name, description.clone(), settings)?;
        }

        Commands::Stats => {
            commands::run_stats(settings)?;
        }

        Commands::Export { memory_id, output, format } => {
            commands::run_export(memory_id, output.clone(), format, settings)?;
        }

        Commands::Check => {
            commands::run_check(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }

        Commands::ServeMcp => {
            commands::run_serve_mcp(settings).await?;
        }
    }

    Ok(())
}
