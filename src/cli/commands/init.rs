//! Init command - first-run setup: verify tools, create directories, open
//! the store, and ensure the default space exists.

use console::style;

use crate::cli::Output;
use crate::config::Settings;
use crate::store::Store;

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings, test_mode: bool, force: bool) -> anyhow::Result<()> {
    Output::header("spiralmem Setup");
    println!();

    if !test_mode {
        println!("{}", style("Step 1: Checking prerequisites").bold().cyan());
        println!();

        let tool_issues = check_prerequisites(settings);
        if tool_issues.is_empty() {
            Output::success("All required tools are installed!");
        } else {
            Output::warning("Some tools are missing:");
            println!();
            for issue in &tool_issues {
                println!("  {} {} - not found", style("x").red(), style(issue).bold());
            }
            println!();
            Output::info("spiralmem will still initialize; ingestion commands will fail until these are installed.");
        }
        println!();

        if std::env::var("OPENAI_API_KEY").is_err() {
            Output::warning("OPENAI_API_KEY is not set; transcription and embeddings will fail until it is.");
        } else {
            Output::success("OpenAI API key is configured!");
        }
        println!();
    }

    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();
    settings.ensure_directories()?;
    Output::success(&format!("Data directory ready: {}", settings.data_dir().display()));

    println!();
    println!("{}", style("Step 3: Initializing the store").bold().cyan());
    println!();

    let store = if test_mode { Store::open_in_memory()? } else { Store::open(&settings.db_path().to_string_lossy())? };
    let space = store.spaces.default_space()?;
    Output::success(&format!("Store ready at {}", if test_mode { "<in-memory>".to_string() } else { settings.db_path().display().to_string() }));
    Output::kv("default space", &space.id);

    println!();
    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() && !force {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else {
        settings.save_to(&config_path)?;
        Output::success(&format!("Wrote config file: {}", config_path.display()));
    }

    println!();
    println!("{}", style("Setup complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Verify tools and configuration", style("spiralmem check").cyan());
    println!("  {} Ingest your first video", style("spiralmem add-video <path|url>").cyan());
    println!("  {} Search your library", style("spiralmem search \"<query>\"").cyan());

    Ok(())
}

/// Check external tools required by the pipeline and channel orchestrator.
fn check_prerequisites(settings: &Settings) -> Vec<String> {
    use std::process::Command;

    let downloader = settings.platform.downloader_binary.as_deref().unwrap_or("yt-dlp");
    let candidates = [
        (downloader, "--version"),
        (settings.media.ffmpeg_binary.as_str(), "-version"),
        (settings.media.ffprobe_binary.as_str(), "-version"),
        (settings.transcription.binary.as_str(), "--version"),
    ];

    candidates
        .iter()
        .filter(|(binary, arg)| Command::new(binary).arg(arg).output().is_err())
        .map(|(binary, _)| binary.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_mode_creates_default_space() {
        let mut settings = Settings::default();
        settings.general.data_dir = std::env::temp_dir().join("spiralmem-init-test").to_string_lossy().to_string();
        let result = run_init(&settings, true, true);
        assert!(result.is_ok());
    }
}
