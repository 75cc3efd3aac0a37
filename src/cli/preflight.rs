//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SpiralmemError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion requires the media, transcription, and (for URLs) downloader binaries plus an API key.
    AddVideo,
    /// Channel ingestion additionally requires the platform downloader for discovery.
    AddChannel,
    /// Semantic/hybrid search requires an embedding API key.
    SemanticSearch,
    /// Keyword search and compilation extraction have no external requirements.
    Search,
}

/// Run pre-flight checks for the given operation against the loaded settings.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::AddVideo => {
            check_api_key()?;
            check_tool(&settings.transcription.binary)?;
            check_tool(&settings.media.ffmpeg_binary)?;
            check_tool(&settings.media.ffprobe_binary)?;
        }
        Operation::AddChannel => {
            check_api_key()?;
            check_tool(downloader_binary(settings))?;
            check_tool(&settings.media.ffmpeg_binary)?;
            check_tool(&settings.media.ffprobe_binary)?;
        }
        Operation::SemanticSearch => {
            check_api_key()?;
        }
        Operation::Search => {}
    }
    Ok(())
}

fn downloader_binary(settings: &Settings) -> &str {
    settings.platform.downloader_binary.as_deref().unwrap_or("yt-dlp")
}

/// Check if an OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(SpiralmemError::Validation(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(SpiralmemError::Validation(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SpiralmemError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SpiralmemError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SpiralmemError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_search_no_requirements() {
        let settings = Settings::default();
        assert!(check(Operation::Search, &settings).is_ok());
    }
}
