//! `check` command: verify required tools and configuration are in place.

use anyhow::Result;
use std::process::Command;

use crate::cli::Output;
use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

pub fn run_check(settings: &Settings) -> Result<()> {
    Output::header("spiralmem Check");
    println!();

    let mut results = Vec::new();
    results.push(check_binary("downloader", settings.platform.downloader_binary.as_deref().unwrap_or("yt-dlp")));
    results.push(check_binary("ffmpeg", &settings.media.ffmpeg_binary));
    results.push(check_binary("ffprobe", &settings.media.ffprobe_binary));
    results.push(check_binary("transcription", &settings.transcription.binary));
    results.push(check_api_key());
    results.push(check_data_dir(settings));

    let mut has_error = false;
    for result in &results {
        let marker = match result.status {
            CheckStatus::Ok => "OK",
            CheckStatus::Warning => "WARN",
            CheckStatus::Error => {
                has_error = true;
                "FAIL"
            }
        };
        println!("  [{marker}] {} - {}", result.name, result.detail);
    }

    println!();
    if has_error {
        Output::error("One or more checks failed.");
        std::process::exit(1);
    }
    Output::success("All checks passed.");
    Ok(())
}

fn check_binary(name: &str, binary: &str) -> CheckResult {
    let version_arg = if binary.contains("ffmpeg") || binary.contains("ffprobe") { "-version" } else { "--version" };
    match Command::new(binary).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            CheckResult { name: name.to_string(), status: CheckStatus::Ok, detail: format!("found ({binary})") }
        }
        Ok(_) => CheckResult {
            name: name.to_string(),
            status: CheckStatus::Error,
            detail: format!("{binary} is installed but exited with an error"),
        },
        Err(_) => {
            CheckResult { name: name.to_string(), status: CheckStatus::Error, detail: format!("{binary} not found") }
        }
    }
}

fn check_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => {
            CheckResult { name: "OPENAI_API_KEY".to_string(), status: CheckStatus::Ok, detail: "set".to_string() }
        }
        _ => CheckResult {
            name: "OPENAI_API_KEY".to_string(),
            status: CheckStatus::Warning,
            detail: "not set; transcription and embeddings will fail".to_string(),
        },
    }
}

fn check_data_dir(settings: &Settings) -> CheckResult {
    let path = settings.data_dir();
    if path.exists() {
        CheckResult { name: "data dir".to_string(), status: CheckStatus::Ok, detail: path.display().to_string() }
    } else {
        CheckResult {
            name: "data dir".to_string(),
            status: CheckStatus::Warning,
            detail: format!("{} does not exist yet; run `spiralmem init`", path.display()),
        }
    }
}
