//! Flat, metadata-only channel listing, grounded on the teacher's
//! `YoutubeSource::list_media` (`yt-dlp --flat-playlist -J` shape), used by
//! the channel orchestrator's discovery step.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SpiralmemError};
use crate::media::{require_success, run_tool};

const DISCOVER_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ChannelVideoSummary {
    pub video_id: String,
    pub url: String,
    pub title: String,
    pub duration_sec: Option<f64>,
    pub upload_date: Option<String>,
    pub is_short: bool,
    pub is_live: bool,
    pub view_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    entries: Vec<FlatEntry>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: String,
    url: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    upload_date: Option<String>,
    view_count: Option<u64>,
    #[serde(default)]
    is_live: Option<bool>,
}

/// List up to `max_videos` videos for a channel URL, flat/metadata-only (no
/// per-video network round trip).
pub async fn list_channel_videos(binary: &str, channel_url: &str, max_videos: usize) -> Result<Vec<ChannelVideoSummary>> {
    let limit = format!("{max_videos}");
    let args = vec![
        "--flat-playlist",
        "--dump-single-json",
        "--playlist-end",
        &limit,
        "--no-warnings",
        channel_url,
    ];
    let output = run_tool(binary, &args, DISCOVER_TIMEOUT).await?;
    let output = require_success(binary, output)?;

    let parsed: FlatPlaylist = serde_json::from_slice(&output.stdout)
        .map_err(|e| SpiralmemError::Platform(format!("could not parse channel listing: {e}")))?;

    Ok(parsed
        .entries
        .into_iter()
        .map(|entry| {
            let duration_sec = entry.duration;
            ChannelVideoSummary {
                url: entry
                    .url
                    .clone()
                    .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", entry.id)),
                is_short: duration_sec.map(|d| d < 60.0).unwrap_or(false),
                is_live: entry.is_live.unwrap_or(false),
                video_id: entry.id,
                title: entry.title.unwrap_or_else(|| "untitled".to_string()),
                duration_sec,
                upload_date: entry.upload_date,
                view_count: entry.view_count,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_duration_is_not_a_short() {
        let entry = FlatEntry {
            id: "abc".into(),
            url: None,
            title: None,
            duration: None,
            upload_date: None,
            view_count: None,
            is_live: None,
        };
        assert!(entry.duration.map(|d| d < 60.0).unwrap_or(false).eq(&false));
    }
}
