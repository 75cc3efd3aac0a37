//! Repositories for `platform_videos` and `platform_transcripts`.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde_json::Value as Json;

use crate::error::Result;

use super::context::StoreContext;
use super::models::{Platform, PlatformTranscript, PlatformVideo, TranscriptSegmentSnapshot};

pub struct PlatformVideoRepository {
    ctx: Arc<StoreContext>,
}

impl PlatformVideoRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    pub fn upsert(&self, video: &PlatformVideo) -> Result<()> {
        let conn = self.ctx.conn();
        conn.execute(
            "INSERT INTO platform_videos
                (id, memory_id, platform, platform_video_id, video_url, thumbnail_url, duration, upload_date,
                 channel_info, playlist_info, platform_metadata, last_indexed, accessibility_data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(platform, platform_video_id) DO UPDATE SET
                thumbnail_url = excluded.thumbnail_url,
                duration = excluded.duration,
                channel_info = excluded.channel_info,
                playlist_info = excluded.playlist_info,
                platform_metadata = excluded.platform_metadata,
                last_indexed = excluded.last_indexed,
                accessibility_data = excluded.accessibility_data",
            params![
                video.id,
                video.memory_id,
                video.platform.as_str(),
                video.platform_video_id,
                video.video_url,
                video.thumbnail_url,
                video.duration,
                video.upload_date.map(|d| d.to_rfc3339()),
                video.channel_info.as_ref().map(|j| j.to_string()),
                video.playlist_info.as_ref().map(|j| j.to_string()),
                StoreContext::to_json(&video.platform_metadata)?,
                video.last_indexed.to_rfc3339(),
                video.accessibility_data.as_ref().map(|j| j.to_string()),
            ],
        )?;
        Ok(())
    }

    pub fn get_by_platform_id(&self, platform: Platform, platform_video_id: &str) -> Result<Option<PlatformVideo>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, memory_id, platform, platform_video_id, video_url, thumbnail_url, duration, upload_date,
                    channel_info, playlist_info, platform_metadata, last_indexed, accessibility_data
             FROM platform_videos WHERE platform = ?1 AND platform_video_id = ?2",
            params![platform.as_str(), platform_video_id],
            row_to_video,
        )
        .optional()
        .map_err(Into::into)
    }
}

fn row_to_video(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlatformVideo> {
    let platform_raw: String = row.get(2)?;
    let upload_raw: Option<String> = row.get(7)?;
    let channel_raw: Option<String> = row.get(8)?;
    let playlist_raw: Option<String> = row.get(9)?;
    let metadata_raw: String = row.get(10)?;
    let last_indexed_raw: String = row.get(11)?;
    let accessibility_raw: Option<String> = row.get(12)?;
    Ok(PlatformVideo {
        id: row.get(0)?,
        memory_id: row.get(1)?,
        platform: parse_platform(&platform_raw),
        platform_video_id: row.get(3)?,
        video_url: row.get(4)?,
        thumbnail_url: row.get(5)?,
        duration: row.get(6)?,
        upload_date: upload_raw.as_deref().map(parse_dt),
        channel_info: channel_raw.and_then(|s| serde_json::from_str(&s).ok()),
        playlist_info: playlist_raw.and_then(|s| serde_json::from_str(&s).ok()),
        platform_metadata: serde_json::from_str(&metadata_raw).unwrap_or(Json::Null),
        last_indexed: parse_dt(&last_indexed_raw),
        accessibility_data: accessibility_raw.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

fn parse_platform(raw: &str) -> Platform {
    match raw {
        "youtube" => Platform::Youtube,
        "spotify" => Platform::Spotify,
        "zoom" => Platform::Zoom,
        "teams" => Platform::Teams,
        "vimeo" => Platform::Vimeo,
        "rumble" => Platform::Rumble,
        _ => Platform::Youtube,
    }
}

fn parse_dt(raw: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

pub struct PlatformTranscriptRepository {
    ctx: Arc<StoreContext>,
}

impl PlatformTranscriptRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    pub fn create(
        &self,
        platform_video_id: &str,
        full_text: &str,
        segments: &[TranscriptSegmentSnapshot],
    ) -> Result<PlatformTranscript> {
        let transcript = PlatformTranscript {
            id: StoreContext::new_id(),
            platform_video_id: platform_video_id.to_string(),
            full_text: full_text.to_string(),
            segments: segments.to_vec(),
            created_at: StoreContext::now(),
        };
        let conn = self.ctx.conn();
        conn.execute(
            "INSERT INTO platform_transcripts (id, platform_video_id, full_text, segments, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                transcript.id,
                transcript.platform_video_id,
                transcript.full_text,
                StoreContext::to_json(&transcript.segments)?,
                transcript.created_at.to_rfc3339(),
            ],
        )?;
        Ok(transcript)
    }

    pub fn get_by_video(&self, platform_video_id: &str) -> Result<Option<PlatformTranscript>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, platform_video_id, full_text, segments, created_at
             FROM platform_transcripts WHERE platform_video_id = ?1",
            params![platform_video_id],
            |row| {
                let segments_raw: String = row.get(3)?;
                let created_raw: String = row.get(4)?;
                Ok(PlatformTranscript {
                    id: row.get(0)?,
                    platform_video_id: row.get(1)?,
                    full_text: row.get(2)?,
                    segments: serde_json::from_str(&segments_raw).unwrap_or_default(),
                    created_at: parse_dt(&created_raw),
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_video_then_fetch() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = PlatformVideoRepository::new(ctx);
        let video = PlatformVideo {
            id: StoreContext::new_id(),
            memory_id: "mem-1".into(),
            platform: Platform::Youtube,
            platform_video_id: "abc123".into(),
            video_url: "https://youtube.com/watch?v=abc123".into(),
            thumbnail_url: None,
            duration: Some(120.0),
            upload_date: None,
            channel_info: None,
            playlist_info: None,
            platform_metadata: Json::Object(Default::default()),
            last_indexed: chrono::Utc::now(),
            accessibility_data: None,
        };
        repo.upsert(&video).unwrap();
        let fetched = repo.get_by_platform_id(Platform::Youtube, "abc123").unwrap().unwrap();
        assert_eq!(fetched.video_url, video.video_url);
    }

    #[test]
    fn test_platform_transcript_roundtrip() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = PlatformTranscriptRepository::new(ctx);
        repo.create("platvid-1", "hello world", &[]).unwrap();
        let fetched = repo.get_by_video("platvid-1").unwrap().unwrap();
        assert_eq!(fetched.full_text, "hello world");
    }
}
