//! Repository for `video_deeplinks`: platform URLs pinned to a timestamp.

use std::sync::Arc;

use rusqlite::params;

use crate::error::Result;

use super::context::StoreContext;
use super::models::{VideoDeepLink, VideoType};

pub struct DeepLinkRepository {
    ctx: Arc<StoreContext>,
}

impl DeepLinkRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    pub fn create(&self, link: &VideoDeepLink) -> Result<()> {
        let conn = self.ctx.conn();
        conn.execute(
            "INSERT INTO video_deeplinks
                (id, video_id, video_type, timestamp_start_sec, timestamp_end_sec, deeplink_url,
                 context_summary, search_keywords, confidence_score, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                link.id,
                link.video_id,
                link.video_type.as_str(),
                link.timestamp_start_sec,
                link.timestamp_end_sec,
                link.deeplink_url,
                link.context_summary,
                link.search_keywords,
                link.confidence_score,
                link.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_by_video(&self, video_id: &str, video_type: VideoType) -> Result<Vec<VideoDeepLink>> {
        let conn = self.ctx.conn();
        let mut stmt = conn.prepare(
            "SELECT id, video_id, video_type, timestamp_start_sec, timestamp_end_sec, deeplink_url,
                    context_summary, search_keywords, confidence_score, created_at
             FROM video_deeplinks WHERE video_id = ?1 AND video_type = ?2
             ORDER BY timestamp_start_sec ASC",
        )?;
        let rows = stmt.query_map(params![video_id, video_type.as_str()], row_to_link)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn row_to_link(row: &rusqlite::Row<'_>) -> rusqlite::Result<VideoDeepLink> {
    let video_type_raw: String = row.get(2)?;
    let created_raw: String = row.get(9)?;
    Ok(VideoDeepLink {
        id: row.get(0)?,
        video_id: row.get(1)?,
        video_type: if video_type_raw == "platform" {
            VideoType::Platform
        } else {
            VideoType::Local
        },
        timestamp_start_sec: row.get(3)?,
        timestamp_end_sec: row.get(4)?,
        deeplink_url: row.get(5)?,
        context_summary: row.get(6)?,
        search_keywords: row.get(7)?,
        confidence_score: row.get(8)?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_raw)
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_list_by_video() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = DeepLinkRepository::new(ctx);
        let link = VideoDeepLink {
            id: StoreContext::new_id(),
            video_id: "vid-1".into(),
            video_type: VideoType::Local,
            timestamp_start_sec: 12.5,
            timestamp_end_sec: Some(20.0),
            deeplink_url: "file:///vid.mp4#t=12.5".into(),
            context_summary: Some("intro".into()),
            search_keywords: None,
            confidence_score: 0.9,
            created_at: chrono::Utc::now(),
        };
        repo.create(&link).unwrap();
        let listed = repo.list_by_video("vid-1", VideoType::Local).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].timestamp_start_sec, 12.5);
    }
}
