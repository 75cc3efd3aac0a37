//! Repository for `video_processing_jobs`: the persisted pipeline state machine.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use crate::error::{Result, SpiralmemError};

use super::context::StoreContext;
use super::models::{JobStatus, ProcessingStep, SourceType, VideoProcessingJob};

pub struct JobRepository {
    ctx: Arc<StoreContext>,
}

impl JobRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    pub fn create(&self, job: &VideoProcessingJob) -> Result<()> {
        let conn = self.ctx.conn();
        conn.execute(
            "INSERT INTO video_processing_jobs
                (id, source_id, source_type, status, progress, video_path, audio_path, transcript_path,
                 processing_steps, metadata, created_at, updated_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                job.id,
                job.source_id,
                job.source_type.as_str(),
                job.status.as_str(),
                job.progress as i64,
                job.video_path,
                job.audio_path,
                job.transcript_path,
                StoreContext::to_json(&job.processing_steps)?,
                StoreContext::to_json(&job.metadata)?,
                job.created_at.to_rfc3339(),
                job.updated_at.to_rfc3339(),
                job.completed_at.map(|d| d.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<VideoProcessingJob>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, source_id, source_type, status, progress, video_path, audio_path, transcript_path,
                    processing_steps, metadata, created_at, updated_at, completed_at
             FROM video_processing_jobs WHERE id = ?1",
            params![id],
            row_to_job,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_by_status(&self, status: JobStatus) -> Result<Vec<VideoProcessingJob>> {
        let conn = self.ctx.conn();
        let mut stmt = conn.prepare(
            "SELECT id, source_id, source_type, status, progress, video_path, audio_path, transcript_path,
                    processing_steps, metadata, created_at, updated_at, completed_at
             FROM video_processing_jobs WHERE status = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![status.as_str()], row_to_job)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Advance progress monotonically; rejects moving a terminal job or regressing progress.
    pub fn update_progress(&self, id: &str, status: JobStatus, progress: u8) -> Result<()> {
        let current = self
            .get(id)?
            .ok_or_else(|| SpiralmemError::NotFound(format!("job '{id}'")))?;
        if current.status.is_terminal() {
            return Err(SpiralmemError::Validation(format!(
                "job '{id}' is already {} and cannot transition",
                current.status.as_str()
            )));
        }
        if progress < current.progress {
            return Err(SpiralmemError::Validation(format!(
                "job '{id}' progress cannot regress from {} to {progress}",
                current.progress
            )));
        }
        let now = StoreContext::now();
        let completed_at = if status.is_terminal() { Some(now) } else { None };
        let conn = self.ctx.conn();
        conn.execute(
            "UPDATE video_processing_jobs SET status = ?1, progress = ?2, updated_at = ?3, completed_at = ?4 WHERE id = ?5",
            params![
                status.as_str(),
                progress as i64,
                now.to_rfc3339(),
                completed_at.map(|d| d.to_rfc3339()),
                id,
            ],
        )?;
        Ok(())
    }

    pub fn set_step(&self, id: &str, step: ProcessingStep) -> Result<()> {
        let mut job = self
            .get(id)?
            .ok_or_else(|| SpiralmemError::NotFound(format!("job '{id}'")))?;
        if let Some(existing) = job.processing_steps.iter_mut().find(|s| s.name == step.name) {
            *existing = step;
        } else {
            job.processing_steps.push(step);
        }
        let conn = self.ctx.conn();
        conn.execute(
            "UPDATE video_processing_jobs SET processing_steps = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                StoreContext::to_json(&job.processing_steps)?,
                StoreContext::now().to_rfc3339(),
                id,
            ],
        )?;
        Ok(())
    }

    pub fn set_paths(
        &self,
        id: &str,
        video_path: Option<&str>,
        audio_path: Option<&str>,
        transcript_path: Option<&str>,
    ) -> Result<()> {
        let conn = self.ctx.conn();
        conn.execute(
            "UPDATE video_processing_jobs SET
                video_path = COALESCE(?1, video_path),
                audio_path = COALESCE(?2, audio_path),
                transcript_path = COALESCE(?3, transcript_path),
                updated_at = ?4
             WHERE id = ?5",
            params![video_path, audio_path, transcript_path, StoreContext::now().to_rfc3339(), id],
        )?;
        Ok(())
    }
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<VideoProcessingJob> {
    let source_type_raw: String = row.get(2)?;
    let status_raw: String = row.get(3)?;
    let progress: i64 = row.get(4)?;
    let steps_raw: String = row.get(8)?;
    let metadata_raw: String = row.get(9)?;
    let created_raw: String = row.get(10)?;
    let updated_raw: String = row.get(11)?;
    let completed_raw: Option<String> = row.get(12)?;
    Ok(VideoProcessingJob {
        id: row.get(0)?,
        source_id: row.get(1)?,
        source_type: source_type_raw.parse::<SourceType>().unwrap_or(SourceType::Local),
        status: status_raw.parse::<JobStatus>().unwrap_or(JobStatus::Pending),
        progress: progress as u8,
        video_path: row.get(5)?,
        audio_path: row.get(6)?,
        transcript_path: row.get(7)?,
        processing_steps: serde_json::from_str(&steps_raw).unwrap_or_default(),
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null),
        created_at: parse_dt(&created_raw),
        updated_at: parse_dt(&updated_raw),
        completed_at: completed_raw.as_deref().map(parse_dt),
    })
}

fn parse_dt(raw: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_cannot_regress() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = JobRepository::new(ctx);
        let job = VideoProcessingJob::new("video-1", SourceType::Local);
        repo.create(&job).unwrap();
        repo.update_progress(&job.id, JobStatus::Processing, 40).unwrap();
        let err = repo.update_progress(&job.id, JobStatus::Processing, 10).unwrap_err();
        assert!(matches!(err, SpiralmemError::Validation(_)));
    }

    #[test]
    fn test_terminal_job_rejects_further_transitions() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = JobRepository::new(ctx);
        let job = VideoProcessingJob::new("video-1", SourceType::Local);
        repo.create(&job).unwrap();
        repo.update_progress(&job.id, JobStatus::Completed, 100).unwrap();
        let err = repo.update_progress(&job.id, JobStatus::Processing, 100).unwrap_err();
        assert!(matches!(err, SpiralmemError::Validation(_)));
    }

    #[test]
    fn test_set_step_upserts_by_name() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = JobRepository::new(ctx);
        let job = VideoProcessingJob::new("video-1", SourceType::Local);
        repo.create(&job).unwrap();
        repo.set_step(&job.id, ProcessingStep::pending("probe")).unwrap();
        let mut running = ProcessingStep::pending("probe");
        running.status = super::super::models::StepStatus::Running;
        repo.set_step(&job.id, running).unwrap();
        let fetched = repo.get(&job.id).unwrap().unwrap();
        assert_eq!(fetched.processing_steps.len(), 1);
    }
}
