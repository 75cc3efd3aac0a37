//! `stats` command: summary counts across spaces, memories, chunks,
//! embeddings, and jobs by status.

use anyhow::Result;

use crate::cli::Output;
use crate::config::Settings;
use crate::store::JobStatus;

use super::context;

pub fn run_stats(settings: Settings) -> Result<()> {
    let store = context::open_store(&settings)?;

    let spaces = store.spaces.list()?;
    let mut memory_count = 0i64;
    let mut chunk_count = 0usize;
    for space in &spaces {
        memory_count += store.memories.count_by_space(&space.id)?;
        for memory in store.memories.list_by_space(&space.id, 100_000, 0)? {
            chunk_count += store.chunks.list_by_memory(&memory.id)?.len();
        }
    }

    let embedding_count = store.embeddings.count()?;

    let statuses =
        [JobStatus::Pending, JobStatus::Processing, JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled];
    let mut job_counts: Vec<(JobStatus, usize)> = Vec::with_capacity(statuses.len());
    for status in statuses {
        job_counts.push((status, store.jobs.list_by_status(status)?.len()));
    }

    Output::header("spiralmem Stats");
    Output::kv("spaces", &spaces.len().to_string());
    Output::kv("memories", &memory_count.to_string());
    Output::kv("chunks", &chunk_count.to_string());
    Output::kv("embeddings", &embedding_count.to_string());
    for (status, count) in &job_counts {
        Output::kv(&format!("jobs ({status:?})"), &count.to_string());
    }

    Ok(())
}
