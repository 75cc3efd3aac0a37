//! Video-ingestion pipeline (spec 4.6): a persisted job/step state machine.
//!
//! Grounded on the teacher's `orchestrator.rs` sequential step structure and
//! its `tracing`-based warn-on-non-fatal idiom, expanded into forward-only
//! job states persisted through [`crate::store::JobRepository`]. Validation,
//! metadata, audio-extraction, and database-storage failures are fatal;
//! transcription, frame-sampling, and content-processing failures are
//! recorded as warnings and the job still completes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument, warn};

use crate::chunking::{chunk_transcript, ChunkingConfig};
use crate::config::{ChunkingSettings, EmbeddingSettings, PipelineSettings};
use crate::embedding::{EmbedOptions, EmbedOutcome, Embedder};
use crate::error::Result;
use crate::media::{ExtractAudioOptions, MediaAdapter};
use crate::store::{
    ContentType, JobStatus, Memory, NewMemory, ProcessingStep, SourceType, Store, StepStatus,
    TranscriptSegmentSnapshot, TranscriptSnapshot, VideoProcessingJob, WordSnapshot,
};
use crate::transcription::{TranscribeOptions, Transcriber};

/// Options for one `process_video` invocation.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub enable_frame_sampling: bool,
    pub enable_transcription: bool,
    pub enable_embeddings: bool,
    pub chunking: ChunkingConfig,
    pub output_directory: PathBuf,
    pub skip_validation: bool,
    pub audio_first_mode: bool,
    pub fast_audio_extraction: bool,
    pub custom_title: Option<String>,
    pub cleanup_video_after_processing: bool,
    pub keep_audio_files: bool,
}

impl PipelineOptions {
    pub fn new(output_directory: PathBuf, chunking_settings: &ChunkingSettings) -> Self {
        Self {
            enable_frame_sampling: true,
            enable_transcription: true,
            enable_embeddings: true,
            chunking: ChunkingConfig::from(chunking_settings),
            output_directory,
            skip_validation: false,
            audio_first_mode: false,
            fast_audio_extraction: false,
            custom_title: None,
            cleanup_video_after_processing: false,
            keep_audio_files: true,
        }
    }
}

/// Outcome of a completed (or failed) pipeline run.
pub struct PipelineOutcome {
    pub job: VideoProcessingJob,
    pub memory: Option<Memory>,
    pub chunk_count: usize,
    pub bytes_freed_by_cleanup: Option<u64>,
}

/// Coordinates one video through validation, extraction, transcription,
/// chunking, embedding, and storage.
pub struct Pipeline {
    store: Store,
    media: MediaAdapter,
    transcriber: Arc<dyn Transcriber>,
    embedder: Option<Arc<dyn Embedder>>,
    settings: PipelineSettings,
    embedding_settings: EmbeddingSettings,
}

impl Pipeline {
    pub fn new(
        store: Store,
        media: MediaAdapter,
        transcriber: Arc<dyn Transcriber>,
        embedder: Option<Arc<dyn Embedder>>,
        settings: PipelineSettings,
        embedding_settings: EmbeddingSettings,
    ) -> Self {
        Self { store, media, transcriber, embedder, settings, embedding_settings }
    }

    #[instrument(skip(self, options), fields(video_path = %video_path))]
    pub async fn process_video(
        &self,
        video_path: &str,
        space_id: &str,
        source_type: SourceType,
        options: PipelineOptions,
    ) -> Result<PipelineOutcome> {
        let job = VideoProcessingJob::new(video_path, source_type);
        self.store.jobs.create(&job)?;
        self.store.jobs.set_paths(&job.id, Some(video_path), None, None)?;

        if let Some(outcome) = self.run_validation(&job.id, video_path, &options)? {
            return Ok(outcome);
        }

        let probe = match self.run_metadata(&job.id, video_path).await {
            Ok(probe) => probe,
            Err(_) => return Ok(self.finished(&job.id)?),
        };

        let audio_path = match self.run_audio_extraction(&job.id, video_path, &options).await {
            Ok(path) => path,
            Err(_) => return Ok(self.finished(&job.id)?),
        };

        let transcript = if options.enable_transcription {
            self.run_transcription(&job.id, &audio_path, &options).await
        } else {
            self.store.jobs.set_step(&job.id, ProcessingStep::pending("transcription"))?;
            None
        };
        self.store.jobs.update_progress(&job.id, JobStatus::Processing, 60)?;

        self.run_frame_sampling(&job.id, video_path, probe.duration_sec, &options).await;
        self.store.jobs.update_progress(&job.id, JobStatus::Processing, 70)?;

        let (chunks, embedded) = self.run_content_processing(&job.id, transcript.as_ref(), &options).await;
        self.store.jobs.update_progress(&job.id, JobStatus::Processing, 80)?;

        let title = options
            .custom_title
            .clone()
            .or_else(|| Path::new(video_path).file_name().map(|n| n.to_string_lossy().to_string()));

        let storage = self.run_database_storage(
            &job.id,
            space_id,
            video_path,
            title,
            transcript,
            chunks,
            embedded,
        );
        let (memory, chunk_count) = match storage {
            Ok(result) => result,
            Err(_) => return Ok(self.finished(&job.id)?),
        };

        self.store.jobs.update_progress(&job.id, JobStatus::Completed, 100)?;

        let bytes_freed = self.run_cleanup(&job.id, video_path, &audio_path, &options);

        Ok(PipelineOutcome {
            job: self.store.jobs.get(&job.id)?.expect("job just written"),
            memory: Some(memory),
            chunk_count,
            bytes_freed_by_cleanup: bytes_freed,
        })
    }

    fn finished(&self, job_id: &str) -> Result<PipelineOutcome> {
        Ok(PipelineOutcome {
            job: self.store.jobs.get(job_id)?.expect("job just written"),
            memory: None,
            chunk_count: 0,
            bytes_freed_by_cleanup: None,
        })
    }

    /// Returns `Some(outcome)` if validation failed the job (caller should
    /// return early), `None` to continue.
    fn run_validation(&self, job_id: &str, video_path: &str, options: &PipelineOptions) -> Result<Option<PipelineOutcome>> {
        let mut step = ProcessingStep::pending("validation");
        step.status = StepStatus::Running;
        step.started_at = Some(chrono::Utc::now());

        if options.skip_validation {
            step.status = StepStatus::Completed;
            step.ended_at = Some(chrono::Utc::now());
            step.metadata = Some(json!({"skipped": true}));
            self.store.jobs.set_step(job_id, step)?;
            return Ok(None);
        }

        let path = Path::new(video_path);
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
        let valid = path.is_file()
            && path.metadata().map(|m| m.len() > 0).unwrap_or(false)
            && self.settings.allowed_video_extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension));

        if valid {
            step.status = StepStatus::Completed;
            step.ended_at = Some(chrono::Utc::now());
            self.store.jobs.set_step(job_id, step)?;
            self.store.jobs.update_progress(job_id, JobStatus::Processing, 10)?;
            Ok(None)
        } else {
            step.status = StepStatus::Failed;
            step.ended_at = Some(chrono::Utc::now());
            step.error = Some(format!("invalid or missing video file: {video_path}"));
            self.store.jobs.set_step(job_id, step)?;
            self.store.jobs.update_progress(job_id, JobStatus::Failed, 10)?;
            Ok(Some(self.finished(job_id)?))
        }
    }

    async fn run_metadata(&self, job_id: &str, video_path: &str) -> Result<crate::media::ProbeResult> {
        let mut step = ProcessingStep::pending("metadata");
        step.status = StepStatus::Running;
        step.started_at = Some(chrono::Utc::now());

        match self.media.probe(video_path).await {
            Ok(probe) => {
                step.status = StepStatus::Completed;
                step.ended_at = Some(chrono::Utc::now());
                step.metadata = Some(json!({"duration_sec": probe.duration_sec}));
                self.store.jobs.set_step(job_id, step)?;
                self.store.jobs.update_progress(job_id, JobStatus::Processing, 20)?;
                Ok(probe)
            }
            Err(e) => {
                step.status = StepStatus::Failed;
                step.ended_at = Some(chrono::Utc::now());
                step.error = Some(e.to_string());
                self.store.jobs.set_step(job_id, step)?;
                self.store.jobs.update_progress(job_id, JobStatus::Failed, 20)?;
                Err(e)
            }
        }
    }

    async fn run_audio_extraction(&self, job_id: &str, video_path: &str, options: &PipelineOptions) -> Result<String> {
        let mut step = ProcessingStep::pending("audio-extraction");
        step.status = StepStatus::Running;
        step.started_at = Some(chrono::Utc::now());

        let audio_dir = options.output_directory.join("audio");
        let extract_opts = if options.fast_audio_extraction {
            ExtractAudioOptions::fast(audio_dir)
        } else {
            ExtractAudioOptions::optimal(audio_dir)
        };

        match self.media.extract_audio(video_path, &extract_opts).await {
            Ok(result) => {
                let output_path = result.output_path.to_string_lossy().to_string();
                step.status = StepStatus::Completed;
                step.ended_at = Some(chrono::Utc::now());
                self.store.jobs.set_step(job_id, step)?;
                self.store.jobs.set_paths(job_id, None, Some(&output_path), None)?;
                self.store.jobs.update_progress(job_id, JobStatus::Processing, 40)?;
                Ok(output_path)
            }
            Err(e) => {
                step.status = StepStatus::Failed;
                step.ended_at = Some(chrono::Utc::now());
                step.error = Some(e.to_string());
                self.store.jobs.set_step(job_id, step)?;
                self.store.jobs.update_progress(job_id, JobStatus::Failed, 30)?;
                Err(e)
            }
        }
    }

    async fn run_transcription(
        &self,
        job_id: &str,
        audio_path: &str,
        options: &PipelineOptions,
    ) -> Option<crate::transcription::TranscribeResult> {
        let mut step = ProcessingStep::pending("transcription");
        step.status = StepStatus::Running;
        step.started_at = Some(chrono::Utc::now());

        let transcribe_opts = TranscribeOptions {
            language: None,
            model: None,
            output_directory: options.output_directory.clone(),
        };

        match self.transcriber.transcribe(Path::new(audio_path), &transcribe_opts).await {
            Ok(result) => {
                step.status = StepStatus::Completed;
                step.ended_at = Some(chrono::Utc::now());
                let _ = self.store.jobs.set_step(job_id, step);
                let _ = self.store.jobs.set_paths(job_id, None, None, Some(&result.output_file_path));
                Some(result)
            }
            Err(e) => {
                warn!("transcription step failed for job {job_id}, continuing without a transcript: {e}");
                step.status = StepStatus::Failed;
                step.ended_at = Some(chrono::Utc::now());
                step.error = Some(e.to_string());
                let _ = self.store.jobs.set_step(job_id, step);
                None
            }
        }
    }

    async fn run_frame_sampling(&self, job_id: &str, video_path: &str, duration_sec: f64, options: &PipelineOptions) {
        let mut step = ProcessingStep::pending("frame-sampling");
        step.status = StepStatus::Running;
        step.started_at = Some(chrono::Utc::now());

        if options.audio_first_mode {
            step.status = StepStatus::Completed;
            step.ended_at = Some(chrono::Utc::now());
            step.metadata = Some(json!({"deferred": true, "prepared": true}));
            let _ = self.store.jobs.set_step(job_id, step);
            return;
        }

        if !options.enable_frame_sampling {
            step.status = StepStatus::Completed;
            step.ended_at = Some(chrono::Utc::now());
            step.metadata = Some(json!({"skipped": true}));
            let _ = self.store.jobs.set_step(job_id, step);
            return;
        }

        let frames_dir = options.output_directory.join("frames");
        let frame_opts = crate::media::ExtractFramesOptions {
            method: crate::media::SamplingMethod::Uniform,
            frame_count: 5,
            start_time_sec: 0.0,
            end_time_sec: Some(duration_sec),
            scene_threshold: 0.3,
            max_width: None,
            max_height: None,
            jpeg_quality: 85,
            output_dir: frames_dir,
        };

        match self.media.extract_frames(video_path, &frame_opts).await {
            Ok(frames) => {
                step.status = StepStatus::Completed;
                step.ended_at = Some(chrono::Utc::now());
                step.metadata = Some(json!({"frame_count": frames.len()}));
                let _ = self.store.jobs.set_step(job_id, step);
            }
            Err(e) => {
                warn!("frame sampling failed for job {job_id}, continuing: {e}");
                step.status = StepStatus::Failed;
                step.ended_at = Some(chrono::Utc::now());
                step.error = Some(e.to_string());
                let _ = self.store.jobs.set_step(job_id, step);
            }
        }
    }

    async fn run_content_processing(
        &self,
        job_id: &str,
        transcript: Option<&crate::transcription::TranscribeResult>,
        options: &PipelineOptions,
    ) -> (Vec<crate::chunking::ContentChunk>, Vec<Option<Vec<f32>>>) {
        let mut step = ProcessingStep::pending("content-processing");
        step.status = StepStatus::Running;
        step.started_at = Some(chrono::Utc::now());

        let Some(transcript) = transcript else {
            step.status = StepStatus::Completed;
            step.ended_at = Some(chrono::Utc::now());
            step.metadata = Some(json!({"skipped": true, "reason": "no transcript"}));
            let _ = self.store.jobs.set_step(job_id, step);
            return (Vec::new(), Vec::new());
        };

        let chunking_result = chunk_transcript(&transcript.segments, &options.chunking);
        let chunk_count = chunking_result.chunks.len();

        let mut embedded = vec![None; chunk_count];
        if options.enable_embeddings && chunk_count > 0 {
            if let Some(embedder) = &self.embedder {
                let texts: Vec<String> = chunking_result.chunks.iter().map(|c| c.content.clone()).collect();
                let embed_opts = EmbedOptions {
                    model: Some(self.embedding_settings.model.clone()),
                    batch_size: self.embedding_settings.batch_size,
                };
                match embedder.embed_batch(&texts, &embed_opts).await {
                    Ok(outcomes) => {
                        for (slot, outcome) in embedded.iter_mut().zip(outcomes) {
                            if let EmbedOutcome::Ok(vector) = outcome {
                                *slot = Some(vector);
                            }
                        }
                    }
                    Err(e) => warn!("embedding generation failed for job {job_id}, continuing without embeddings: {e}"),
                }
            }
        }

        step.status = StepStatus::Completed;
        step.ended_at = Some(chrono::Utc::now());
        step.metadata = Some(json!({
            "chunk_count": chunk_count,
            "timestamp_coverage": chunking_result.timestamp_coverage,
        }));
        let _ = self.store.jobs.set_step(job_id, step);

        (chunking_result.chunks, embedded)
    }

    fn run_database_storage(
        &self,
        job_id: &str,
        space_id: &str,
        video_path: &str,
        title: Option<String>,
        transcript: Option<crate::transcription::TranscribeResult>,
        chunks: Vec<crate::chunking::ContentChunk>,
        embedded: Vec<Option<Vec<f32>>>,
    ) -> Result<(Memory, usize)> {
        let mut step = ProcessingStep::pending("database-storage");
        step.status = StepStatus::Running;
        step.started_at = Some(chrono::Utc::now());

        let content = transcript.as_ref().map(|t| t.text.clone()).unwrap_or_default();
        let new_memory = NewMemory {
            space_id: Some(space_id.to_string()),
            content_type: ContentType::Video,
            title,
            content,
            source: video_path.to_string(),
            file_path: Some(video_path.to_string()),
            metadata: json!({}),
        };

        let chunk_texts: Vec<(String, Option<i64>, Option<i64>)> = chunks
            .iter()
            .map(|c| {
                (
                    c.content.clone(),
                    c.start_time.map(|s| (s * 1000.0).round() as i64),
                    c.end_time.map(|e| (e * 1000.0).round() as i64),
                )
            })
            .collect();

        let embeddings_for_ingest: Option<Vec<(usize, Vec<f32>, String)>> = {
            let rows: Vec<(usize, Vec<f32>, String)> = embedded
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.clone().map(|vector| (i, vector, self.embedding_settings.model.clone())))
                .collect();
            if rows.is_empty() { None } else { Some(rows) }
        };

        let result = self.store.ingest_memory(space_id, new_memory, chunk_texts, embeddings_for_ingest);

        match result {
            Ok((memory, stored_chunks)) => {
                let transcript_snapshot = transcript.map(|t| TranscriptSnapshot {
                    language: t.language,
                    duration_sec: t.duration_sec,
                    segment_count: t.segments.len(),
                    full_text: t.text,
                    segments: t
                        .segments
                        .into_iter()
                        .map(|s| TranscriptSegmentSnapshot {
                            text: s.text,
                            start_sec: s.start_sec,
                            end_sec: s.end_sec,
                            confidence: s.confidence,
                            words: s.words.map(|ws| {
                                ws.into_iter()
                                    .map(|w| WordSnapshot {
                                        word: w.word,
                                        start_ms: w.start_ms,
                                        end_ms: w.end_ms,
                                        confidence: w.confidence,
                                    })
                                    .collect()
                            }),
                        })
                        .collect(),
                });

                let embeddings_snapshot: Option<Vec<crate::store::VectorEmbedding>> = if stored_chunks.is_empty() {
                    None
                } else {
                    Some(
                        stored_chunks
                            .iter()
                            .zip(embedded.iter())
                            .filter_map(|(chunk, vector)| {
                                vector.as_ref().map(|v| crate::store::VectorEmbedding {
                                    id: crate::store::VectorEmbedding::composite_id(
                                        &chunk.id,
                                        crate::store::EmbeddingContentType::Chunk,
                                        &self.embedding_settings.model,
                                    ),
                                    content_id: chunk.id.clone(),
                                    content_type: crate::store::EmbeddingContentType::Chunk,
                                    model: self.embedding_settings.model.clone(),
                                    dimensions: v.len(),
                                    vector: v.clone(),
                                    created_at: chrono::Utc::now(),
                                })
                            })
                            .collect(),
                    )
                };

                self.store.processed_content.create(
                    job_id,
                    &memory.id,
                    stored_chunks.clone(),
                    embeddings_snapshot,
                    transcript_snapshot,
                    None,
                    None,
                )?;

                step.status = StepStatus::Completed;
                step.ended_at = Some(chrono::Utc::now());
                self.store.jobs.set_step(job_id, step)?;
                info!("job {job_id} stored memory {} with {} chunks", memory.id, stored_chunks.len());
                Ok((memory, stored_chunks.len()))
            }
            Err(e) => {
                step.status = StepStatus::Failed;
                step.ended_at = Some(chrono::Utc::now());
                step.error = Some(e.to_string());
                self.store.jobs.set_step(job_id, step)?;
                self.store.jobs.update_progress(job_id, JobStatus::Failed, 90)?;
                Err(e)
            }
        }
    }

    /// Post-success cleanup: delete the source video only when audio was
    /// extracted and the caller asked to keep it, to avoid losing the only
    /// copy of the content.
    fn run_cleanup(&self, job_id: &str, video_path: &str, audio_path: &str, options: &PipelineOptions) -> Option<u64> {
        if !options.cleanup_video_after_processing || !options.keep_audio_files || audio_path.is_empty() {
            return None;
        }
        let path = Path::new(video_path);
        let bytes = path.metadata().ok().map(|m| m.len());
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!("job {job_id} cleaned up source video, freed {:?} bytes", bytes);
                bytes
            }
            Err(e) => {
                warn!("job {job_id} cleanup could not remove source video: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaSettings;
    use crate::transcription::TranscribeResult;
    use async_trait::async_trait;

    struct StubTranscriber;

    #[async_trait]
    impl Transcriber for StubTranscriber {
        async fn transcribe(&self, _audio_path: &Path, _opts: &TranscribeOptions) -> Result<TranscribeResult> {
            unreachable!("not exercised by these tests")
        }
    }

    fn test_pipeline() -> Pipeline {
        Pipeline::new(
            Store::open_in_memory().unwrap(),
            MediaAdapter::new(&MediaSettings::default()),
            Arc::new(StubTranscriber),
            None,
            PipelineSettings::default(),
            EmbeddingSettings::default(),
        )
    }

    fn test_options() -> PipelineOptions {
        PipelineOptions::new(std::env::temp_dir(), &ChunkingSettings::default())
    }

    #[test]
    fn test_validation_rejects_missing_file() {
        let pipeline = test_pipeline();
        let job = VideoProcessingJob::new("missing.mp4", SourceType::Local);
        pipeline.store.jobs.create(&job).unwrap();
        let outcome = pipeline
            .run_validation(&job.id, "/no/such/video.mp4", &test_options())
            .unwrap();
        assert!(outcome.is_some());
        let failed = pipeline.store.jobs.get(&job.id).unwrap().unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.progress, 10);
    }

    #[test]
    fn test_validation_rejects_disallowed_extension() {
        let pipeline = test_pipeline();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.txt");
        std::fs::write(&path, b"not a video").unwrap();
        let job = VideoProcessingJob::new(path.to_string_lossy().to_string(), SourceType::Local);
        pipeline.store.jobs.create(&job).unwrap();
        let outcome = pipeline
            .run_validation(&job.id, &path.to_string_lossy(), &test_options())
            .unwrap();
        assert!(outcome.is_some());
    }

    #[test]
    fn test_validation_accepts_known_extension() {
        let pipeline = test_pipeline();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"fake video bytes").unwrap();
        let job = VideoProcessingJob::new(path.to_string_lossy().to_string(), SourceType::Local);
        pipeline.store.jobs.create(&job).unwrap();
        let outcome = pipeline
            .run_validation(&job.id, &path.to_string_lossy(), &test_options())
            .unwrap();
        assert!(outcome.is_none());
        let job = pipeline.store.jobs.get(&job.id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 10);
    }

    #[test]
    fn test_validation_can_be_skipped() {
        let pipeline = test_pipeline();
        let job = VideoProcessingJob::new("anything.mp4", SourceType::Local);
        pipeline.store.jobs.create(&job).unwrap();
        let mut options = test_options();
        options.skip_validation = true;
        let outcome = pipeline.run_validation(&job.id, "/no/such/file.mp4", &options).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_cleanup_skipped_when_not_configured() {
        let pipeline = test_pipeline();
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("source.mp4");
        std::fs::write(&video, b"bytes").unwrap();
        let mut options = test_options();
        options.cleanup_video_after_processing = false;
        let freed = pipeline.run_cleanup("job-1", &video.to_string_lossy(), "audio.wav", &options);
        assert!(freed.is_none());
        assert!(video.exists());
    }

    #[test]
    fn test_cleanup_removes_source_video_when_enabled() {
        let pipeline = test_pipeline();
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("source.mp4");
        std::fs::write(&video, b"bytes").unwrap();
        let mut options = test_options();
        options.cleanup_video_after_processing = true;
        options.keep_audio_files = true;
        let freed = pipeline.run_cleanup("job-1", &video.to_string_lossy(), "audio.wav", &options);
        assert!(freed.is_some());
        assert!(!video.exists());
    }

    #[tokio::test]
    async fn test_content_processing_skips_when_no_transcript() {
        let pipeline = test_pipeline();
        let job = VideoProcessingJob::new("v.mp4", SourceType::Local);
        pipeline.store.jobs.create(&job).unwrap();
        let (chunks, embedded) = pipeline.run_content_processing(&job.id, None, &test_options()).await;
        assert!(chunks.is_empty());
        assert!(embedded.is_empty());
    }
}
