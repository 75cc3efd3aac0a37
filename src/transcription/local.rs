//! Local speech-recognition binary adapter.
//!
//! Grounded on the teacher's `whisper.rs`: splits long audio into chunks,
//! transcribes chunks concurrently with a `buffer_unordered` concurrency
//! limit, adjusts timestamps by each chunk's time offset, and falls back to
//! an even word-duration split when the binary doesn't report word-level
//! timestamps. The OpenAI API calls are replaced with a subprocess call to a
//! configured local binary (e.g. a `whisper.cpp`-style CLI).

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{TranscribeOptions, TranscribeResult, Transcriber, TranscriptSegment, Word};
use crate::config::{MediaSettings, TranscriptionSettings};
use crate::error::{Result, SpiralmemError};
use crate::media::{probe, require_success, run_tool};

/// Transcribes audio with a configured local binary, invoked as a subprocess.
pub struct LocalTranscriber {
    binary: String,
    model: String,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
    timeout_secs: u64,
    ffmpeg_binary: String,
    ffprobe_binary: String,
}

impl LocalTranscriber {
    pub fn new(transcription: &TranscriptionSettings, media: &MediaSettings) -> Self {
        Self {
            binary: transcription.binary.clone(),
            model: transcription.model.clone(),
            chunk_duration_seconds: transcription.chunk_duration_seconds,
            max_concurrent_chunks: transcription.max_concurrent_chunks,
            timeout_secs: transcription.timeout_secs,
            ffmpeg_binary: media.ffmpeg_binary.clone(),
            ffprobe_binary: media.ffprobe_binary.clone(),
        }
    }

    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path, language: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        debug!("transcribing audio chunk");

        let path_str = audio_path.to_string_lossy().to_string();
        let mut args = vec![path_str.as_str(), "--model", self.model.as_str(), "--output-format", "json"];
        if let Some(lang) = language {
            args.push("--language");
            args.push(lang);
        }

        let output = run_tool(&self.binary, &args, Duration::from_secs(self.timeout_secs)).await?;
        let output = require_success(&self.binary, output)?;

        let parsed: LocalTranscriptOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| SpiralmemError::Transcription(format!("could not parse transcriber output: {e}")))?;

        Ok(parsed.segments.into_iter().map(into_segment).collect())
    }

    /// Split long audio into roughly `chunk_duration_seconds`-long pieces via
    /// a constant-bitrate ffmpeg segment mux, returning each chunk's path and
    /// its time offset into the original file.
    async fn split_audio(&self, audio_path: &Path, out_dir: &Path) -> Result<Vec<(PathBuf, f64)>> {
        let probed = probe(&self.ffprobe_binary, &audio_path.to_string_lossy()).await?;
        if probed.duration_sec <= self.chunk_duration_seconds as f64 {
            return Ok(vec![(audio_path.to_path_buf(), 0.0)]);
        }

        std::fs::create_dir_all(out_dir)?;
        let extension = audio_path.extension().and_then(|e| e.to_str()).unwrap_or("wav");
        let template = out_dir.join(format!("chunk-%03d.{extension}"));
        let template_str = template.to_string_lossy().to_string();
        let segment_time = self.chunk_duration_seconds.to_string();
        let input_str = audio_path.to_string_lossy().to_string();

        let args = vec![
            "-y",
            "-i",
            &input_str,
            "-f",
            "segment",
            "-segment_time",
            &segment_time,
            "-reset_timestamps",
            "1",
            "-c",
            "copy",
            &template_str,
        ];
        let output = run_tool(&self.ffmpeg_binary, &args, Duration::from_secs(self.timeout_secs)).await?;
        require_success(&self.ffmpeg_binary, output)?;

        let mut chunk_paths: Vec<PathBuf> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.file_name().and_then(|n| n.to_str()).map(|n| n.starts_with("chunk-")).unwrap_or(false))
            .collect();
        chunk_paths.sort();

        Ok(chunk_paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| (path, i as f64 * self.chunk_duration_seconds as f64))
            .collect())
    }

    async fn transcribe_with_splitting(&self, audio_path: &Path, opts: &TranscribeOptions) -> Result<TranscribeResult> {
        let temp_dir = tempfile::tempdir()?;
        let chunks = self.split_audio(audio_path, temp_dir.path()).await?;
        let chunk_count = chunks.len();

        let segments = if chunk_count == 1 {
            self.transcribe_single(audio_path, opts.language.as_deref()).await?
        } else {
            info!("processing {} audio chunks with {}", chunk_count, self.model);

            let mut results: Vec<(usize, f64, Vec<TranscriptSegment>)> = Vec::with_capacity(chunk_count);
            let mut stream = stream::iter(chunks.into_iter().enumerate())
                .map(|(idx, (chunk_path, time_offset))| {
                    let language = opts.language.clone();
                    async move {
                        let result = self.transcribe_single(&chunk_path, language.as_deref()).await;
                        (idx, time_offset, result)
                    }
                })
                .buffer_unordered(self.max_concurrent_chunks);

            while let Some((idx, time_offset, result)) = stream.next().await {
                match result {
                    Ok(segs) => results.push((idx, time_offset, segs)),
                    Err(e) => {
                        drop(temp_dir);
                        return Err(SpiralmemError::Transcription(format!(
                            "chunk {idx} at {time_offset:.0}s failed: {e}"
                        )));
                    }
                }
            }

            results.sort_by_key(|(idx, _, _)| *idx);
            let mut all_segments = Vec::new();
            for (_, time_offset, mut segs) in results {
                for segment in &mut segs {
                    segment.start_sec += time_offset;
                    segment.end_sec += time_offset;
                    if let Some(words) = &mut segment.words {
                        let offset_ms = (time_offset * 1000.0).round() as i64;
                        for word in words {
                            word.start_ms += offset_ms;
                            word.end_ms += offset_ms;
                        }
                    }
                }
                all_segments.extend(segs);
            }
            all_segments
        };

        drop(temp_dir);

        let text = segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");
        let duration_sec = segments.iter().map(|s| s.end_sec).fold(0.0_f64, f64::max);
        let confidences: Vec<f32> = segments.iter().filter_map(|s| s.confidence).collect();
        let average_confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        };

        let output_file_path = persist_transcript(&opts.output_directory, audio_path, &text, &segments)?;

        Ok(TranscribeResult {
            success: true,
            text,
            language: opts.language.clone(),
            duration_sec,
            average_confidence,
            segments,
            output_file_path,
        })
    }
}

fn into_segment(raw: LocalSegment) -> TranscriptSegment {
    let words = raw.words.map(|ws| {
        if ws.is_empty() {
            return Vec::new();
        }
        ws.into_iter()
            .map(|w| Word {
                word: w.word,
                start_ms: (w.start * 1000.0).round() as i64,
                end_ms: (w.end * 1000.0).round() as i64,
                confidence: w.confidence,
            })
            .collect()
    });

    let words = words.or_else(|| {
        let tokens: Vec<&str> = raw.text.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }
        warn!("no word-level timestamps returned, falling back to an even split");
        let duration_ms = ((raw.end - raw.start) * 1000.0).round() as i64;
        let word_duration_ms = duration_ms / tokens.len() as i64;
        let start_ms = (raw.start * 1000.0).round() as i64;
        Some(
            tokens
                .into_iter()
                .enumerate()
                .map(|(i, token)| Word {
                    word: token.to_string(),
                    start_ms: start_ms + i as i64 * word_duration_ms,
                    end_ms: start_ms + (i as i64 + 1) * word_duration_ms,
                    confidence: raw.confidence,
                })
                .collect(),
        )
    });

    TranscriptSegment {
        text: raw.text.trim().to_string(),
        start_sec: raw.start,
        end_sec: raw.end,
        confidence: raw.confidence,
        words,
    }
}

fn persist_transcript(
    output_directory: &Path,
    audio_path: &Path,
    text: &str,
    segments: &[TranscriptSegment],
) -> Result<String> {
    let transcripts_dir = output_directory.join("transcripts");
    std::fs::create_dir_all(&transcripts_dir)?;

    let stem = audio_path.file_stem().and_then(|s| s.to_str()).unwrap_or("transcript");
    let out_path = transcripts_dir.join(format!("{stem}.json"));

    #[derive(serde::Serialize)]
    struct Persisted<'a> {
        text: &'a str,
        segments: &'a [TranscriptSegment],
    }
    let payload = serde_json::to_string_pretty(&Persisted { text, segments })?;
    std::fs::write(&out_path, payload)?;

    Ok(out_path.to_string_lossy().to_string())
}

#[derive(Debug, Deserialize)]
struct LocalTranscriptOutput {
    #[allow(dead_code)]
    text: String,
    segments: Vec<LocalSegment>,
    #[allow(dead_code)]
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalSegment {
    start: f64,
    end: f64,
    text: String,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    words: Option<Vec<LocalWord>>,
}

#[derive(Debug, Deserialize)]
struct LocalWord {
    word: String,
    start: f64,
    end: f64,
    #[serde(default)]
    confidence: Option<f32>,
}

#[async_trait]
impl Transcriber for LocalTranscriber {
    async fn transcribe(&self, audio_path: &Path, opts: &TranscribeOptions) -> Result<TranscribeResult> {
        self.transcribe_with_splitting(audio_path, opts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split_fallback_divides_duration() {
        let raw = LocalSegment {
            start: 0.0,
            end: 2.0,
            text: "hello world".to_string(),
            confidence: Some(0.9),
            words: None,
        };
        let segment = into_segment(raw);
        let words = segment.words.expect("fallback words");
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].start_ms, 0);
        assert_eq!(words[1].start_ms, 1000);
    }

    #[test]
    fn test_explicit_words_are_kept_as_is() {
        let raw = LocalSegment {
            start: 0.0,
            end: 1.0,
            text: "hi".to_string(),
            confidence: None,
            words: Some(vec![LocalWord {
                word: "hi".to_string(),
                start: 0.1,
                end: 0.4,
                confidence: Some(0.99),
            }]),
        };
        let segment = into_segment(raw);
        let words = segment.words.expect("explicit words");
        assert_eq!(words[0].start_ms, 100);
        assert_eq!(words[0].end_ms, 400);
    }
}
