//! `export` command: export a memory's stored transcript in JSON, SRT, or
//! VTT format.

use anyhow::Result;

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{TranscriptSnapshot, WordSnapshot};
use crate::transcription::{format_transcript, OutputFormat, TranscribeResult, TranscriptSegment, Word};

use super::context;

pub fn run_export(memory_id: &str, output: Option<String>, format: &str, settings: Settings) -> Result<()> {
    let output_format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let store = context::open_store(&settings)?;
    let processed = store
        .processed_content
        .get_by_memory(memory_id)?
        .ok_or_else(|| anyhow::anyhow!("no processed content found for memory {memory_id}"))?;
    let snapshot = processed
        .transcript
        .ok_or_else(|| anyhow::anyhow!("memory {memory_id} has no stored transcript"))?;

    let transcript = snapshot_to_transcribe_result(&snapshot);
    let rendered = format_transcript(&transcript, output_format);

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            Output::success(&format!("Exported to {path}"));
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

/// Adapts a stored [`TranscriptSnapshot`] to the shape [`format_transcript`]
/// expects from a live transcription run.
fn snapshot_to_transcribe_result(snapshot: &TranscriptSnapshot) -> TranscribeResult {
    TranscribeResult {
        success: true,
        text: snapshot.full_text.clone(),
        language: snapshot.language.clone(),
        duration_sec: snapshot.duration_sec,
        average_confidence: None,
        segments: snapshot
            .segments
            .iter()
            .map(|s| TranscriptSegment {
                text: s.text.clone(),
                start_sec: s.start_sec,
                end_sec: s.end_sec,
                confidence: s.confidence,
                words: s.words.as_ref().map(|words| words.iter().map(snapshot_word_to_word).collect()),
            })
            .collect(),
        output_file_path: String::new(),
    }
}

fn snapshot_word_to_word(word: &WordSnapshot) -> Word {
    Word { word: word.word.clone(), start_ms: word.start_ms, end_ms: word.end_ms, confidence: word.confidence }
}
