//! Char-based, sentence-aligned, overlapping chunking algorithm (spec 4.4).

use super::{ChunkingConfig, ChunkingResult, ContentChunk};
use crate::transcription::TranscriptSegment;

struct SegmentSpan {
    start_char: usize,
    end_char: usize,
    start_sec: f64,
    end_sec: f64,
}

/// Flatten segments into one joined text plus each segment's char range
/// within it, so a chunk's contributing segments can be looked up by offset.
fn build_offsets(segments: &[TranscriptSegment]) -> (String, Vec<SegmentSpan>) {
    let mut text = String::new();
    let mut spans = Vec::with_capacity(segments.len());

    for segment in segments {
        if !text.is_empty() {
            text.push(' ');
        }
        let start_char = text.chars().count();
        text.push_str(segment.text.trim());
        let end_char = text.chars().count();
        spans.push(SegmentSpan {
            start_char,
            end_char,
            start_sec: segment.start_sec,
            end_sec: segment.end_sec,
        });
    }

    (text, spans)
}

/// Find the nearest sentence terminator at or before `end`, but no earlier
/// than `search_floor`. Returns the char index just past the terminator.
fn back_off_to_sentence(chars: &[char], search_floor: usize, end: usize) -> Option<usize> {
    let mut i = end;
    while i > search_floor {
        i -= 1;
        if matches!(chars[i], '.' | '!' | '?') {
            return Some(i + 1);
        }
    }
    None
}

fn contributing_range(spans: &[SegmentSpan], start: usize, end: usize) -> Option<(f64, f64)> {
    let mut result: Option<(f64, f64)> = None;
    for span in spans {
        if span.start_char < end && span.end_char > start {
            result = Some(match result {
                None => (span.start_sec, span.end_sec),
                Some((s, e)) => (s.min(span.start_sec), e.max(span.end_sec)),
            });
        }
    }
    result
}

/// Split a transcript's segments into overlapping chunks per spec 4.4.
pub fn chunk_transcript(segments: &[TranscriptSegment], config: &ChunkingConfig) -> ChunkingResult {
    if segments.is_empty() || config.chunk_size == 0 {
        return ChunkingResult { chunks: Vec::new(), timestamp_coverage: 0.0 };
    }

    let (text, spans) = build_offsets(segments);
    let chars: Vec<char> = text.chars().collect();
    let total_len = chars.len();
    let step = config.chunk_size.saturating_sub(config.overlap_size).max(1);
    let search_window = config.chunk_size / 4;

    let mut chunks = Vec::new();
    let mut pos = 0usize;
    let mut chunk_index = 0i32;
    let mut with_timestamps = 0usize;

    while pos < total_len {
        let mut end = (pos + config.chunk_size).min(total_len);

        if config.sentence_break && end < total_len {
            let search_floor = end.saturating_sub(search_window).max(pos);
            if let Some(terminator_end) = back_off_to_sentence(&chars, search_floor, end) {
                end = terminator_end;
            }
        }

        let content: String = chars[pos..end].iter().collect();
        let content = content.trim().to_string();

        if !content.is_empty() {
            let timestamps = if config.preserve_timestamps {
                contributing_range(&spans, pos, end)
            } else {
                None
            };
            if timestamps.is_some() {
                with_timestamps += 1;
            }

            chunks.push(ContentChunk {
                word_count: content.split_whitespace().count(),
                character_count: content.chars().count(),
                content,
                chunk_index,
                start_time: timestamps.map(|(s, _)| s),
                end_time: timestamps.map(|(_, e)| e),
            });
            chunk_index += 1;
        }

        if end >= total_len {
            break;
        }

        let next_pos = end.saturating_sub(config.overlap_size);
        pos = if next_pos > pos { next_pos } else { pos + step };
    }

    let timestamp_coverage = if chunks.is_empty() { 0.0 } else { with_timestamps as f64 / chunks.len() as f64 };

    ChunkingResult { chunks, timestamp_coverage }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str, start: f64, end: f64) -> TranscriptSegment {
        TranscriptSegment { text: text.to_string(), start_sec: start, end_sec: end, confidence: None, words: None }
    }

    #[test]
    fn test_chunk_index_strictly_increases() {
        let segments = vec![
            segment("First sentence here.", 0.0, 2.0),
            segment("Second sentence follows.", 2.0, 4.0),
            segment("Third and final sentence.", 4.0, 6.0),
        ];
        let config = ChunkingConfig { chunk_size: 30, overlap_size: 6, preserve_timestamps: true, sentence_break: true };
        let result = chunk_transcript(&segments, &config);
        assert!(result.chunks.len() > 1);
        for (i, chunk) in result.chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as i32);
        }
    }

    #[test]
    fn test_sentence_break_ends_on_terminator() {
        let segments = vec![segment("Short one. Short two. Short three padded out longer here.", 0.0, 5.0)];
        let config = ChunkingConfig { chunk_size: 20, overlap_size: 4, preserve_timestamps: true, sentence_break: true };
        let result = chunk_transcript(&segments, &config);
        let first = &result.chunks[0];
        assert!(first.content.ends_with('.'));
    }

    #[test]
    fn test_concatenation_reproduces_text_without_overlap() {
        let segments = vec![
            segment("Alpha beta gamma delta epsilon zeta.", 0.0, 3.0),
            segment("Eta theta iota kappa lambda mu nu.", 3.0, 6.0),
        ];
        let config = ChunkingConfig { chunk_size: 20, overlap_size: 5, preserve_timestamps: true, sentence_break: false };
        let result = chunk_transcript(&segments, &config);

        let mut reconstructed = String::new();
        for chunk in &result.chunks {
            let deoverlapped = if reconstructed.is_empty() {
                chunk.content.clone()
            } else {
                chunk.content.chars().skip(config.overlap_size.min(chunk.content.chars().count())).collect()
            };
            reconstructed.push_str(&deoverlapped);
        }
        let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        let original = "Alpha beta gamma delta epsilon zeta. Eta theta iota kappa lambda mu nu.";
        assert_eq!(normalize(&reconstructed), normalize(original));
    }

    #[test]
    fn test_timestamp_coverage_is_full_when_segments_present() {
        let segments = vec![segment("Some text that is long enough to span a couple chunks easily.", 0.0, 10.0)];
        let config = ChunkingConfig::default();
        let result = chunk_transcript(&segments, &config);
        assert_eq!(result.timestamp_coverage, 1.0);
    }

    #[test]
    fn test_empty_segments_yields_no_chunks() {
        let config = ChunkingConfig::default();
        let result = chunk_transcript(&[], &config);
        assert!(result.chunks.is_empty());
        assert_eq!(result.timestamp_coverage, 0.0);
    }
}
