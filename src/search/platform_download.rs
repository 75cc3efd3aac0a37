//! Platform segment download: group matched compilation rows by source URL
//! and dispatch the downloader adapter's `download_segments` per source.

use std::collections::HashMap;

use super::CompilationRow;
use crate::platform::{download_segments, DownloadSegmentsOptions, SegmentDownloadResult, SegmentRange};

/// Group rows by source URL, converting each row's millisecond range to seconds.
pub fn group_by_source(rows: &[CompilationRow]) -> HashMap<String, Vec<SegmentRange>> {
    let mut grouped: HashMap<String, Vec<SegmentRange>> = HashMap::new();
    for row in rows {
        grouped.entry(row.source.clone()).or_default().push(SegmentRange {
            start_sec: row.start_ms as f64 / 1000.0,
            end_sec: row.end_ms as f64 / 1000.0,
        });
    }
    grouped
}

/// Download every matched segment for `source_url` via the downloader binary,
/// one subprocess invocation per range.
pub async fn download_matched_segments(
    binary: &str,
    source_url: &str,
    ranges: &[SegmentRange],
    opts: &DownloadSegmentsOptions,
) -> Vec<SegmentDownloadResult> {
    download_segments(binary, source_url, ranges, opts).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_source_converts_ms_to_seconds() {
        let rows = vec![
            CompilationRow { source: "a.mp4".into(), title: None, text: "".into(), start_ms: 1000, end_ms: 3000, speaker: None },
            CompilationRow { source: "a.mp4".into(), title: None, text: "".into(), start_ms: 5000, end_ms: 6000, speaker: None },
            CompilationRow { source: "b.mp4".into(), title: None, text: "".into(), start_ms: 0, end_ms: 2000, speaker: None },
        ];
        let grouped = group_by_source(&rows);
        assert_eq!(grouped["a.mp4"].len(), 2);
        assert_eq!(grouped["a.mp4"][0].start_sec, 1.0);
        assert_eq!(grouped["b.mp4"].len(), 1);
    }
}
