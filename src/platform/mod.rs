//! Platform URL detection, channel discovery, and download adapters.
//! Replaces the teacher's single-platform `audio_source/` with a
//! centralized per-platform table (see [`parsers`]).

mod discover;
mod downloader;
mod parsers;

pub use crate::store::Platform;
pub use discover::{list_channel_videos, ChannelVideoSummary};
pub use downloader::{
    download_segments, download_video, DownloadOptions, DownloadSegmentsOptions, DownloadedVideo,
    SegmentDownloadResult, SegmentRange,
};
pub use parsers::{extract_youtube_video_id, parse_platform_url};
