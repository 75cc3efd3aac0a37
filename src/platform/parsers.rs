//! Centralized per-platform URL parser table (REDESIGN FLAGS: generalizes the
//! teacher's single-platform `audio_source/youtube.rs` regex into a table
//! covering youtube, spotify, zoom, teams, vimeo, rumble).

use regex::Regex;

use crate::error::{Result, SpiralmemError};

use super::Platform;

struct PlatformPattern {
    platform: Platform,
    host_fragment: &'static str,
    id_pattern: &'static str,
}

const PATTERNS: &[PlatformPattern] = &[
    PlatformPattern {
        platform: Platform::Youtube,
        host_fragment: "youtu",
        id_pattern: r"(?:youtube\.com/(?:watch\?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    },
    PlatformPattern {
        platform: Platform::Spotify,
        host_fragment: "spotify.com",
        id_pattern: r"open\.spotify\.com/episode/([A-Za-z0-9]+)",
    },
    PlatformPattern {
        platform: Platform::Zoom,
        host_fragment: "zoom.us",
        id_pattern: r"zoom\.us/rec/(?:share|play)/([A-Za-z0-9_.\-]+)",
    },
    PlatformPattern {
        platform: Platform::Teams,
        host_fragment: "teams.microsoft.com",
        id_pattern: r"teams\.microsoft\.com/.*?/([0-9a-fA-F-]{36})",
    },
    PlatformPattern {
        platform: Platform::Vimeo,
        host_fragment: "vimeo.com",
        id_pattern: r"vimeo\.com/(?:video/)?(\d+)",
    },
    PlatformPattern {
        platform: Platform::Rumble,
        host_fragment: "rumble.com",
        id_pattern: r"rumble\.com/([A-Za-z0-9-]+)\.html",
    },
];

/// Detect the platform and extract its video id from a URL. The first
/// matching host fragment wins; an unrecognized host fails with
/// `UnsupportedPlatform`, a recognized host whose id can't be parsed fails
/// with `InvalidUrl`.
pub fn parse_platform_url(url: &str) -> Result<(Platform, String)> {
    let pattern = PATTERNS
        .iter()
        .find(|p| url.contains(p.host_fragment))
        .ok_or_else(|| SpiralmemError::UnsupportedPlatform(url.to_string()))?;

    let re = Regex::new(pattern.id_pattern).expect("static pattern is valid regex");
    re.captures(url)
        .and_then(|c| c.get(1))
        .map(|m| (pattern.platform, m.as_str().to_string()))
        .ok_or_else(|| SpiralmemError::InvalidUrl(url.to_string()))
}

/// Convenience wrapper for the testable-property-6 case: a bare YouTube id extraction.
pub fn extract_youtube_video_id(url: &str) -> Result<String> {
    match parse_platform_url(url)? {
        (Platform::Youtube, id) => Ok(id),
        (_, _) => Err(SpiralmemError::UnsupportedPlatform(url.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_watch_url() {
        let (platform, id) = parse_platform_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(platform, Platform::Youtube);
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_youtube_short_url() {
        let (platform, id) = parse_platform_url("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(platform, Platform::Youtube);
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_vimeo_numeric_id() {
        let (platform, id) = parse_platform_url("https://vimeo.com/76979871").unwrap();
        assert_eq!(platform, Platform::Vimeo);
        assert_eq!(id, "76979871");
    }

    #[test]
    fn test_unknown_host_is_unsupported() {
        let err = parse_platform_url("https://example.com/video/1").unwrap_err();
        assert!(matches!(err, SpiralmemError::UnsupportedPlatform(_)));
    }

    #[test]
    fn test_malformed_youtube_url_is_invalid() {
        let err = parse_platform_url("https://www.youtube.com/watch?v=short").unwrap_err();
        assert!(matches!(err, SpiralmemError::InvalidUrl(_)));
    }

    #[test]
    fn test_extract_youtube_video_id_matches_testable_property() {
        let id = extract_youtube_video_id("https://www.youtube.com/watch?v=XXXXXXXXXXX").unwrap();
        assert_eq!(id, "XXXXXXXXXXX");
        assert_eq!(id.len(), 11);
    }
}
