//! Declarative list of the frontend fixes the harness corroborates.

use crate::error::CatalogError;

use super::ArtifactSpec;
use super::predicate::Predicate;

pub const VIDEO_PREVIEW_PATH: &str = "frontend/src/components/Preview/VideoPreview.js";
pub const TIMELINE_PATH: &str = "frontend/src/components/Timeline/Timeline.js";

pub const AUDIO_FIX: &str = "audio fix verified";
pub const PLAYHEAD_FIX: &str = "playhead fix verified";

pub fn default_catalog() -> Result<Vec<ArtifactSpec>, CatalogError> {
    Ok(vec![video_preview()?, timeline()?])
}

fn video_preview() -> Result<ArtifactSpec, CatalogError> {
    ArtifactSpec::new(VIDEO_PREVIEW_PATH)
        .predicate(Predicate::contains("player state starts unmuted", "muted: false"))?
        .predicate(Predicate::span_excludes_token(
            "video element has no muted attribute",
            "<video",
            "</video>",
            "muted",
        )?)?
        .predicate(Predicate::matches("volume assigned on element", r"\.volume\s*=")?)?
        .group(
            AUDIO_FIX,
            &[
                "player state starts unmuted",
                "video element has no muted attribute",
            ],
            true,
        )
}

fn timeline() -> Result<ArtifactSpec, CatalogError> {
    ArtifactSpec::new(TIMELINE_PATH)
        .predicate(Predicate::span_contains(
            "isPlaying received as prop",
            "forwardRef(({",
            "}, ref)",
            "isPlaying",
        ))?
        .predicate(Predicate::contains(
            "playhead centred on time position",
            "translateX(-50%)",
        ))?
        .predicate(Predicate::contains("auto-scroll is smooth", "behavior: 'smooth'"))?
        .predicate(Predicate::matches(
            "auto-scroll follows playback",
            r"\[\s*currentTime\s*,\s*pixelsPerSecond\s*,\s*isPlaying\s*\]",
        )?)?
        .predicate(Predicate::matches(
            "playhead transition is short and linear",
            r"transition:\s*'left 0?\.\d+s linear'",
        )?)?
        .group(
            PLAYHEAD_FIX,
            &[
                "isPlaying received as prop",
                "playhead centred on time position",
                "auto-scroll is smooth",
                "auto-scroll follows playback",
            ],
            true,
        )
}
