// crates/clipline-core/src/error.rs
//
// Caller-facing timeline errors. Probe failures never show up here: they are
// absorbed inside clipline-media and turned into placeholders.

use thiserror::Error;

use crate::clip::ClipId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("clip {clip} would overlap clip {blocking} on track {track}")]
    Overlap { clip: ClipId, blocking: ClipId, track: usize },

    #[error("track {index} does not exist (timeline has {track_count} tracks)")]
    TrackNotFound { index: usize, track_count: usize },

    #[error("clip {0} is not on the timeline")]
    ClipNotFound(ClipId),

    #[error("invalid clip offset {0}: must be finite and >= 0")]
    InvalidOffset(f64),
}
