// crates/clipline-core/src/events.rs
//
// Outbound notifications for a status-bar style consumer. Emitted by the
// session after the state change they describe has been applied (or rejected).

use std::fmt;

use crate::clip::ClipId;
use crate::helpers::time::format_duration;

#[derive(Clone, Debug, PartialEq)]
pub enum StatusEvent {
    ClipAdded      { id: ClipId, name: String, track: usize, offset: f64, duration: f64 },
    ClipMoved      { id: ClipId, track: usize, offset: f64 },
    ClipRemoved    { id: ClipId, name: String },
    /// Probe result applied to a live clip. `degraded` = placeholder thumbnail.
    ProbeCompleted { id: ClipId, name: String, degraded: bool },
    /// Probe result arrived for a clip that no longer exists.
    ProbeDiscarded { id: ClipId },
    OverlapRejected { id: ClipId, blocking: ClipId, track: usize },
    TrackAdded     { index: usize },
    TrackRemoved   { index: usize, clips: usize },
    ZoomChanged    { zoom: f64 },
    SelectionChanged { count: usize },
    HistoryEmpty   { redo: bool },
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Track numbers are 1-based for people.
        match self {
            StatusEvent::ClipAdded { name, track, duration, .. } => {
                write!(f, "Added {name} ({}) to track {}", format_duration(*duration), track + 1)
            }
            StatusEvent::ClipMoved { track, offset, .. } => {
                write!(f, "Clip moved to track {} at {offset:.2}s", track + 1)
            }
            StatusEvent::ClipRemoved { name, .. } => write!(f, "Removed {name}"),
            StatusEvent::ProbeCompleted { name, degraded: false, .. } => write!(f, "Preview ready: {name}"),
            StatusEvent::ProbeCompleted { name, degraded: true, .. } => {
                write!(f, "Preview unavailable for {name}, using placeholder")
            }
            StatusEvent::ProbeDiscarded { .. } => f.write_str("Discarded preview for removed clip"),
            StatusEvent::OverlapRejected { track, .. } => {
                write!(f, "Cannot move clip: overlaps another clip on track {}", track + 1)
            }
            StatusEvent::TrackAdded { index } => write!(f, "Track {} added", index + 1),
            StatusEvent::TrackRemoved { index, clips } => {
                write!(f, "Track {} removed ({clips} clips)", index + 1)
            }
            StatusEvent::ZoomChanged { zoom } => write!(f, "Zoom {:.0}%", zoom * 100.0),
            StatusEvent::SelectionChanged { count: 0 } => f.write_str("Selection cleared"),
            StatusEvent::SelectionChanged { count: 1 } => f.write_str("1 clip selected"),
            StatusEvent::SelectionChanged { count } => write!(f, "{count} clips selected"),
            StatusEvent::HistoryEmpty { redo: false } => f.write_str("Nothing to undo"),
            StatusEvent::HistoryEmpty { redo: true } => f.write_str("Nothing to redo"),
        }
    }
}
