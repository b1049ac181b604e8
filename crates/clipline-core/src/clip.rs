// crates/clipline-core/src/clip.rs
//
// One placed instance of a media source on the timeline.
//
// Position fields (`track_index`, `offset`) are crate-private: only Timeline
// moves clips, so the per-track non-overlap invariant is enforced in one place.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media_types::{Previews, Thumbnail};

/// Live identity of a clip instance. Probe results are matched on this, never
/// on the source path, so two clips of the same file never share results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is plenty for log lines and status messages.
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl MediaKind {
    /// Classify by extension. Unknown extensions are treated as video and left
    /// to the probe to sort out.
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase();
        match ext.as_str() {
            "mp3" | "wav" | "aac" | "flac" | "ogg" | "m4a" | "opus" => MediaKind::Audio,
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff" | "webp" => MediaKind::Image,
            _ => MediaKind::Video,
        }
    }
}

/// Half-open time interval `[start, end)` in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end:   f64,
}

impl Interval {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, end: start + duration }
    }

    pub fn is_empty(&self) -> bool {
        !(self.end > self.start)
    }

    /// True when the two intervals share any time. Touching endpoints do not
    /// count, and an empty interval intersects nothing.
    pub fn intersects(&self, other: &Interval) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start < other.end
            && other.start < self.end
    }
}

#[derive(Clone, Debug)]
pub struct Clip {
    id:                    ClipId,
    source:                PathBuf,
    kind:                  MediaKind,
    duration:              f64,
    pub(crate) track_index: usize,
    pub(crate) offset:      f64,
    thumbnail:             Thumbnail,
    waveform:              Vec<f32>,
    previews_applied:      bool,
}

impl Clip {
    /// New unplaced clip. Negative or non-finite durations are stored as 0.
    pub fn new(source: impl Into<PathBuf>, duration: f64) -> Self {
        let source = source.into();
        let kind   = MediaKind::from_path(&source);
        Self {
            id: ClipId::new(),
            source,
            kind,
            duration: sanitize_seconds(duration),
            track_index: 0,
            offset: 0.0,
            thumbnail: Thumbnail::Pending,
            waveform: Vec::new(),
            previews_applied: false,
        }
    }

    pub fn id(&self)          -> ClipId      { self.id }
    pub fn source(&self)      -> &Path       { &self.source }
    pub fn kind(&self)        -> MediaKind   { self.kind }
    pub fn duration(&self)    -> f64         { self.duration }
    pub fn track_index(&self) -> usize       { self.track_index }
    pub fn offset(&self)      -> f64         { self.offset }
    pub fn thumbnail(&self)   -> &Thumbnail  { &self.thumbnail }
    pub fn waveform(&self)    -> &[f32]      { &self.waveform }

    pub fn has_previews(&self) -> bool {
        self.previews_applied
    }

    pub fn end(&self) -> f64 {
        self.offset + self.duration
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.offset, self.duration)
    }

    /// The interval this clip would occupy if it started at `offset`.
    pub fn interval_at(&self, offset: f64) -> Interval {
        Interval::new(offset, self.duration)
    }

    /// File name for status messages.
    pub fn display_name(&self) -> String {
        self.source.file_name()
            .unwrap_or(self.source.as_os_str())
            .to_string_lossy()
            .to_string()
    }

    /// Store probe output. Write-once: a second call is ignored and returns false.
    pub(crate) fn set_previews(&mut self, previews: Previews) -> bool {
        if self.previews_applied {
            return false;
        }
        self.thumbnail        = previews.thumbnail;
        self.waveform         = previews.waveform;
        self.previews_applied = true;
        true
    }

    /// Drop cached bitmaps and samples.
    pub(crate) fn release_previews(&mut self) {
        self.thumbnail        = Thumbnail::Pending;
        self.waveform         = Vec::new();
        self.previews_applied = false;
    }
}

fn sanitize_seconds(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(duration: f64, offset: f64) -> Clip {
        let mut c = Clip::new("clip.mp4", duration);
        c.offset = offset;
        c
    }

    #[test]
    fn touching_intervals_do_not_intersect() {
        let a = placed(5.0, 0.0);
        let b = placed(3.0, 5.0);
        assert!(!a.interval().intersects(&b.interval()));
        assert!(!b.interval().intersects(&a.interval()));
    }

    #[test]
    fn overlapping_intervals_intersect() {
        let a = placed(5.0, 0.0);
        let b = placed(3.0, 4.9);
        assert!(a.interval().intersects(&b.interval()));
        assert!(b.interval().intersects(&a.interval()));
    }

    #[test]
    fn contained_interval_intersects() {
        let outer = placed(10.0, 0.0);
        let inner = placed(1.0, 4.0);
        assert!(outer.interval().intersects(&inner.interval()));
    }

    #[test]
    fn empty_interval_intersects_nothing() {
        let a = placed(10.0, 0.0);
        let z = placed(0.0, 5.0);
        assert!(!a.interval().intersects(&z.interval()));
        assert!(!z.interval().intersects(&a.interval()));
    }

    #[test]
    fn bad_durations_are_clamped() {
        assert_eq!(Clip::new("a.mp4", -2.0).duration(), 0.0);
        assert_eq!(Clip::new("a.mp4", f64::NAN).duration(), 0.0);
        assert_eq!(Clip::new("a.mp4", f64::INFINITY).duration(), 0.0);
    }

    #[test]
    fn media_kind_from_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a/b/song.MP3")), MediaKind::Audio);
        assert_eq!(MediaKind::from_path(Path::new("still.jpeg")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("movie.mkv")), MediaKind::Video);
        assert_eq!(MediaKind::from_path(Path::new("no_extension")), MediaKind::Video);
    }

    #[test]
    fn previews_are_write_once() {
        let mut c = Clip::new("a.wav", 2.0);
        let first = Previews { thumbnail: Thumbnail::Pending, waveform: vec![1.0] };
        let second = Previews { thumbnail: Thumbnail::Pending, waveform: vec![0.5, 0.5] };
        assert!(c.set_previews(first));
        assert!(!c.set_previews(second));
        assert_eq!(c.waveform(), &[1.0]);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(Clip::new("a.mp4", 1.0).id(), Clip::new("a.mp4", 1.0).id());
    }
}
