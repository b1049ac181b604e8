// crates/clipline-core/src/media_types.rs
//
// Types that flow between clipline-media (probe workers) and the timeline.
// No ffmpeg here: just plain data plus the MediaProbe contract.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::clip::ClipId;

/// Packed RGB24 pixels, row-major, no stride padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub width:  u32,
    pub height: u32,
    pub data:   Vec<u8>,
}

impl Bitmap {
    /// Solid-colour bitmap.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let px = width as usize * height as usize;
        let mut data = Vec::with_capacity(px * 3);
        for _ in 0..px {
            data.extend_from_slice(&rgb);
        }
        Self { width, height, data }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Audio-only source: nothing to show in the video band.
    Audio,
    /// Decode failed; editing continues with this stand-in.
    Error,
}

impl PlaceholderKind {
    pub fn color(self) -> [u8; 3] {
        match self {
            PlaceholderKind::Audio => [73, 109, 137],
            PlaceholderKind::Error => [180, 70, 70],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaceholderKind::Audio => "AUDIO",
            PlaceholderKind::Error => "ERROR",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Thumbnail {
    /// Probe not finished (or previews released).
    Pending,
    /// One representative frame, or an evenly spaced strip.
    Frames(Vec<Bitmap>),
    Placeholder { kind: PlaceholderKind, bitmap: Bitmap },
}

impl Thumbnail {
    pub fn placeholder(kind: PlaceholderKind, width: u32, height: u32) -> Self {
        Thumbnail::Placeholder { kind, bitmap: Bitmap::filled(width, height, kind.color()) }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Thumbnail::Pending         => 0,
            Thumbnail::Frames(f)       => f.len(),
            Thumbnail::Placeholder{..} => 1,
        }
    }
}

/// Lazily extracted visuals for one clip.
#[derive(Clone, Debug, PartialEq)]
pub struct Previews {
    pub thumbnail: Thumbnail,
    /// Normalised envelope in [0, 1]; empty when there is no audio.
    pub waveform:  Vec<f32>,
}

/// Everything a full synchronous probe yields.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeData {
    pub duration: f64,
    pub previews: Previews,
}

/// Delivered once per probe request, keyed by the clip instance.
#[derive(Clone, Debug)]
pub struct ProbeResult {
    pub id:       ClipId,
    pub previews: Previews,
}

/// Shared cancellation flag between the control thread and one probe worker.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Source-analysis contract the scheduler and session are written against.
///
/// Implementations must not return errors: failures degrade to the default
/// duration, a placeholder thumbnail and an empty waveform. A panic inside
/// `previews` on a scheduler worker is turned into the ERROR placeholder.
pub trait MediaProbe: Send + Sync {
    /// Header-level duration in seconds, or the configured default.
    fn duration(&self, path: &Path) -> f64;

    /// Thumbnail + waveform. Implementations poll `cancel` between decode steps
    /// and may return early once it is set; the result is then discarded.
    fn previews(&self, path: &Path, duration: f64, cancel: &CancelToken) -> Previews;

    /// Full synchronous probe.
    fn probe(&self, path: &Path) -> ProbeData {
        let duration = self.duration(path);
        let previews = self.previews(path, duration, &CancelToken::new());
        ProbeData { duration, previews }
    }
}
