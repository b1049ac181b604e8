// crates/clipline-core/src/timeline.rs
//
// Multi-track composition: placement, moves, track lifecycle, zoom and the
// scene extent the drawing surface scrolls over.
//
// Invariant: no two clips on the same track intersect. Every mutation below
// either keeps it or returns an error without touching state.

use log::debug;
use serde::Serialize;

use crate::clip::{Clip, ClipId};
use crate::config::TimelineConfig;
use crate::error::TimelineError;
use crate::media_types::Previews;
use crate::render::{render_clip, RenderModel};
use crate::track::Track;

/// Where a clip ended up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub clip:           ClipId,
    pub track_index:    usize,
    pub offset:         f64,
    /// Tracks appended to make room (first-fit only).
    pub tracks_created: usize,
}

/// Scrollable scene bounds in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Extent {
    pub width:  f64,
    pub height: f64,
}

#[derive(Clone, Debug)]
pub struct Timeline {
    tracks: Vec<Track>,
    zoom:   f64,
    config: TimelineConfig,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

impl Timeline {
    /// Empty timeline with a single track.
    pub fn new(config: TimelineConfig) -> Self {
        let initial = if config.initial_zoom.is_finite() && config.initial_zoom > 0.0 {
            config.initial_zoom
        } else {
            1.0
        };
        Self {
            tracks: vec![Track::new()],
            zoom:   config.clamp_zoom(initial),
            config,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|t| t.items().iter())
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.tracks.iter().find_map(|t| t.get(id))
    }

    pub fn contains(&self, id: ClipId) -> bool {
        self.clip(id).is_some()
    }

    /// Index of the track holding `id`.
    pub fn locate(&self, id: ClipId) -> Option<usize> {
        self.tracks.iter().position(|t| t.position(id).is_some())
    }

    /// True when every track is overlap-free and every clip's `track_index`
    /// matches the track that owns it.
    pub fn check_invariants(&self) -> bool {
        self.tracks.iter().enumerate().all(|(i, t)| {
            t.is_consistent() && t.items().iter().all(|c| c.track_index() == i)
        })
    }

    // ── Tracks ───────────────────────────────────────────────────────────────

    /// Append an empty track and return its index.
    pub fn add_track(&mut self) -> usize {
        self.tracks.push(Track::new());
        let index = self.tracks.len() - 1;
        debug!("[timeline] track {} added", index + 1);
        index
    }

    /// Remove a track and hand back its clips with their previews released.
    /// Tracks below it shift up by one.
    pub fn remove_track(&mut self, index: usize) -> Result<Track, TimelineError> {
        self.check_track(index)?;
        let mut removed = self.tracks.remove(index);
        for clip in removed.items_mut().iter_mut() {
            clip.release_previews();
        }
        for (i, track) in self.tracks.iter_mut().enumerate().skip(index) {
            for clip in track.items_mut().iter_mut() {
                clip.track_index = i;
            }
        }
        debug!("[timeline] track {} removed ({} clips)", index + 1, removed.len());
        Ok(removed)
    }

    // ── Placement ────────────────────────────────────────────────────────────

    /// First-fit placement: try tracks in index order and take the first
    /// left-packed slot, appending a fresh track when none has room.
    pub fn place(&mut self, clip: Clip) -> Placement {
        let mut index   = 0;
        let mut created = 0;
        loop {
            if index == self.tracks.len() {
                self.tracks.push(Track::new());
                created += 1;
            }
            if let Some(offset) = self.tracks[index].first_fit(clip.duration()) {
                let mut placement = self.commit(clip, index, offset);
                placement.tracks_created = created;
                return placement;
            }
            index += 1;
        }
    }

    /// Place a new clip at an explicit position.
    pub fn place_at(&mut self, clip: Clip, track: usize, offset: f64) -> Result<Placement, TimelineError> {
        check_offset(offset)?;
        self.check_track(track)?;
        let interval = clip.interval_at(offset);
        if let Some(blocking) = self.tracks[track].overlapping(&interval, Some(clip.id())) {
            return Err(TimelineError::Overlap { clip: clip.id(), blocking: blocking.id(), track });
        }
        Ok(self.commit(clip, track, offset))
    }

    /// Append a new clip after the last clip on `track`.
    pub fn place_on_track(&mut self, clip: Clip, track: usize) -> Result<Placement, TimelineError> {
        self.check_track(track)?;
        let offset = self.tracks[track].end();
        Ok(self.commit(clip, track, offset))
    }

    /// Reposition an existing clip. Atomic: on error nothing moves.
    pub fn move_clip(&mut self, id: ClipId, track: usize, offset: f64) -> Result<(), TimelineError> {
        check_offset(offset)?;
        let from = self.locate(id).ok_or(TimelineError::ClipNotFound(id))?;
        self.check_track(track)?;

        let interval = match self.tracks[from].get(id) {
            Some(c) => c.interval_at(offset),
            None    => return Err(TimelineError::ClipNotFound(id)),
        };
        if let Some(blocking) = self.tracks[track].overlapping(&interval, Some(id)) {
            return Err(TimelineError::Overlap { clip: id, blocking: blocking.id(), track });
        }

        if from == track {
            if let Some(clip) = self.tracks[track].get_mut(id) {
                clip.offset = offset;
            }
        } else if let Some(mut clip) = self.tracks[from].remove(id) {
            clip.track_index = track;
            clip.offset      = offset;
            self.tracks[track].push(clip);
        }
        debug!("[timeline] moved {id} → track {} at {offset:.2}s", track + 1);
        Ok(())
    }

    pub fn remove_clip(&mut self, id: ClipId) -> Option<Clip> {
        let track = self.locate(id)?;
        let clip  = self.tracks[track].remove(id)?;
        debug!("[timeline] removed {id} from track {}", track + 1);
        Some(clip)
    }

    /// Attach probe output to a live clip. Returns false, leaving everything
    /// untouched, when the clip is gone or already has previews.
    pub fn apply_previews(&mut self, id: ClipId, previews: Previews) -> bool {
        match self.tracks.iter_mut().find_map(|t| t.get_mut(id)) {
            Some(clip) => clip.set_previews(previews),
            None       => false,
        }
    }

    fn commit(&mut self, mut clip: Clip, track: usize, offset: f64) -> Placement {
        clip.track_index = track;
        clip.offset      = offset;
        let placement = Placement { clip: clip.id(), track_index: track, offset, tracks_created: 0 };
        debug!(
            "[timeline] placed {} on track {} at {offset:.2}s",
            clip.display_name(), track + 1,
        );
        self.tracks[track].push(clip);
        placement
    }

    fn check_track(&self, index: usize) -> Result<(), TimelineError> {
        if index < self.tracks.len() {
            Ok(())
        } else {
            Err(TimelineError::TrackNotFound { index, track_count: self.tracks.len() })
        }
    }

    // ── Zoom / extent ────────────────────────────────────────────────────────

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom factor, clamped to the configured range. Non-finite or
    /// non-positive requests are ignored. Returns the zoom now in effect.
    pub fn set_zoom(&mut self, factor: f64) -> f64 {
        if factor.is_finite() && factor > 0.0 {
            self.zoom = self.config.clamp_zoom(factor);
        }
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom * self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom / self.config.zoom_step)
    }

    /// Renderer scale: pixels per second of media at the current zoom.
    pub fn pixels_per_second(&self) -> f64 {
        self.config.base_pixels_per_second * self.zoom
    }

    pub fn extent(&self) -> Extent {
        let end = self.clips().map(Clip::end).fold(0.0_f64, f64::max);
        Extent {
            width:  end * self.pixels_per_second(),
            height: self.tracks.len() as f64 * (self.config.track_height + self.config.track_spacing),
        }
    }

    pub fn render_clip(&self, id: ClipId, selected: bool) -> Option<RenderModel> {
        let clip = self.clip(id)?;
        Some(render_clip(clip, self.pixels_per_second(), selected, &self.config.render))
    }
}

fn check_offset(offset: f64) -> Result<(), TimelineError> {
    if offset.is_finite() && offset >= 0.0 {
        Ok(())
    } else {
        Err(TimelineError::InvalidOffset(offset))
    }
}
