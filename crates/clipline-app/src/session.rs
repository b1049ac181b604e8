// crates/clipline-app/src/session.rs
//
// Session: the control-thread facade over Timeline + History + ProbeScheduler.
//
// All timeline mutation happens here, on the caller's thread. Probe workers
// only produce ProbeResults; `pump` applies them by ClipId, so a result for a
// clip that was removed (or re-probed) in the meantime never lands on the
// wrong instance. Every state change is reported on `status`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, warn};

use clipline_core::history::Change;
use clipline_core::{
    Clip, ClipId, EditCommand, Extent, History, MediaProbe, PlaceholderKind, ProbeResult,
    RenderModel, StatusEvent, Thumbnail, Timeline, TimelineError,
};
use clipline_media::{FfmpegProbe, ProbeScheduler};

use crate::config::AppConfig;

/// Opaque handle the caller uses to refer to a placed clip.
pub type ClipHandle = ClipId;

pub struct Session {
    timeline:  Timeline,
    history:   History,
    probe:     Arc<dyn MediaProbe>,
    scheduler: ProbeScheduler,
    selected:  HashSet<ClipId>,
    status_tx: Sender<StatusEvent>,
    /// Status-bar notifications, in the order the changes were applied.
    /// Unbounded: the consumer is expected to drain it.
    pub status: Receiver<StatusEvent>,
}

impl Session {
    pub fn new(config: AppConfig, probe: Arc<dyn MediaProbe>) -> Self {
        let (status_tx, status) = unbounded();
        Self {
            timeline:  Timeline::new(config.timeline),
            history:   History::new(config.history_limit),
            scheduler: ProbeScheduler::new(Arc::clone(&probe), &config.preview),
            probe,
            selected:  HashSet::new(),
            status_tx,
            status,
        }
    }

    /// Session backed by the linked FFmpeg. `ffmpeg_the_third::init()` must
    /// have been called.
    pub fn with_ffmpeg(config: AppConfig) -> Self {
        let probe = Arc::new(FfmpegProbe::new(config.preview.clone()));
        Self::new(config, probe)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn clip(&self, handle: ClipHandle) -> Option<&Clip> {
        self.timeline.clip(handle)
    }

    /// Selected clips, track by track in insertion order.
    pub fn selection(&self) -> Vec<ClipHandle> {
        self.timeline.clips()
            .map(Clip::id)
            .filter(|id| self.selected.contains(id))
            .collect()
    }

    pub fn is_selected(&self, handle: ClipHandle) -> bool {
        self.selected.contains(&handle)
    }

    pub fn extent(&self) -> Extent {
        self.timeline.extent()
    }

    pub fn zoom(&self) -> f64 {
        self.timeline.zoom()
    }

    /// Render model for one clip at the current zoom, outlined if selected.
    pub fn render(&self, handle: ClipHandle) -> Option<RenderModel> {
        self.timeline.render_clip(handle, self.selected.contains(&handle))
    }

    pub fn probe_in_flight(&self, handle: ClipHandle) -> bool {
        self.scheduler.in_flight(handle)
    }

    pub fn pending_probes(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Clips ────────────────────────────────────────────────────────────────

    /// Import `path` as a new clip. With no requested track the clip goes to
    /// the first track with room (new tracks are appended as needed);
    /// otherwise it is appended after the last clip on that track.
    pub fn add_media(
        &mut self,
        path:            impl Into<PathBuf>,
        requested_track: Option<usize>,
    ) -> Result<ClipHandle, TimelineError> {
        let path = path.into();
        if let Some(index) = requested_track {
            if index >= self.timeline.track_count() {
                return Err(TimelineError::TrackNotFound { index, track_count: self.timeline.track_count() });
            }
        }

        let duration = self.probe.duration(&path);
        let clip     = Clip::new(path.clone(), duration);
        let snapshot = clip.clone();
        let before   = self.timeline.track_count();

        let placement = match requested_track {
            Some(index) => self.timeline.place_on_track(clip, index)?,
            None        => self.timeline.place(clip),
        };
        for index in before..before + placement.tracks_created {
            self.emit(StatusEvent::TrackAdded { index });
        }

        self.history.record(EditCommand::AddClip {
            clip:   snapshot,
            track:  placement.track_index,
            offset: placement.offset,
        });
        self.announce_added(placement.clip);
        self.scheduler.submit(placement.clip, path, duration);
        Ok(placement.clip)
    }

    /// Reposition a clip. On overlap nothing moves and `OverlapRejected` is
    /// emitted alongside the returned error.
    pub fn move_clip(&mut self, handle: ClipHandle, track: usize, offset: f64) -> Result<(), TimelineError> {
        let clip = self.timeline.clip(handle).ok_or(TimelineError::ClipNotFound(handle))?;
        let from = (clip.track_index(), clip.offset());

        match self.timeline.move_clip(handle, track, offset) {
            Ok(()) => {
                self.history.record(EditCommand::MoveClip { id: handle, from, to: (track, offset) });
                self.emit(StatusEvent::ClipMoved { id: handle, track, offset });
                Ok(())
            }
            Err(e) => {
                self.report_rejection(&e);
                Err(e)
            }
        }
    }

    /// Remove a clip, cancelling its probe first (bounded wait).
    pub fn remove_clip(&mut self, handle: ClipHandle) -> Result<(), TimelineError> {
        let clip = self.timeline.clip(handle).ok_or(TimelineError::ClipNotFound(handle))?;
        let (track, offset) = (clip.track_index(), clip.offset());

        self.scheduler.cancel(handle);
        let clip = self.timeline.remove_clip(handle).ok_or(TimelineError::ClipNotFound(handle))?;
        let name = clip.display_name();
        self.history.record(EditCommand::RemoveClip { clip, track, offset });
        self.forget(handle, name);
        Ok(())
    }

    /// Make `handle` the only selected clip (`None` clears). Unknown handles
    /// leave the selection as is.
    pub fn select(&mut self, handle: Option<ClipHandle>) -> bool {
        match handle {
            Some(h) if !self.timeline.contains(h) => false,
            _ => {
                self.set_selection(handle.into_iter().collect());
                true
            }
        }
    }

    /// Select every clip on every track. Returns the selection size.
    pub fn select_all(&mut self) -> usize {
        let all: HashSet<ClipId> = self.timeline.clips().map(Clip::id).collect();
        self.set_selection(all);
        self.selected.len()
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(HashSet::new());
    }

    fn set_selection(&mut self, next: HashSet<ClipId>) {
        if next != self.selected {
            self.selected = next;
            self.emit(StatusEvent::SelectionChanged { count: self.selected.len() });
        }
    }

    // ── Tracks ───────────────────────────────────────────────────────────────

    pub fn add_track(&mut self) -> usize {
        let index = self.timeline.add_track();
        self.emit(StatusEvent::TrackAdded { index });
        index
    }

    /// Remove a track with everything on it. In-flight probes for its clips
    /// are cancelled first. Later tracks shift up, which invalidates recorded
    /// positions, so the edit history is cleared.
    pub fn remove_track(&mut self, index: usize) -> Result<usize, TimelineError> {
        let ids: Vec<ClipId> = self.timeline
            .track(index)
            .ok_or(TimelineError::TrackNotFound { index, track_count: self.timeline.track_count() })?
            .items()
            .iter()
            .map(Clip::id)
            .collect();

        let abandoned = self.scheduler.cancel_many(&ids);
        if abandoned > 0 {
            warn!("[session] track {} removal left {abandoned} probe workers running", index + 1);
        }
        let removed = self.timeline.remove_track(index)?;
        for id in &ids {
            self.selected.remove(id);
        }
        self.history.clear();
        debug!("[session] history cleared after track {} removal", index + 1);

        self.emit(StatusEvent::TrackRemoved { index, clips: removed.len() });
        Ok(removed.len())
    }

    // ── Zoom ─────────────────────────────────────────────────────────────────

    pub fn set_zoom(&mut self, factor: f64) -> f64 {
        let from = self.timeline.zoom();
        let to   = self.timeline.set_zoom(factor);
        self.zoomed(from, to)
    }

    pub fn zoom_in(&mut self) -> f64 {
        let from = self.timeline.zoom();
        let to   = self.timeline.zoom_in();
        self.zoomed(from, to)
    }

    pub fn zoom_out(&mut self) -> f64 {
        let from = self.timeline.zoom();
        let to   = self.timeline.zoom_out();
        self.zoomed(from, to)
    }

    fn zoomed(&mut self, from: f64, to: f64) -> f64 {
        if to != from {
            self.history.record(EditCommand::Zoom { from, to });
            self.emit(StatusEvent::ZoomChanged { zoom: to });
        }
        to
    }

    // ── Probe results ────────────────────────────────────────────────────────

    /// Apply every probe result that has arrived. Returns how many were
    /// applied to live clips.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(result) = self.scheduler.try_recv() {
            if self.ingest(result) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until every submitted probe has delivered or `timeout` passes.
    /// Returns true when nothing is left in flight.
    pub fn wait_for_probes(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump();
        while self.scheduler.pending() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.scheduler.recv_timeout(remaining) {
                Some(result) => { self.ingest(result); }
                None         => break,
            }
        }
        let done = self.scheduler.pending() == 0;
        if !done {
            warn!("[session] {} probes still running after {timeout:?}", self.scheduler.pending());
        }
        done
    }

    fn ingest(&mut self, result: ProbeResult) -> bool {
        let id = result.id;
        let degraded = matches!(
            result.previews.thumbnail,
            Thumbnail::Placeholder { kind: PlaceholderKind::Error, .. }
        );
        if self.timeline.apply_previews(id, result.previews) {
            let name = self.timeline.clip(id).map(Clip::display_name).unwrap_or_default();
            self.emit(StatusEvent::ProbeCompleted { id, name, degraded });
            true
        } else {
            self.emit(StatusEvent::ProbeDiscarded { id });
            false
        }
    }

    // ── History ──────────────────────────────────────────────────────────────

    /// Undo the last edit. `Ok(false)` when there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, TimelineError> {
        let step = self.history.undo(&mut self.timeline);
        self.after_history(step, false)
    }

    pub fn redo(&mut self) -> Result<bool, TimelineError> {
        let step = self.history.redo(&mut self.timeline);
        self.after_history(step, true)
    }

    fn after_history(&mut self, step: Result<Option<Change>, TimelineError>, redo: bool) -> Result<bool, TimelineError> {
        match step {
            Ok(None) => {
                self.emit(StatusEvent::HistoryEmpty { redo });
                Ok(false)
            }
            Ok(Some(change)) => {
                self.apply_change(change);
                Ok(true)
            }
            Err(e) => {
                self.report_rejection(&e);
                Err(e)
            }
        }
    }

    fn apply_change(&mut self, change: Change) {
        match change {
            Change::Added(id) => {
                self.announce_added(id);
                // Previews are kept across undo; only re-probe if they never arrived.
                if let Some(clip) = self.timeline.clip(id).filter(|c| !c.has_previews()) {
                    let (path, duration) = (clip.source().to_path_buf(), clip.duration());
                    self.scheduler.submit(id, path, duration);
                }
            }
            Change::Removed { id, name } => {
                self.scheduler.cancel(id);
                self.forget(id, name);
            }
            Change::Moved(id) => {
                if let Some(clip) = self.timeline.clip(id) {
                    let (track, offset) = (clip.track_index(), clip.offset());
                    self.emit(StatusEvent::ClipMoved { id, track, offset });
                }
            }
            Change::Zoomed(zoom) => self.emit(StatusEvent::ZoomChanged { zoom }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Cancel all probes. Called from Drop as well; safe to call twice.
    pub fn shutdown(&mut self) {
        let abandoned = self.scheduler.cancel_all();
        if abandoned > 0 {
            warn!("[session] shutdown left {abandoned} probe workers running");
        }
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn announce_added(&mut self, id: ClipId) {
        if let Some(clip) = self.timeline.clip(id) {
            let event = StatusEvent::ClipAdded {
                id,
                name:     clip.display_name(),
                track:    clip.track_index(),
                offset:   clip.offset(),
                duration: clip.duration(),
            };
            self.emit(event);
        }
    }

    fn forget(&mut self, id: ClipId, name: String) {
        self.selected.remove(&id);
        self.emit(StatusEvent::ClipRemoved { id, name });
    }

    fn report_rejection(&mut self, e: &TimelineError) {
        if let TimelineError::Overlap { clip, blocking, track } = *e {
            self.emit(StatusEvent::OverlapRejected { id: clip, blocking, track });
        }
    }

    fn emit(&self, event: StatusEvent) {
        debug!("[session] {event}");
        let _ = self.status_tx.send(event);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
