// crates/clipline-app/tests/session.rs
//
// Session behaviour against a scripted MediaProbe: placement, rejection
// events, late-result discard, cancellation on removal, undo/redo.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clipline_app::{AppConfig, Session};
use clipline_core::{
    Bitmap, CancelToken, ClipId, MediaProbe, Previews, StatusEvent, Thumbnail, TimelineError,
};

/// Durations by file name (5 s otherwise); previews after `delay`.
#[derive(Default)]
struct FakeProbe {
    durations: HashMap<PathBuf, f64>,
    delay:     Duration,
    /// Ignore the cancel token.
    stubborn:  bool,
    started:   AtomicUsize,
    finished:  AtomicUsize,
}

impl FakeProbe {
    fn with(durations: &[(&str, f64)], delay_ms: u64) -> Self {
        Self {
            durations: durations.iter().map(|(p, d)| (PathBuf::from(p), *d)).collect(),
            delay:     Duration::from_millis(delay_ms),
            ..Default::default()
        }
    }
}

impl MediaProbe for FakeProbe {
    fn duration(&self, path: &Path) -> f64 {
        self.durations.get(path).copied().unwrap_or(5.0)
    }

    fn previews(&self, _path: &Path, _duration: f64, cancel: &CancelToken) -> Previews {
        self.started.fetch_add(1, Ordering::SeqCst);
        let end = Instant::now() + self.delay;
        while Instant::now() < end && (self.stubborn || !cancel.is_cancelled()) {
            thread::sleep(Duration::from_millis(2));
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        Previews {
            thumbnail: Thumbnail::Frames(vec![Bitmap::filled(4, 3, [9, 9, 9]); 5]),
            waveform:  vec![0.0, 1.0, 0.02, 0.5],
        }
    }
}

fn session(probe: Arc<FakeProbe>) -> Session {
    Session::new(AppConfig::default(), probe)
}

fn events(s: &Session) -> Vec<StatusEvent> {
    s.status.try_iter().collect()
}

fn completed(evts: &[StatusEvent], id: ClipId) -> bool {
    evts.iter().any(|e| matches!(e, StatusEvent::ProbeCompleted { id: i, .. } if *i == id))
}

#[test]
fn imports_pack_left_and_receive_previews() {
    let probe = Arc::new(FakeProbe::with(&[("a.mp4", 5.0), ("b.mp4", 3.0), ("c.mp4", 4.0)], 5));
    let mut s = session(probe);

    let a = s.add_media("a.mp4", None).unwrap();
    let b = s.add_media("b.mp4", None).unwrap();
    let c = s.add_media("c.mp4", None).unwrap();
    assert_eq!(s.clip(a).unwrap().offset(), 0.0);
    assert_eq!(s.clip(b).unwrap().offset(), 5.0);
    assert_eq!(s.clip(c).unwrap().offset(), 8.0);

    assert!(s.wait_for_probes(Duration::from_secs(5)));
    for id in [a, b, c] {
        assert!(s.clip(id).unwrap().has_previews());
    }

    let evts = events(&s);
    let added = evts.iter().filter(|e| matches!(e, StatusEvent::ClipAdded { .. })).count();
    assert_eq!(added, 3);
    assert!(completed(&evts, a) && completed(&evts, b) && completed(&evts, c));
    assert!(s.timeline().check_invariants());
}

#[test]
fn requested_track_appends_after_last_clip() {
    let probe = Arc::new(FakeProbe::with(&[("a.mp4", 2.0)], 1));
    let mut s = session(probe);
    s.add_track();
    s.add_media("a.mp4", Some(1)).unwrap();
    let second = s.add_media("a.mp4", Some(1)).unwrap();
    assert_eq!(s.clip(second).unwrap().track_index(), 1);
    assert_eq!(s.clip(second).unwrap().offset(), 2.0);
}

#[test]
fn out_of_range_track_is_rejected_before_probing() {
    let probe = Arc::new(FakeProbe::default());
    let mut s = session(probe.clone());
    let err = s.add_media("a.mp4", Some(3)).unwrap_err();
    assert_eq!(err, TimelineError::TrackNotFound { index: 3, track_count: 1 });
    assert_eq!(s.pending_probes(), 0);
    assert_eq!(s.timeline().clip_count(), 0);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(probe.started.load(Ordering::SeqCst), 0);
}

#[test]
fn overlapping_move_is_rejected_with_an_event() {
    let probe = Arc::new(FakeProbe::with(&[("a.mp4", 4.0), ("b.mp4", 4.0)], 1));
    let mut s = session(probe);
    let a = s.add_media("a.mp4", None).unwrap();
    let b = s.add_media("b.mp4", None).unwrap();
    events(&s);

    let err = s.move_clip(b, 0, 2.0).unwrap_err();
    assert!(matches!(err, TimelineError::Overlap { blocking, .. } if blocking == a));
    assert_eq!(s.clip(b).unwrap().offset(), 4.0);
    assert_eq!(
        events(&s),
        vec![StatusEvent::OverlapRejected { id: b, blocking: a, track: 0 }],
    );

    s.move_clip(b, 0, 10.0).unwrap();
    assert_eq!(s.clip(b).unwrap().offset(), 10.0);
}

#[test]
fn removed_clip_never_receives_its_probe() {
    let probe = Arc::new(FakeProbe::with(&[], 300));
    let mut s = session(probe.clone());
    let id = s.add_media("slow.mp4", None).unwrap();
    assert!(s.probe_in_flight(id));

    s.remove_clip(id).unwrap();
    assert!(!s.probe_in_flight(id));
    thread::sleep(Duration::from_millis(400));

    assert_eq!(s.pump(), 0);
    assert!(s.clip(id).is_none());
    assert!(!completed(&events(&s), id));
}

#[test]
fn abandoned_worker_result_is_discarded() {
    let probe = Arc::new(FakeProbe { stubborn: true, ..FakeProbe::with(&[], 150) });
    let mut cfg = AppConfig::default();
    cfg.preview.cancel_timeout_ms = 10;
    let mut s = Session::new(cfg, probe.clone());

    let id = s.add_media("stuck.mp4", None).unwrap();
    let other = s.add_media("fine.mp4", None).unwrap();
    thread::sleep(Duration::from_millis(20));
    s.remove_clip(id).unwrap();

    // The stubborn worker finishes after the cancel gave up on it.
    let deadline = Instant::now() + Duration::from_secs(2);
    while probe.finished.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(s.wait_for_probes(Duration::from_secs(2)));

    let evts = events(&s);
    assert!(!completed(&evts, id));
    assert!(completed(&evts, other));
    assert!(s.clip(other).unwrap().has_previews());
}

#[test]
fn removing_a_track_cancels_its_probes() {
    let probe = Arc::new(FakeProbe::with(&[], 5_000));
    let mut s = session(probe);
    s.add_media("a.mp4", None).unwrap();
    let b = s.add_media("b.mp4", None).unwrap();
    s.select(Some(b));
    assert_eq!(s.pending_probes(), 2);

    let started = Instant::now();
    assert_eq!(s.remove_track(0).unwrap(), 2);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(s.pending_probes(), 0);
    assert!(s.selection().is_empty());
    assert!(!s.can_undo());
    assert!(events(&s).contains(&StatusEvent::TrackRemoved { index: 0, clips: 2 }));
}

#[test]
fn removing_a_track_waits_once_for_stuck_workers() {
    let probe = Arc::new(FakeProbe { stubborn: true, ..FakeProbe::with(&[("a.mp4", 1.0)], 1_500) });
    let mut cfg = AppConfig::default();
    cfg.preview.cancel_timeout_ms = 200;
    let mut s = Session::new(cfg, probe.clone());
    s.add_track();
    for _ in 0..3 {
        s.add_media("a.mp4", Some(1)).unwrap();
    }
    let survivor = s.add_media("a.mp4", Some(0)).unwrap();
    thread::sleep(Duration::from_millis(30));
    assert!(probe.started.load(Ordering::SeqCst) >= 3);

    let started = Instant::now();
    assert_eq!(s.remove_track(1).unwrap(), 3);
    assert!(started.elapsed() < Duration::from_millis(500), "took {:?}", started.elapsed());
    assert_eq!(s.pending_probes(), 1);
    assert!(s.probe_in_flight(survivor));
}

#[test]
fn select_all_and_clear_selection_span_every_track() {
    let probe = Arc::new(FakeProbe::with(&[("a.mp4", 2.0)], 1));
    let mut s = session(probe);
    s.add_track();
    let a = s.add_media("a.mp4", Some(0)).unwrap();
    let b = s.add_media("a.mp4", Some(1)).unwrap();
    let c = s.add_media("a.mp4", Some(1)).unwrap();
    events(&s);

    assert_eq!(s.select_all(), 3);
    assert_eq!(s.selection(), vec![a, b, c]);
    assert!(s.render(b).unwrap().selection.is_some());
    assert_eq!(s.select_all(), 3);

    s.remove_clip(c).unwrap();
    assert_eq!(s.selection(), vec![a, b]);

    s.clear_selection();
    s.clear_selection();
    assert!(!s.is_selected(a));
    assert!(s.render(a).unwrap().selection.is_none());

    let selection_events: Vec<StatusEvent> = events(&s)
        .into_iter()
        .filter(|e| matches!(e, StatusEvent::SelectionChanged { .. }))
        .collect();
    assert_eq!(
        selection_events,
        vec![StatusEvent::SelectionChanged { count: 3 }, StatusEvent::SelectionChanged { count: 0 }],
    );

    assert!(s.select(Some(b)));
    assert_eq!(s.selection(), vec![b]);
    assert_eq!(events(&s), vec![StatusEvent::SelectionChanged { count: 1 }]);
}

#[test]
fn spill_to_new_track_emits_track_added() {
    let probe = Arc::new(FakeProbe::default());
    let mut s = session(probe);
    s.add_media("a.mp4", None).unwrap();
    s.remove_track(0).unwrap();
    events(&s);

    s.add_media("b.mp4", None).unwrap();
    let evts = events(&s);
    assert_eq!(evts[0], StatusEvent::TrackAdded { index: 0 });
    assert_eq!(evts[0].to_string(), "Track 1 added");
}

#[test]
fn undo_redo_round_trip_keeps_previews() {
    let probe = Arc::new(FakeProbe::with(&[("a.mp4", 3.0)], 1));
    let mut s = session(probe.clone());
    let a = s.add_media("a.mp4", None).unwrap();
    assert!(s.wait_for_probes(Duration::from_secs(5)));

    assert!(s.undo().unwrap());
    assert!(s.clip(a).is_none());
    assert!(s.redo().unwrap());
    assert!(s.clip(a).unwrap().has_previews());
    assert_eq!(s.pending_probes(), 0);
    assert_eq!(probe.started.load(Ordering::SeqCst), 1);

    events(&s);
    assert!(s.redo().is_ok_and(|did| !did));
    assert_eq!(events(&s), vec![StatusEvent::HistoryEmpty { redo: true }]);
}

#[test]
fn undo_of_remove_reprobes_when_previews_never_arrived() {
    let probe = Arc::new(FakeProbe::with(&[], 200));
    let mut s = session(probe);
    let a = s.add_media("a.mp4", None).unwrap();
    s.remove_clip(a).unwrap();

    assert!(s.undo().unwrap());
    assert!(s.probe_in_flight(a));
    assert!(s.wait_for_probes(Duration::from_secs(5)));
    assert!(s.clip(a).unwrap().has_previews());
}

#[test]
fn zoom_changes_are_clamped_and_reported_once() {
    let mut s = session(Arc::new(FakeProbe::default()));
    assert_eq!(s.zoom_in(), 1.25);
    assert_eq!(s.set_zoom(100.0), 5.0);
    assert_eq!(s.set_zoom(5.0), 5.0);
    assert_eq!(
        events(&s),
        vec![StatusEvent::ZoomChanged { zoom: 1.25 }, StatusEvent::ZoomChanged { zoom: 5.0 }],
    );
    assert!(s.undo().unwrap());
    assert_eq!(s.zoom(), 1.25);
}

#[test]
fn render_reflects_selection_and_zoom() {
    let probe = Arc::new(FakeProbe::with(&[("a.mp4", 2.0)], 1));
    let mut s = session(probe);
    let a = s.add_media("a.mp4", None).unwrap();
    assert!(s.wait_for_probes(Duration::from_secs(5)));

    let plain = s.render(a).unwrap();
    assert_eq!(plain.width, 200.0);
    assert_eq!(plain.thumbnail_tiles.len(), 5);
    assert!(plain.selection.is_none());

    assert!(s.select(Some(a)));
    assert!(!s.select(Some(ClipId::new())));
    s.set_zoom(0.5);
    let selected = s.render(a).unwrap();
    assert_eq!(selected.width, 100.0);
    assert!(selected.selection.is_some());
    assert_eq!(s.extent().width, 100.0);
}
