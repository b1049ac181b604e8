// crates/clipline-media/src/scheduler.rs
//
// ProbeScheduler: runs MediaProbe::previews on background threads and hands
// results back to the control thread over a channel.
//
// Workers never touch timeline state. Each request is keyed by the clip's
// ClipId; a result is only handed out while that id is still in flight, so
// output for cancelled or removed clips is dropped here before the session
// ever sees it.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use parking_lot::{Condvar, Mutex};

use clipline_core::{
    CancelToken, ClipId, MediaProbe, PlaceholderKind, PreviewConfig, Previews, ProbeResult, Thumbnail,
};

// ── Internal types ────────────────────────────────────────────────────────────

/// How a cancelled request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Nothing was running for that id.
    NotInFlight,
    /// The worker exited within the timeout.
    Joined,
    /// The worker was still busy at the deadline. It is left to finish on its
    /// own; its result will be discarded.
    Abandoned,
}

struct InFlight {
    cancel: CancelToken,
    /// Never sent on; disconnects when the worker thread exits.
    done:   Receiver<()>,
}

/// Caps concurrently running extractions: (active_count, Condvar).
struct ProbeSemaphore {
    active: Mutex<u32>,
    cvar:   Condvar,
    limit:  u32,
}

/// RAII release: decrements the count and wakes the next waiter on drop.
struct Permit(Arc<ProbeSemaphore>);

impl ProbeSemaphore {
    fn new(limit: u32) -> Self {
        Self { active: Mutex::new(0), cvar: Condvar::new(), limit: limit.max(1) }
    }

    /// Block until a slot frees up. Gives up (None) once `cancel` is set so a
    /// queued request does not hold its thread until a slot opens.
    fn acquire(self: &Arc<Self>, cancel: &CancelToken) -> Option<Permit> {
        let mut active = self.active.lock();
        while *active >= self.limit {
            if cancel.is_cancelled() {
                return None;
            }
            self.cvar.wait_for(&mut active, Duration::from_millis(25));
        }
        *active += 1;
        Some(Permit(Arc::clone(self)))
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        *self.0.active.lock() -= 1;
        self.0.cvar.notify_one();
    }
}

// ── ProbeScheduler ────────────────────────────────────────────────────────────

pub struct ProbeScheduler {
    probe:          Arc<dyn MediaProbe>,
    tx:             Sender<ProbeResult>,
    rx:             Receiver<ProbeResult>,
    in_flight:      HashMap<ClipId, InFlight>,
    sem:            Arc<ProbeSemaphore>,
    cancel_timeout: Duration,
    /// Thumbnail size for the stand-in sent when `previews` panics.
    tile:           (u32, u32),
}

impl ProbeScheduler {
    pub fn new(probe: Arc<dyn MediaProbe>, config: &PreviewConfig) -> Self {
        let (tx, rx) = unbounded();
        Self {
            probe,
            tx,
            rx,
            in_flight:      HashMap::new(),
            sem:            Arc::new(ProbeSemaphore::new(config.probe_concurrency)),
            cancel_timeout: config.cancel_timeout(),
            tile:           (config.thumbnail_width.max(1), config.thumbnail_height.max(1)),
        }
    }

    /// Start extracting previews for `id`. At most one request per id runs at
    /// a time; re-submitting while one is in flight returns its token.
    pub fn submit(&mut self, id: ClipId, path: PathBuf, duration: f64) -> CancelToken {
        if let Some(job) = self.in_flight.get(&id) {
            return job.cancel.clone();
        }

        let cancel             = CancelToken::new();
        let (done_tx, done_rx) = bounded::<()>(1);
        let worker_cancel      = cancel.clone();
        let probe              = Arc::clone(&self.probe);
        let tx                 = self.tx.clone();
        let sem                = Arc::clone(&self.sem);
        let (tile_w, tile_h)   = self.tile;

        debug!("[probe] submit {id} ← {}", path.display());
        thread::spawn(move || {
            let _done = done_tx;
            let Some(permit) = sem.acquire(&worker_cancel) else {
                debug!("[probe] {id} cancelled while queued");
                return;
            };
            if worker_cancel.is_cancelled() { return; }

            // A panic in `previews` still delivers exactly once, as an error stand-in.
            let previews = panic::catch_unwind(AssertUnwindSafe(|| {
                probe.previews(&path, duration, &worker_cancel)
            }))
            .unwrap_or_else(|_| {
                warn!("[probe] {id} panicked on {}, using placeholder", path.display());
                Previews {
                    thumbnail: Thumbnail::placeholder(PlaceholderKind::Error, tile_w, tile_h),
                    waveform:  Vec::new(),
                }
            });
            drop(permit);

            if worker_cancel.is_cancelled() {
                debug!("[probe] {id} cancelled, result dropped");
                return;
            }
            let _ = tx.send(ProbeResult { id, previews });
        });

        self.in_flight.insert(id, InFlight { cancel: cancel.clone(), done: done_rx });
        cancel
    }

    pub fn in_flight(&self, id: ClipId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Number of requests submitted but not yet handed out or cancelled.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Next completed result, without blocking. Stale results (id no longer in
    /// flight) are dropped along the way.
    pub fn try_recv(&mut self) -> Option<ProbeResult> {
        while let Ok(result) = self.rx.try_recv() {
            if let Some(r) = self.accept(result) {
                return Some(r);
            }
        }
        None
    }

    /// Like `try_recv`, but waits up to `timeout` for a result to arrive.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<ProbeResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let result = self.rx.recv_deadline(deadline).ok()?;
            if let Some(r) = self.accept(result) {
                return Some(r);
            }
        }
    }

    fn accept(&mut self, result: ProbeResult) -> Option<ProbeResult> {
        if self.in_flight.remove(&result.id).is_some() {
            Some(result)
        } else {
            debug!("[probe] discarded late result for {}", result.id);
            None
        }
    }

    /// Signal the worker for `id` and wait (bounded) for it to exit.
    pub fn cancel(&mut self, id: ClipId) -> CancelOutcome {
        let Some(job) = self.in_flight.remove(&id) else {
            return CancelOutcome::NotInFlight;
        };
        job.cancel.cancel();
        let outcome = wait_until(&job.done, Instant::now() + self.cancel_timeout);
        if outcome == CancelOutcome::Abandoned {
            warn!("[probe] {id} did not stop within {:?}, abandoning", self.cancel_timeout);
        }
        outcome
    }

    /// Cancel the requests for `ids`. All tokens are set first, then the
    /// workers share one deadline. Returns how many were abandoned.
    pub fn cancel_many(&mut self, ids: &[ClipId]) -> usize {
        let jobs: Vec<InFlight> = ids.iter().filter_map(|id| self.in_flight.remove(id)).collect();
        self.stop(jobs)
    }

    /// Cancel every in-flight request against one shared deadline. Returns
    /// how many were abandoned.
    pub fn cancel_all(&mut self) -> usize {
        let jobs: Vec<InFlight> = self.in_flight.drain().map(|(_, job)| job).collect();
        self.stop(jobs)
    }

    fn stop(&self, jobs: Vec<InFlight>) -> usize {
        if jobs.is_empty() {
            return 0;
        }
        for job in &jobs {
            job.cancel.cancel();
        }
        let deadline  = Instant::now() + self.cancel_timeout;
        let abandoned = jobs.iter()
            .filter(|job| wait_until(&job.done, deadline) == CancelOutcome::Abandoned)
            .count();
        if abandoned > 0 {
            warn!("[probe] {abandoned} of {} workers abandoned after {:?}", jobs.len(), self.cancel_timeout);
        } else {
            debug!("[probe] cancelled {} workers", jobs.len());
        }
        abandoned
    }
}

impl Drop for ProbeScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn wait_until(done: &Receiver<()>, deadline: Instant) -> CancelOutcome {
    match done.recv_deadline(deadline) {
        Err(RecvTimeoutError::Timeout) => CancelOutcome::Abandoned,
        _                              => CancelOutcome::Joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use clipline_core::Bitmap;

    /// Sleeps for `delay`, polling the token unless `stubborn`.
    #[derive(Default)]
    struct SlowProbe {
        delay:      Duration,
        stubborn:   bool,
        running:    AtomicUsize,
        peak:       AtomicUsize,
        saw_cancel: AtomicBool,
    }

    impl SlowProbe {
        fn new(delay_ms: u64) -> Self {
            Self { delay: Duration::from_millis(delay_ms), ..Default::default() }
        }
    }

    impl MediaProbe for SlowProbe {
        fn duration(&self, _path: &Path) -> f64 {
            1.0
        }

        fn previews(&self, _path: &Path, _duration: f64, cancel: &CancelToken) -> Previews {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let end = Instant::now() + self.delay;
            while Instant::now() < end {
                if !self.stubborn && cancel.is_cancelled() {
                    self.saw_cancel.store(true, Ordering::SeqCst);
                    break;
                }
                thread::sleep(Duration::from_millis(2));
            }
            self.running.fetch_sub(1, Ordering::SeqCst);
            Previews {
                thumbnail: Thumbnail::Frames(vec![Bitmap::filled(2, 2, [1, 2, 3])]),
                waveform:  vec![0.5; 4],
            }
        }
    }

    /// Panics on every `previews` call.
    struct Exploding;

    impl MediaProbe for Exploding {
        fn duration(&self, _path: &Path) -> f64 {
            1.0
        }

        fn previews(&self, path: &Path, _duration: f64, _cancel: &CancelToken) -> Previews {
            panic!("decoder blew up on {}", path.display());
        }
    }

    fn config(concurrency: u32, timeout_ms: u64) -> PreviewConfig {
        PreviewConfig { probe_concurrency: concurrency, cancel_timeout_ms: timeout_ms, ..Default::default() }
    }

    #[test]
    fn delivers_one_result_per_request() {
        let mut s = ProbeScheduler::new(Arc::new(SlowProbe::new(5)), &config(4, 1000));
        let id = ClipId::new();
        s.submit(id, "a.mp4".into(), 1.0);
        assert!(s.in_flight(id));

        let r = s.recv_timeout(Duration::from_secs(5)).expect("result");
        assert_eq!(r.id, id);
        assert_eq!(r.previews.waveform.len(), 4);
        assert_eq!(s.pending(), 0);
        assert!(s.recv_timeout(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn resubmit_returns_the_same_token() {
        let mut s = ProbeScheduler::new(Arc::new(SlowProbe::new(200)), &config(4, 1000));
        let id = ClipId::new();
        let a = s.submit(id, "a.mp4".into(), 1.0);
        let b = s.submit(id, "a.mp4".into(), 1.0);
        a.cancel();
        assert!(b.is_cancelled());
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn cancel_joins_a_cooperative_worker_and_drops_its_result() {
        let probe = Arc::new(SlowProbe::new(2_000));
        let mut s = ProbeScheduler::new(probe.clone(), &config(4, 1000));
        let id = ClipId::new();
        let token = s.submit(id, "a.mp4".into(), 1.0);
        thread::sleep(Duration::from_millis(20));

        assert_eq!(s.cancel(id), CancelOutcome::Joined);
        assert!(token.is_cancelled());
        assert!(!s.in_flight(id));
        assert!(s.recv_timeout(Duration::from_millis(100)).is_none());
    }

    #[test]
    fn cancel_gives_up_on_a_stubborn_worker() {
        let probe = Arc::new(SlowProbe { stubborn: true, ..SlowProbe::new(500) });
        let mut s = ProbeScheduler::new(probe, &config(4, 30));
        let id = ClipId::new();
        s.submit(id, "a.mp4".into(), 1.0);
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        assert_eq!(s.cancel(id), CancelOutcome::Abandoned);
        assert!(started.elapsed() < Duration::from_millis(400));
        // It finishes eventually, but its output never comes out.
        assert!(s.recv_timeout(Duration::from_millis(700)).is_none());
    }

    #[test]
    fn cancel_unknown_id_is_not_in_flight() {
        let mut s = ProbeScheduler::new(Arc::new(SlowProbe::new(1)), &config(4, 1000));
        assert_eq!(s.cancel(ClipId::new()), CancelOutcome::NotInFlight);
    }

    #[test]
    fn concurrency_is_capped() {
        let probe = Arc::new(SlowProbe::new(40));
        let mut s = ProbeScheduler::new(probe.clone(), &config(2, 1000));
        for _ in 0..6 {
            s.submit(ClipId::new(), "a.mp4".into(), 1.0);
        }
        let mut got = 0;
        while got < 6 {
            s.recv_timeout(Duration::from_secs(5)).expect("result");
            got += 1;
        }
        assert!(probe.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn drop_cancels_running_workers() {
        let probe = Arc::new(SlowProbe::new(5_000));
        {
            let mut s = ProbeScheduler::new(probe.clone(), &config(4, 1000));
            s.submit(ClipId::new(), "a.mp4".into(), 1.0);
            s.submit(ClipId::new(), "b.mp4".into(), 1.0);
            thread::sleep(Duration::from_millis(20));
        }
        assert!(probe.saw_cancel.load(Ordering::SeqCst));
        assert_eq!(probe.running.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panic_in_previews_still_delivers_an_error_placeholder() {
        let cfg   = config(1, 1000);
        let mut s = ProbeScheduler::new(Arc::new(Exploding), &cfg);
        let id    = ClipId::new();
        s.submit(id, "broken.mp4".into(), 1.0);

        let r = s.recv_timeout(Duration::from_secs(5)).expect("result");
        assert_eq!(r.id, id);
        assert!(r.previews.waveform.is_empty());
        match r.previews.thumbnail {
            Thumbnail::Placeholder { kind, bitmap } => {
                assert_eq!(kind, PlaceholderKind::Error);
                assert_eq!((bitmap.width, bitmap.height), (cfg.thumbnail_width, cfg.thumbnail_height));
            }
            other => panic!("expected error placeholder, got {other:?}"),
        }
        assert_eq!(s.pending(), 0);

        // The permit was released and a resubmit gets a fresh worker.
        let again = s.submit(id, "broken.mp4".into(), 1.0);
        assert!(!again.is_cancelled());
        assert!(s.recv_timeout(Duration::from_secs(5)).is_some());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn cancel_many_shares_one_deadline() {
        let probe = Arc::new(SlowProbe { stubborn: true, ..SlowProbe::new(600) });
        let mut s = ProbeScheduler::new(probe, &config(4, 100));
        let ids: Vec<ClipId> = (0..4).map(|_| ClipId::new()).collect();
        for id in &ids {
            s.submit(*id, "a.mp4".into(), 1.0);
        }
        let keep = ClipId::new();
        s.submit(keep, "b.mp4".into(), 1.0);
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        assert_eq!(s.cancel_many(&ids), 4);
        assert!(started.elapsed() < Duration::from_millis(350));
        assert!(ids.iter().all(|id| !s.in_flight(*id)));
        assert!(s.in_flight(keep));
        assert_eq!(s.cancel_many(&ids), 0);
    }
}
