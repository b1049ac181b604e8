// crates/clipline-media/src/helpers/seek.rs
//
// Every thumbnail seek goes through here so the skip-at-zero guard and the
// soft-fail logging live in one place. Callers decide what a failed seek means.

use ffmpeg_the_third as ffmpeg;
use log::debug;

/// Seek `ictx` to the keyframe at or before `target_secs`.
///
/// Returns `true` when the seek succeeded or was skipped because the target is
/// the start of the file. Returns `false` on failure; the demuxer then keeps
/// decoding from its current position.
///
/// A backward seek (`..=ts`) is used so a target in the middle of a GOP still
/// produces a frame close to it instead of jumping to the next keyframe.
pub fn seek_to_secs(
    ictx:        &mut ffmpeg::format::context::Input,
    target_secs: f64,
    label:       &str,
) -> bool {
    if target_secs <= 0.0 || !target_secs.is_finite() {
        return true;
    }

    let seek_ts = (target_secs * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    match ictx.seek(seek_ts, ..=seek_ts) {
        Ok(()) => true,
        Err(e) => {
            debug!("[seek] soft-fail in {label} at {target_secs:.3}s: {e}");
            false
        }
    }
}
