// crates/clipline-media/src/lib.rs
//
// FFmpeg-backed media analysis for clipline. Talks to the session through the
// MediaProbe trait and ProbeResult channel only; never touches timeline state.
//
// To add a new preview kind:
//   1. Create a new module file here
//   2. Extend `Previews` in clipline-core
//   3. Call it from `FfmpegProbe::previews`

pub mod helpers;
pub mod probe;
pub mod scheduler;
pub mod thumbnail;
pub mod waveform;

pub use probe::FfmpegProbe;
pub use scheduler::{CancelOutcome, ProbeScheduler};
pub use helpers::png::SavePng;
