// crates/clipline-media/src/helpers/mod.rs
//
// FFmpeg plumbing shared by the thumbnail and waveform extractors.

pub mod frame;
pub mod png;
pub mod seek;
