// crates/clipline-core/src/helpers/mod.rs
//
// Small pure helpers shared by the timeline, the renderer and clipline-media.

pub mod envelope;
pub mod geometry;
pub mod time;
