// crates/clipline-core/src/lib.rs
//
// Pure timeline data model. No ffmpeg, no threads, no UI handles.
// clipline-media and clipline-app build on top of this crate.

pub mod clip;
pub mod config;
pub mod error;
pub mod events;
pub mod helpers;
pub mod history;
pub mod media_types;
pub mod render;
pub mod timeline;
pub mod track;

pub use clip::{Clip, ClipId, Interval, MediaKind};
pub use config::{PreviewConfig, RenderConfig, TimelineConfig};
pub use error::TimelineError;
pub use events::StatusEvent;
pub use history::{Change, EditCommand, History};
pub use media_types::{Bitmap, CancelToken, MediaProbe, PlaceholderKind, Previews, ProbeData, ProbeResult, Thumbnail};
pub use render::{render_clip, silence_runs, RenderModel};
pub use timeline::{Extent, Placement, Timeline};
pub use track::Track;
