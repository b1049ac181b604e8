// crates/clipline-app/src/report.rs
//
// Serializable snapshot of the session layout, printed by the `clipline`
// binary. Geometry comes straight from the render model at the current zoom.

use serde::Serialize;

use clipline_core::helpers::geometry::Rect;
use clipline_core::{ClipId, Extent, MediaKind, Thumbnail};

use crate::session::Session;

#[derive(Debug, Serialize)]
pub struct LayoutReport {
    pub zoom:              f64,
    pub pixels_per_second: f64,
    pub extent:            Extent,
    pub tracks:            Vec<TrackReport>,
}

#[derive(Debug, Serialize)]
pub struct TrackReport {
    pub index: usize,
    pub clips: Vec<ClipReport>,
}

#[derive(Debug, Serialize)]
pub struct ClipReport {
    pub id:            ClipId,
    pub source:        String,
    pub kind:          MediaKind,
    pub offset:        f64,
    pub duration:      f64,
    pub width:         f32,
    pub thumbnail:     &'static str,
    pub frames:        usize,
    pub waveform:      Vec<f32>,
    pub silence_rects: Vec<Rect>,
    pub selected:      bool,
}

impl LayoutReport {
    pub fn from_session(session: &Session) -> Self {
        let tl = session.timeline();
        let tracks = tl.tracks()
            .iter()
            .enumerate()
            .map(|(index, track)| TrackReport {
                index,
                clips: track.items()
                    .iter()
                    .filter_map(|clip| {
                        let model = session.render(clip.id())?;
                        Some(ClipReport {
                            id:            clip.id(),
                            source:        clip.source().display().to_string(),
                            kind:          clip.kind(),
                            offset:        clip.offset(),
                            duration:      clip.duration(),
                            width:         model.width,
                            thumbnail:     thumbnail_state(clip.thumbnail()),
                            frames:        clip.thumbnail().frame_count(),
                            waveform:      clip.waveform().to_vec(),
                            silence_rects: model.silence_rects,
                            selected:      model.selection.is_some(),
                        })
                    })
                    .collect(),
            })
            .collect();

        Self {
            zoom:              tl.zoom(),
            pixels_per_second: tl.pixels_per_second(),
            extent:            tl.extent(),
            tracks,
        }
    }
}

fn thumbnail_state(thumb: &Thumbnail) -> &'static str {
    match thumb {
        Thumbnail::Pending                  => "pending",
        Thumbnail::Frames(_)                => "frames",
        Thumbnail::Placeholder { kind, .. } => kind.label(),
    }
}
