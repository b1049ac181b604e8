// crates/clipline-core/src/render.rs
//
// Clip → render model. Pure: reads a clip and a scale, allocates geometry,
// mutates nothing. The drawing surface (outside this workspace) turns the
// model into pixels.
//
// Layout, relative to the clip's top-left corner:
//
//   y = 0                 ┌──────────── video band ────────────┐
//                         │ thumbnail tiles                    │
//   y = video_band        ├──────────── audio band ────────────┤
//                         │ waveform polyline + silence rects  │
//   y = video+audio band  └────────────────────────────────────┘

use std::ops::Range;

use serde::Serialize;

use crate::clip::Clip;
use crate::config::RenderConfig;
use crate::helpers::geometry::{Point, Rect};
use crate::media_types::Thumbnail;

/// How a tile's bitmap maps onto its rect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TileFit {
    /// Scale to the rect exactly (strip tiles).
    Stretch,
    /// Scale to cover the rect, cropping overflow (single frame).
    Crop,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThumbnailTile {
    /// Index into the clip's thumbnail frames (0 for placeholders).
    pub frame: usize,
    pub rect:  Rect,
    pub fit:   TileFit,
    /// Solid fill + caption for placeholder thumbnails.
    pub fill:  Option<[u8; 3]>,
    pub label: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Outline {
    pub rect:   Rect,
    pub stroke: f32,
    pub color:  [u8; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderModel {
    pub width:             f32,
    pub height:            f32,
    pub video_band:        Rect,
    pub audio_band:        Rect,
    pub thumbnail_tiles:   Vec<ThumbnailTile>,
    pub waveform_polyline: Vec<Point>,
    pub silence_rects:     Vec<Rect>,
    /// Present only when the clip is selected; never affects the geometry above.
    pub selection:         Option<Outline>,
}

/// Build the render model for `clip` at `pixels_per_second`.
pub fn render_clip(clip: &Clip, pixels_per_second: f64, selected: bool, cfg: &RenderConfig) -> RenderModel {
    let width  = (clip.duration() * pixels_per_second).max(0.0) as f32;
    let height = cfg.clip_height();

    let video_band = Rect::new(0.0, 0.0, width, cfg.video_band_height);
    let audio_band = Rect::new(0.0, cfg.video_band_height, width, cfg.audio_band_height);

    let waveform = clip.waveform();
    let step_x   = sample_step(width, waveform.len());

    RenderModel {
        width,
        height,
        video_band,
        audio_band,
        thumbnail_tiles:   thumbnail_tiles(clip.thumbnail(), &video_band),
        waveform_polyline: waveform_polyline(waveform, step_x, &audio_band),
        silence_rects:     silence_rects(waveform, cfg.silence_threshold, step_x, &audio_band),
        selection: selected.then(|| Outline {
            rect:   Rect::new(0.0, 0.0, width, height),
            stroke: cfg.selection_stroke,
            color:  cfg.selection_color,
        }),
    }
}

/// Maximal runs of consecutive samples strictly below `threshold`, as index
/// ranges. Deterministic: the same input always yields the same runs.
///
/// ```
/// use clipline_core::render::silence_runs;
/// let runs = silence_runs(&[0.0, 0.5, 0.01, 0.02, 0.9, 0.0], 0.05);
/// assert_eq!(runs, vec![0..1, 2..4, 5..6]);
/// ```
pub fn silence_runs(waveform: &[f32], threshold: f32) -> Vec<Range<usize>> {
    let mut runs  = Vec::new();
    let mut start = None;
    for (i, &v) in waveform.iter().enumerate() {
        match (v < threshold, start) {
            (true, None)     => start = Some(i),
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..waveform.len());
    }
    runs
}

/// Horizontal distance between consecutive waveform points.
fn sample_step(width: f32, samples: usize) -> f32 {
    if samples > 1 { width / (samples - 1) as f32 } else { 0.0 }
}

fn thumbnail_tiles(thumb: &Thumbnail, band: &Rect) -> Vec<ThumbnailTile> {
    match thumb {
        Thumbnail::Pending => Vec::new(),
        Thumbnail::Placeholder { kind, .. } => vec![ThumbnailTile {
            frame: 0,
            rect:  *band,
            fit:   TileFit::Stretch,
            fill:  Some(kind.color()),
            label: Some(kind.label()),
        }],
        Thumbnail::Frames(frames) if frames.len() == 1 => vec![ThumbnailTile {
            frame: 0,
            rect:  *band,
            fit:   TileFit::Crop,
            fill:  None,
            label: None,
        }],
        Thumbnail::Frames(frames) => {
            let tile_w = band.width / frames.len() as f32;
            (0..frames.len())
                .map(|i| ThumbnailTile {
                    frame: i,
                    rect:  Rect::new(band.x + i as f32 * tile_w, band.y, tile_w, band.height),
                    fit:   TileFit::Stretch,
                    fill:  None,
                    label: None,
                })
                .collect()
        }
    }
}

fn waveform_polyline(waveform: &[f32], step_x: f32, band: &Rect) -> Vec<Point> {
    let bottom = band.bottom();
    waveform.iter()
        .enumerate()
        .map(|(i, &s)| Point::new(band.x + i as f32 * step_x, bottom - s * band.height))
        .collect()
}

fn silence_rects(waveform: &[f32], threshold: f32, step_x: f32, band: &Rect) -> Vec<Rect> {
    silence_runs(waveform, threshold)
        .into_iter()
        .map(|run| {
            let x0 = band.x + run.start as f32 * step_x;
            // A run still open at the last sample reaches the clip's right edge.
            let x1 = if run.end == waveform.len() {
                band.right()
            } else {
                band.x + run.end as f32 * step_x
            };
            Rect::from_x_range(x0, x1, band.y, band.height)
        })
        .collect()
}
