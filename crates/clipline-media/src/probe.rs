// crates/clipline-media/src/probe.rs
//
// FfmpegProbe: the MediaProbe implementation backed by the linked FFmpeg.
// Duration is a header read and cheap enough for the control thread; the
// previews (thumbnail strip + waveform) run on scheduler workers.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::media::Type;

use clipline_core::{CancelToken, MediaKind, MediaProbe, PreviewConfig, Previews};

use crate::thumbnail::extract_thumbnail;
use crate::waveform::extract_waveform;

#[derive(Clone, Debug, Default)]
pub struct FfmpegProbe {
    config: PreviewConfig,
}

impl FfmpegProbe {
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }
}

impl MediaProbe for FfmpegProbe {
    fn duration(&self, path: &Path) -> f64 {
        let fallback = self.config.default_duration;
        if MediaKind::from_path(path) == MediaKind::Image {
            return fallback;
        }
        match probe_duration(path) {
            Ok(Some(secs)) => {
                info!("[media] duration {secs:.2}s ← {}", path.display());
                secs
            }
            Ok(None) => {
                debug!("[media] duration unknown, using {fallback:.1}s ← {}", path.display());
                fallback
            }
            Err(e) => {
                warn!("[media] probe_duration failed for '{}': {e:#}", path.display());
                fallback
            }
        }
    }

    fn previews(&self, path: &Path, duration: f64, cancel: &CancelToken) -> Previews {
        let thumbnail = extract_thumbnail(path, duration, &self.config, cancel);
        if cancel.is_cancelled() {
            return Previews { thumbnail, waveform: Vec::new() };
        }
        let waveform = extract_waveform(path, duration, &self.config, cancel);
        Previews { thumbnail, waveform }
    }
}

/// Most precise source first: frame count over average frame rate of the
/// best video stream, then the container duration, then the stream duration.
fn probe_duration(path: &Path) -> Result<Option<f64>> {
    let ctx = input(path).with_context(|| format!("open {}", path.display()))?;

    if let Some(stream) = ctx.streams().best(Type::Video) {
        let frames = stream.frames();
        let rate   = stream.avg_frame_rate();
        if frames > 0 && rate.numerator() > 0 && rate.denominator() > 0 {
            let fps = rate.numerator() as f64 / rate.denominator() as f64;
            return Ok(Some(frames as f64 / fps));
        }
    }

    let container = ctx.duration();
    if container > 0 {
        return Ok(Some(container as f64 / ffmpeg::ffi::AV_TIME_BASE as f64));
    }

    if let Some(stream) = ctx.streams().best(Type::Video)
        .or_else(|| ctx.streams().best(Type::Audio))
    {
        let tb = stream.time_base();
        if stream.duration() > 0 && tb.denominator() > 0 {
            let d = stream.duration() as f64 * tb.numerator() as f64 / tb.denominator() as f64;
            if d > 0.0 {
                return Ok(Some(d));
            }
        }
    }
    Ok(None)
}
