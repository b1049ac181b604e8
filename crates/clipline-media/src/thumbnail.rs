// crates/clipline-media/src/thumbnail.rs
//
// In-process thumbnail extraction: seek, decode the first frame, scale to a
// fixed RGB24 tile. Stills go through the same path (image2 demuxer, one
// frame). Never fails outward; errors become placeholder tiles.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::{input, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video;

use clipline_core::helpers::time::linspace;
use clipline_core::{Bitmap, CancelToken, MediaKind, PlaceholderKind, PreviewConfig, Thumbnail};

use crate::helpers::frame::destripe_rgb;
use crate::helpers::seek::seek_to_secs;

/// Build the thumbnail for `path`: a strip of `thumbnail_frames` tiles for
/// video, one tile for stills, a placeholder for audio-only or broken files.
pub fn extract_thumbnail(path: &Path, duration: f64, cfg: &PreviewConfig, cancel: &CancelToken) -> Thumbnail {
    let (w, h) = (cfg.thumbnail_width.max(1), cfg.thumbnail_height.max(1));
    let count = match MediaKind::from_path(path) {
        MediaKind::Image => 1,
        _                => cfg.thumbnail_frames.max(1),
    };

    match decode_strip(path, &linspace(duration, count), w, h, cancel) {
        Ok(Some(frames)) => {
            info!("[media] thumbnail {}x{} ×{} ← {}", w, h, frames.len(), path.display());
            Thumbnail::Frames(frames)
        }
        Ok(None) => {
            info!("[media] no video stream, audio placeholder ← {}", path.display());
            Thumbnail::placeholder(PlaceholderKind::Audio, w, h)
        }
        Err(_) if cancel.is_cancelled() => {
            debug!("[media] thumbnail cancelled ← {}", path.display());
            Thumbnail::placeholder(PlaceholderKind::Error, w, h)
        }
        Err(e) => {
            warn!("[media] thumbnail failed for '{}': {e:#}", path.display());
            Thumbnail::placeholder(PlaceholderKind::Error, w, h)
        }
    }
}

/// Decode one frame per timestamp. `Ok(None)` means the file has audio but no
/// video stream. A timestamp that yields no frame reuses the previous good one.
fn decode_strip(
    path:       &Path,
    timestamps: &[f64],
    width:      u32,
    height:     u32,
    cancel:     &CancelToken,
) -> Result<Option<Vec<Bitmap>>> {
    let mut ictx = input(path).with_context(|| format!("open {}", path.display()))?;

    let video_idx = match ictx.streams().best(Type::Video) {
        Some(s) => s.index(),
        None if ictx.streams().best(Type::Audio).is_some() => return Ok(None),
        None => bail!("no video or audio stream"),
    };

    let mut decoder = {
        let stream = ictx.stream(video_idx).ok_or_else(|| anyhow!("stream {video_idx} vanished"))?;
        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .context("codec context")?;
        context.decoder().video().context("video decoder")?
    };

    let mut scaler = SwsContext::get(
        decoder.format(), decoder.width(), decoder.height(),
        Pixel::RGB24, width, height, Flags::LANCZOS,
    ).context("thumbnail scaler")?;

    let mut frames: Vec<Bitmap> = Vec::with_capacity(timestamps.len());
    for &ts in timestamps {
        if cancel.is_cancelled() {
            bail!("cancelled");
        }
        if ts > 0.0 {
            seek_to_secs(&mut ictx, ts, "thumbnail");
            decoder.flush();
        }
        match first_frame(&mut ictx, video_idx, &mut decoder, cancel)? {
            Some(decoded) => {
                let mut rgb = Video::empty();
                scaler.run(&decoded, &mut rgb).context("scale")?;
                frames.push(destripe_rgb(&rgb, width, height));
            }
            None => match frames.last().cloned() {
                Some(prev) => {
                    debug!("[media] no frame at {ts:.2}s, reusing previous ← {}", path.display());
                    frames.push(prev);
                }
                None => debug!("[media] no frame at {ts:.2}s ← {}", path.display()),
            },
        }
    }

    if frames.is_empty() {
        bail!("no frame decoded");
    }
    Ok(Some(frames))
}

/// Decode forward from the demuxer's current position until one frame of the
/// video stream comes out, draining the decoder at end of file.
fn first_frame(
    ictx:      &mut ffmpeg::format::context::Input,
    video_idx: usize,
    decoder:   &mut ffmpeg::decoder::video::Video,
    cancel:    &CancelToken,
) -> Result<Option<Video>> {
    let mut decoded = Video::empty();
    for (stream, packet) in ictx.packets().flatten() {
        if cancel.is_cancelled() {
            bail!("cancelled");
        }
        if stream.index() != video_idx { continue; }
        if decoder.send_packet(&packet).is_err() { continue; }
        if decoder.receive_frame(&mut decoded).is_ok() {
            return Ok(Some(decoded));
        }
    }

    let _ = decoder.send_eof();
    if decoder.receive_frame(&mut decoded).is_ok() {
        return Ok(Some(decoded));
    }
    Ok(None)
}
