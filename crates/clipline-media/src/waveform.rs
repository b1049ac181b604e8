// crates/clipline-media/src/waveform.rs
//
// Waveform extraction via the linked FFmpeg: decode the best audio stream,
// resample to mono f32 at a fixed rate, stop after a bounded window, then fold
// the samples into a normalised envelope.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::format::sample::{Sample, Type as SampleType};
use ffmpeg::media::Type as MediaType;
use ffmpeg::software::resampling;
use ffmpeg::util::channel_layout::ChannelLayout;
use ffmpeg::util::frame::audio::Audio as AudioFrame;

use clipline_core::helpers::envelope::envelope;
use clipline_core::{CancelToken, PreviewConfig};

/// Packed (interleaved) f32; with one channel everything sits in plane 0.
const OUT_FMT: Sample = Sample::F32(SampleType::Packed);

/// Envelope for `path`, or empty when there is no decodable audio.
pub fn extract_waveform(path: &Path, duration: f64, cfg: &PreviewConfig, cancel: &CancelToken) -> Vec<f32> {
    let window = cfg.waveform_window(duration);
    let rate   = cfg.waveform_sample_rate.max(1);
    let limit  = (window * rate as f64).ceil() as usize;

    match decode_mono(path, rate, limit, cancel) {
        Ok(samples) if samples.is_empty() => {
            debug!("[media] waveform: no samples for {}", path.display());
            Vec::new()
        }
        Ok(samples) => {
            let env = envelope(&samples, cfg.waveform_buckets);
            info!(
                "[media] waveform {} buckets from {} samples ← {}",
                env.len(), samples.len(), path.display(),
            );
            env
        }
        Err(_) if cancel.is_cancelled() => Vec::new(),
        Err(e) => {
            warn!("[media] waveform failed for '{}': {e:#}", path.display());
            Vec::new()
        }
    }
}

/// Decode up to `limit` mono samples at `rate` Hz. A file without an audio
/// stream yields an empty vector, not an error.
pub fn decode_mono(path: &Path, rate: u32, limit: usize, cancel: &CancelToken) -> Result<Vec<f32>> {
    let mut ictx = input(path).with_context(|| format!("open {}", path.display()))?;

    let audio_idx = match ictx.streams().best(MediaType::Audio) {
        Some(s) => s.index(),
        None    => return Ok(Vec::new()),
    };

    let mut decoder = {
        let Some(stream) = ictx.stream(audio_idx) else { bail!("stream {audio_idx} vanished") };
        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .context("codec context")?;
        context.decoder().audio().context("audio decoder")?
    };

    // Built on the first decoded frame, once the real source format is known.
    let mut resampler: Option<resampling::Context> = None;
    let mut pcm: Vec<f32> = Vec::new();

    for (stream, packet) in ictx.packets().flatten() {
        if cancel.is_cancelled() {
            bail!("cancelled");
        }
        if pcm.len() >= limit { break; }
        if stream.index() != audio_idx { continue; }
        if decoder.send_packet(&packet).is_err() { continue; }

        let mut frame = AudioFrame::empty();
        while decoder.receive_frame(&mut frame).is_ok() {
            append_resampled(&frame, rate, &mut resampler, &mut pcm)?;
        }
    }

    if pcm.len() < limit {
        let _ = decoder.send_eof();
        let mut frame = AudioFrame::empty();
        while decoder.receive_frame(&mut frame).is_ok() {
            append_resampled(&frame, rate, &mut resampler, &mut pcm)?;
        }
    }

    pcm.truncate(limit);
    Ok(pcm)
}

/// Resample `frame` to mono OUT_FMT at `rate` and append the samples to `out`.
fn append_resampled(
    frame:     &AudioFrame,
    rate:      u32,
    resampler: &mut Option<resampling::Context>,
    out:       &mut Vec<f32>,
) -> Result<()> {
    let src_channels = frame.ch_layout().channels();
    let needs_resample = frame.format() != OUT_FMT
        || frame.rate()                != rate
        || src_channels                != 1;

    if !needs_resample {
        append_packed_f32(frame, out);
        return Ok(());
    }

    if resampler.is_none() {
        // Mono sources are declared as MONO so swr reads the channel count right.
        let src_layout = if src_channels >= 2 { frame.ch_layout() } else { ChannelLayout::MONO };
        let ctx = resampling::Context::get2(
            frame.format(), src_layout,        frame.rate(),
            OUT_FMT,        ChannelLayout::MONO, rate,
        ).context("create audio resampler")?;
        *resampler = Some(ctx);
    }
    let Some(rs) = resampler.as_mut() else { return Ok(()) };

    let mut resampled = AudioFrame::empty();
    if rs.run(frame, &mut resampled).is_ok() && resampled.samples() > 0 {
        append_packed_f32(&resampled, out);
    }
    Ok(())
}

fn append_packed_f32(frame: &AudioFrame, out: &mut Vec<f32>) {
    // plane 0 may be padded past the sample count
    let n    = frame.samples() * frame.ch_layout().channels().max(1) as usize;
    let data = frame.data(0);
    out.extend(
        data.chunks_exact(4)
            .take(n)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
    );
}
