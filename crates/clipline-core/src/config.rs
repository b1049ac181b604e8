// crates/clipline-core/src/config.rs
//
// Tunables for the timeline, the clip renderer and the media probe.
//
// Every struct is `#[serde(default)]`, so a config file only needs the keys
// it wants to override. clipline-app loads these from JSON; tests build them
// with `Default` and struct-update syntax.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Pixels per second at zoom 1.0.
    pub base_pixels_per_second: f64,
    pub min_zoom:               f64,
    pub max_zoom:               f64,
    /// Multiplicative step applied by zoom_in / zoom_out.
    pub zoom_step:              f64,
    pub initial_zoom:           f64,
    pub track_height:           f64,
    pub track_spacing:          f64,
    pub render:                 RenderConfig,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            base_pixels_per_second: 100.0,
            min_zoom:               0.25,
            max_zoom:               5.0,
            zoom_step:              1.25,
            initial_zoom:           1.0,
            track_height:           100.0,
            track_spacing:          10.0,
            render:                 RenderConfig::default(),
        }
    }
}

impl TimelineConfig {
    /// Clamp `zoom` into `[min_zoom, max_zoom]`. Tolerates a config where the
    /// bounds were written the wrong way round.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        let lo = self.min_zoom.min(self.max_zoom);
        let hi = self.min_zoom.max(self.max_zoom);
        zoom.clamp(lo, hi)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub video_band_height: f32,
    pub audio_band_height: f32,
    /// Waveform samples strictly below this are highlighted as silence.
    pub silence_threshold: f32,
    pub selection_stroke:  f32,
    pub selection_color:   [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            video_band_height: 60.0,
            audio_band_height: 40.0,
            silence_threshold: 0.05,
            selection_stroke:  2.0,
            selection_color:   [255, 200, 0],
        }
    }
}

impl RenderConfig {
    pub fn clip_height(&self) -> f32 {
        self.video_band_height + self.audio_band_height
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Used when the source reports no usable duration (and for stills).
    pub default_duration:     f64,
    /// 1 = single representative frame, N = evenly spaced strip.
    pub thumbnail_frames:     usize,
    pub thumbnail_width:      u32,
    pub thumbnail_height:     u32,
    pub waveform_buckets:     usize,
    pub waveform_sample_rate: u32,
    /// Hard cap on decoded audio, independent of clip length.
    pub waveform_max_seconds: f64,
    pub probe_concurrency:    u32,
    pub cancel_timeout_ms:    u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            default_duration:     5.0,
            thumbnail_frames:     5,
            thumbnail_width:      80,
            thumbnail_height:     60,
            waveform_buckets:     100,
            waveform_sample_rate: 22_050,
            waveform_max_seconds: 300.0,
            probe_concurrency:    4,
            cancel_timeout_ms:    1_000,
        }
    }
}

impl PreviewConfig {
    pub fn cancel_timeout(&self) -> Duration {
        Duration::from_millis(self.cancel_timeout_ms)
    }

    /// Seconds of audio to decode for a clip of `duration` seconds.
    pub fn waveform_window(&self, duration: f64) -> f64 {
        let d = if duration.is_finite() && duration > 0.0 { duration } else { self.default_duration };
        d.min(self.waveform_max_seconds)
    }
}
