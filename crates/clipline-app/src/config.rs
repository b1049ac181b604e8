// crates/clipline-app/src/config.rs
//
// Application settings: one JSON document with a section per subsystem.
// Every field has a default, so `{}` or a partial file is valid.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use clipline_core::{PreviewConfig, TimelineConfig};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub timeline:      TimelineConfig,
    pub preview:       PreviewConfig,
    /// Maximum number of undo steps kept.
    pub history_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeline:      TimelineConfig::default(),
            preview:       PreviewConfig::default(),
            history_limit: 100,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// `path` when given, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None    => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn nested_sections_merge_with_defaults() {
        let cfg = AppConfig::from_json(r#"{
            "timeline": { "zoom_step": 2.0 },
            "preview":  { "thumbnail_frames": 1 }
        }"#).unwrap();
        assert_eq!(cfg.timeline.zoom_step, 2.0);
        assert_eq!(cfg.timeline.max_zoom, 5.0);
        assert_eq!(cfg.preview.thumbnail_frames, 1);
        assert_eq!(cfg.preview.waveform_buckets, 100);
        assert_eq!(cfg.history_limit, 100);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = AppConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(AppConfig::from_json("{ not json").is_err());
    }
}
