use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// One path rewrite rule. Rules are tried in declaration order and the
/// first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathMapping {
    /// Pattern (when `regex`) or literal path prefix to match.
    pub source: String,
    /// Replacement text; may contain `$1`-style back-references for regex rules.
    pub target: String,
    #[serde(default)]
    pub regex: bool,
}

/// Inference device for the speech engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cuda,
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda => write!(f, "cuda"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

/// Process-wide configuration, loaded once at startup and immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub path_mappings: Vec<PathMapping>,
    pub model: String,
    /// Language code, or `null` for auto-detection.
    pub language: Option<String>,
    pub device: Device,
    pub compute_type: String,
    pub overwrite_existing: bool,
    pub srt_suffix: String,
    pub max_concurrent_jobs: usize,
    pub host: String,
    pub port: u16,
    pub mux_subtitles: bool,
    pub ffmpeg_path: String,
    /// Media extension (with leading dot) → subtitle codec for muxing.
    pub subtitle_codec_map: HashMap<String, String>,
    /// Caption texts dropped from the SRT (engine hallucination suppression).
    pub blacklist_phrases: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            path_mappings: Vec::new(),
            model: "medium".to_string(),
            language: Some("ja".to_string()),
            device: Device::Cuda,
            compute_type: "float16".to_string(),
            overwrite_existing: false,
            srt_suffix: ".ja.srt".to_string(),
            max_concurrent_jobs: 1,
            host: "0.0.0.0".to_string(),
            port: 9876,
            mux_subtitles: true,
            ffmpeg_path: "ffmpeg".to_string(),
            subtitle_codec_map: default_codec_map(),
            blacklist_phrases: Vec::new(),
        }
    }
}

fn default_codec_map() -> HashMap<String, String> {
    [
        (".mp4", "mov_text"),
        (".m4v", "mov_text"),
        (".mov", "mov_text"),
        (".webm", "webvtt"),
    ]
    .into_iter()
    .map(|(ext, codec)| (ext.to_string(), codec.to_string()))
    .collect()
}

const FALLBACK_PORT: u16 = 9876;

impl AppConfig {
    /// Load configuration from a JSON file. A missing file yields the
    /// defaults; a present but malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: AppConfig = serde_json::from_str(&data)?;
            info!(path = %path.display(), "configuration loaded");
            config
        } else {
            info!(path = %path.display(), "no config file, using defaults");
            AppConfig::default()
        };
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Clamp out-of-range values rather than rejecting them.
    fn normalized(mut self) -> Self {
        if self.max_concurrent_jobs < 1 {
            self.max_concurrent_jobs = 1;
        }
        if !self.srt_suffix.starts_with('.') {
            self.srt_suffix = format!(".{}", self.srt_suffix);
        }
        if self.port == 0 {
            self.port = FALLBACK_PORT;
        }
        self
    }

    /// Fail fast on mapping rules that can never apply.
    fn validate(&self) -> Result<()> {
        for rule in &self.path_mappings {
            if rule.regex {
                regex::Regex::new(&rule.source).map_err(|e| Error::InvalidMappingPattern {
                    pattern: rule.source.clone(),
                    source: e,
                })?;
            } else if rule.source.is_empty() {
                return Err(Error::Config(
                    "path mapping with empty source prefix".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Subtitle codec for the media file's extension, if any is configured.
    pub fn subtitle_codec(&self, media: &Path) -> Option<&str> {
        let ext = media.extension()?.to_str()?.to_lowercase();
        self.subtitle_codec_map
            .get(&format!(".{ext}"))
            .map(String::as_str)
    }
}
