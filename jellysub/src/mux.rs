use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Subtitle embedding capability.
///
/// Same seam as [`crate::engine::SpeechEngine`]: the worker talks to this
/// trait so muxing can be faked in tests.
#[async_trait]
pub trait SubtitleMuxer: Send + Sync {
    /// Embed `subtitle` into `media` as a new track using `codec`.
    async fn mux(&self, media: &Path, subtitle: &Path, codec: &str) -> Result<()>;
}

/// Muxes subtitles with an external ffmpeg invocation.
///
/// Writes to a `<stem>.muxing.<ext>` sibling and atomically replaces the
/// original on success, so a failed mux never leaves the media truncated.
pub struct FfmpegMuxer {
    ffmpeg_path: String,
    /// Subtitle track language metadata, when the config names a language.
    language: Option<String>,
}

impl FfmpegMuxer {
    pub fn new(ffmpeg_path: impl Into<String>, language: Option<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            language,
        }
    }
}

#[async_trait]
impl SubtitleMuxer for FfmpegMuxer {
    async fn mux(&self, media: &Path, subtitle: &Path, codec: &str) -> Result<()> {
        let temp_path = muxing_path(media)?;

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-y")
            .arg("-i")
            .arg(media)
            .arg("-i")
            .arg(subtitle)
            // copy every existing stream except subtitles, then add ours
            .args(["-map", "0", "-map", "-0:s", "-map", "1:0", "-c", "copy", "-c:s"])
            .arg(codec);
        if let Some(lang) = &self.language {
            cmd.arg("-metadata:s:s:0").arg(format!("language={lang}"));
        }
        cmd.arg(&temp_path);

        info!(media = %media.display(), codec, "muxing subtitles");

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Mux(format!(
                    "{} not found — install ffmpeg or set ffmpeg_path",
                    self.ffmpeg_path
                ))
            } else {
                Error::Mux(format!("failed to run {}: {e}", self.ffmpeg_path))
            }
        })?;

        if !output.status.success() {
            remove_quietly(&temp_path).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr_truncated: String = stderr.chars().take(1000).collect();
            return Err(Error::Mux(format!(
                "ffmpeg exited with {}: {stderr_truncated}",
                output.status
            )));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, media).await {
            remove_quietly(&temp_path).await;
            return Err(Error::Mux(format!(
                "failed to replace {} after mux: {e}",
                media.display()
            )));
        }

        debug!(media = %media.display(), "mux complete");
        Ok(())
    }
}

/// Temp sibling written during the mux: `<stem>.muxing.<ext>`.
fn muxing_path(media: &Path) -> Result<PathBuf> {
    let stem = media
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Mux(format!("unusable media file name: {}", media.display())))?;
    let name = match media.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.muxing.{ext}"),
        None => format!("{stem}.muxing"),
    };
    Ok(media.with_file_name(name))
}

async fn remove_quietly(path: &Path) {
    if tokio::fs::remove_file(path).await.is_err() {
        debug!(path = %path.display(), "no temp file to clean up");
    }
}
