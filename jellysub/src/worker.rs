use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::engine::SpeechEngine;
use crate::error::{Error, Result};
use crate::mux::SubtitleMuxer;

/// An admitted transcription job: the request plus its mapped media path.
/// Held only in memory while the job runs; the log trace is all that remains.
#[derive(Debug, Clone)]
pub struct TranscriptionJob {
    pub title: String,
    pub item_id: String,
    pub media_path: PathBuf,
    /// Per-request override of the global `overwrite_existing` flag.
    pub overwrite: Option<bool>,
}

/// How a job ended. Failures are the error channel; a skip is not a failure.
#[derive(Debug)]
pub enum JobOutcome {
    Completed { srt_path: PathBuf, muxed: bool },
    SkippedExisting { srt_path: PathBuf },
}

/// Subtitle path for a media file: `<dir>/<stem><srt_suffix>`.
pub fn subtitle_path(media: &Path, srt_suffix: &str) -> PathBuf {
    let stem = media
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    media.with_file_name(format!("{stem}{srt_suffix}"))
}

/// Run one admitted job to completion: skip-existing check, engine
/// invocation, SRT write, then the optional mux.
///
/// A mux failure is logged and downgraded; the standalone SRT already on
/// disk stays valid, so only pre-SRT steps can fail the job.
pub async fn run_job(
    job: &TranscriptionJob,
    config: &AppConfig,
    engine: &dyn SpeechEngine,
    muxer: &dyn SubtitleMuxer,
) -> Result<JobOutcome> {
    let srt_path = subtitle_path(&job.media_path, &config.srt_suffix);
    let overwrite = job.overwrite.unwrap_or(config.overwrite_existing);

    if srt_path.exists() && !overwrite {
        info!(
            item_id = %job.item_id,
            srt = %srt_path.display(),
            "subtitle already present, skipping"
        );
        return Ok(JobOutcome::SkippedExisting { srt_path });
    }

    if !job.media_path.exists() {
        return Err(Error::MediaNotFound {
            path: job.media_path.clone(),
        });
    }

    info!(
        item_id = %job.item_id,
        title = %job.title,
        media = %job.media_path.display(),
        "transcribing"
    );
    let transcript = engine.transcribe(&job.media_path).await?;
    info!(
        item_id = %job.item_id,
        language = %transcript.language,
        segments = transcript.segments.len(),
        duration_secs = format!("{:.1}", transcript.duration),
        "transcription finished"
    );

    tokio::fs::write(&srt_path, transcript.to_srt(&config.blacklist_phrases)).await?;
    info!(item_id = %job.item_id, srt = %srt_path.display(), "subtitle written");

    let muxed = mux_if_configured(job, config, muxer, &srt_path).await;

    Ok(JobOutcome::Completed { srt_path, muxed })
}

async fn mux_if_configured(
    job: &TranscriptionJob,
    config: &AppConfig,
    muxer: &dyn SubtitleMuxer,
    srt_path: &Path,
) -> bool {
    if !config.mux_subtitles {
        debug!(item_id = %job.item_id, "muxing disabled");
        return false;
    }

    let Some(codec) = config.subtitle_codec(&job.media_path) else {
        debug!(
            item_id = %job.item_id,
            media = %job.media_path.display(),
            "no subtitle codec mapping, mux skipped"
        );
        return false;
    };

    match muxer.mux(&job.media_path, srt_path, codec).await {
        Ok(()) => {
            info!(item_id = %job.item_id, media = %job.media_path.display(), "mux complete");
            true
        }
        Err(e) => {
            warn!(
                item_id = %job.item_id,
                error = %e,
                "mux failed, standalone subtitle retained"
            );
            false
        }
    }
}
