use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio;
use crate::config::{AppConfig, Device};
use crate::error::{Error, Result};
use crate::model::{self, Model};
use crate::types::{Segment, Transcript};

/// Speech-to-text capability.
///
/// The worker pipeline depends on this trait rather than on whisper directly,
/// so it can be exercised with fake engines in tests.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn transcribe(&self, media: &Path) -> Result<Transcript>;
}

/// A transcription language validated against whisper.cpp's language list.
///
/// Accepts short codes ("en", "de", "ja") and full names ("english").
#[derive(Debug, Clone)]
pub enum Language {
    /// Auto-detect language from audio.
    Auto,
    /// A validated short language code.
    Code(String),
}

impl Language {
    pub fn new(lang: &str) -> Result<Self> {
        let lower = lang.to_lowercase();
        if lower == "auto" {
            return Ok(Language::Auto);
        }

        match whisper_rs::get_lang_id(&lower) {
            Some(id) => {
                // Normalize full names to the short code whisper expects
                let code = whisper_rs::get_lang_str(id).unwrap_or(&lower).to_string();
                Ok(Language::Code(code))
            }
            None => Err(Error::UnsupportedLanguage(lang.to_string())),
        }
    }
}

/// Whisper.cpp implementation of [`SpeechEngine`].
///
/// The model context is built once at startup and shared across jobs; each
/// job gets its own decoding state.
pub struct WhisperEngine {
    ctx: Arc<WhisperContext>,
    ffmpeg_path: String,
    language: Language,
    model_name: String,
}

impl WhisperEngine {
    /// Resolve the configured model (downloading into the cache when
    /// missing) and load the whisper context.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let language = match &config.language {
            Some(lang) => Language::new(lang)?,
            None => Language::Auto,
        };

        let model = Model::resolve(&config.model);
        let model_path = model::ensure_model(&model, &model::default_cache_dir()).await?;

        // compute_type is logged for config parity; ggml model files carry
        // their own quantization
        info!(
            model = model.name(),
            device = %config.device,
            compute_type = %config.compute_type,
            "loading whisper model"
        );

        let mut ctx_params = WhisperContextParameters::new();
        ctx_params.use_gpu(config.device == Device::Cuda);

        let ctx = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| Error::Model("model path contains invalid UTF-8".into()))?,
            ctx_params,
        )?;

        Ok(Self {
            ctx: Arc::new(ctx),
            ffmpeg_path: config.ffmpeg_path.clone(),
            language,
            model_name: model.name().to_string(),
        })
    }
}

#[async_trait]
impl SpeechEngine for WhisperEngine {
    async fn transcribe(&self, media: &Path) -> Result<Transcript> {
        let ctx = Arc::clone(&self.ctx);
        let ffmpeg_path = self.ffmpeg_path.clone();
        let language = self.language.clone();
        let model_name = self.model_name.clone();
        let media = media.to_path_buf();

        // Decode and inference are CPU-bound; keep them off the async executor
        tokio::task::spawn_blocking(move || {
            let samples = audio::decode_pcm(&ffmpeg_path, &media)?;
            run_whisper(&ctx, &samples, &language, &model_name)
        })
        .await
        .map_err(|e| Error::Transcription(format!("transcription task failed: {e}")))?
    }
}

fn run_whisper(
    ctx: &WhisperContext,
    samples: &[f32],
    language: &Language,
    model_name: &str,
) -> Result<Transcript> {
    let mut state = ctx.create_state()?;

    // Beam search + VAD + no cross-segment conditioning: counters whisper
    // looping on hallucinated text across quiet stretches
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: -1.0,
    });

    match language {
        Language::Auto => params.set_detect_language(true),
        Language::Code(code) => params.set_language(Some(code)),
    }

    params.set_no_context(true);
    params.enable_vad(true);

    // Disable stderr printing from whisper.cpp
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    info!(samples = samples.len(), "running transcription");
    state.full(params, samples)?;

    let num_segments = state.full_n_segments();
    debug!(num_segments, "transcription complete");

    let mut segments = Vec::with_capacity(num_segments as usize);

    for i in 0..num_segments {
        let segment = state
            .get_segment(i)
            .ok_or_else(|| Error::Transcription(format!("segment {i} not found")))?;

        let text = segment
            .to_str_lossy()
            .map_err(|e| Error::Transcription(format!("segment text error: {e}")))?
            .into_owned();

        segments.push(Segment {
            start: segment.start_timestamp() as f64 / 100.0,
            end: segment.end_timestamp() as f64 / 100.0,
            text,
        });
    }

    let duration = samples.len() as f64 / audio::WHISPER_SAMPLE_RATE as f64;

    let detected_lang_id = state.full_lang_id_from_state();
    let language = whisper_rs::get_lang_str(detected_lang_id)
        .unwrap_or("unknown")
        .to_string();

    Ok(Transcript {
        segments,
        language,
        duration,
        model: model_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_language_codes() {
        assert!(matches!(Language::new("auto").unwrap(), Language::Auto));
        assert!(matches!(Language::new("ja").unwrap(), Language::Code(_)));
        assert!(matches!(
            Language::new("klingon").unwrap_err(),
            Error::UnsupportedLanguage(_)
        ));
    }

    #[test]
    fn full_names_normalize_to_short_codes() {
        match Language::new("English").unwrap() {
            Language::Code(code) => assert_eq!(code, "en"),
            Language::Auto => panic!("expected a concrete language"),
        }
    }
}
