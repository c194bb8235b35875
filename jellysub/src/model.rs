use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::error::{Error, Result};

const HUGGINGFACE_BASE: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Whisper model sizes, plus user-provided ggml files.
#[derive(Debug, Clone)]
pub enum Model {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV2,
    LargeV3,
    LargeV3Turbo,
    /// User-provided .ggml file path.
    Custom(PathBuf),
}

impl Model {
    /// Resolve a configured model value: a known size name, or anything else
    /// is treated as a path to a custom ggml file.
    pub fn resolve(value: &str) -> Self {
        Model::from_name(value).unwrap_or_else(|| Model::Custom(PathBuf::from(value)))
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "tiny" => Some(Model::Tiny),
            "tiny.en" => Some(Model::TinyEn),
            "base" => Some(Model::Base),
            "base.en" => Some(Model::BaseEn),
            "small" => Some(Model::Small),
            "small.en" => Some(Model::SmallEn),
            "medium" => Some(Model::Medium),
            "medium.en" => Some(Model::MediumEn),
            "large-v2" => Some(Model::LargeV2),
            "large-v3" => Some(Model::LargeV3),
            "large-v3-turbo" => Some(Model::LargeV3Turbo),
            _ => None,
        }
    }

    /// Model filename as used by HuggingFace / whisper.cpp.
    pub fn filename(&self) -> String {
        match self {
            Model::Tiny => "ggml-tiny.bin".into(),
            Model::TinyEn => "ggml-tiny.en.bin".into(),
            Model::Base => "ggml-base.bin".into(),
            Model::BaseEn => "ggml-base.en.bin".into(),
            Model::Small => "ggml-small.bin".into(),
            Model::SmallEn => "ggml-small.en.bin".into(),
            Model::Medium => "ggml-medium.bin".into(),
            Model::MediumEn => "ggml-medium.en.bin".into(),
            Model::LargeV2 => "ggml-large-v2.bin".into(),
            Model::LargeV3 => "ggml-large-v3.bin".into(),
            Model::LargeV3Turbo => "ggml-large-v3-turbo.bin".into(),
            Model::Custom(path) => path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom-model".into()),
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        match self {
            Model::Tiny => "tiny",
            Model::TinyEn => "tiny.en",
            Model::Base => "base",
            Model::BaseEn => "base.en",
            Model::Small => "small",
            Model::SmallEn => "small.en",
            Model::Medium => "medium",
            Model::MediumEn => "medium.en",
            Model::LargeV2 => "large-v2",
            Model::LargeV3 => "large-v3",
            Model::LargeV3Turbo => "large-v3-turbo",
            Model::Custom(_) => "custom",
        }
    }
}

/// Default model cache directory: ~/.cache/jellysub/models.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("jellysub")
        .join("models")
}

/// Ensure a model is available locally, downloading if necessary.
/// Returns the path to the model file.
pub async fn ensure_model(model: &Model, cache_dir: &Path) -> Result<PathBuf> {
    match model {
        Model::Custom(path) => {
            if path.exists() {
                Ok(path.clone())
            } else {
                Err(Error::ModelNotFound { path: path.clone() })
            }
        }
        _ => {
            let filename = model.filename();
            let model_path = cache_dir.join(&filename);

            if model_path.exists() {
                info!(path = %model_path.display(), "model already cached");
                return Ok(model_path);
            }

            std::fs::create_dir_all(cache_dir).map_err(|e| {
                Error::Model(format!(
                    "failed to create cache dir {}: {e}",
                    cache_dir.display()
                ))
            })?;

            let url = format!("{HUGGINGFACE_BASE}/{filename}");
            info!(%url, "downloading model");
            download_model(&url, &model_path).await?;

            Ok(model_path)
        }
    }
}

async fn download_model(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::ModelDownload(format!("HTTP error: {e}")))?;

    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb.set_message(format!(
        "Downloading {}",
        dest.file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));

    // Write to a temp file first, then rename (atomic-ish)
    let tmp_path = dest.with_extension("bin.part");
    let mut file = std::fs::File::create(&tmp_path)?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    use std::io::Write;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    // Verify we got something reasonable
    let file_size = std::fs::metadata(&tmp_path)?.len();
    if file_size < 1_000_000 {
        std::fs::remove_file(&tmp_path).ok();
        return Err(Error::ModelDownload(format!(
            "downloaded file too small ({file_size} bytes) — likely an error page"
        )));
    }

    std::fs::rename(&tmp_path, dest)?;
    pb.finish_with_message("Download complete");

    if total_size > 0 && file_size != total_size {
        warn!(
            expected = total_size,
            actual = file_size,
            "file size mismatch — model may be corrupt"
        );
    }

    info!(path = %dest.display(), size = file_size, "model saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_names() {
        assert!(matches!(Model::resolve("medium"), Model::Medium));
        assert!(matches!(Model::resolve("large-v3-turbo"), Model::LargeV3Turbo));
    }

    #[test]
    fn unknown_name_becomes_custom_path() {
        let model = Model::resolve("/models/ggml-finetuned.bin");
        match model {
            Model::Custom(path) => {
                assert_eq!(path, PathBuf::from("/models/ggml-finetuned.bin"));
            }
            other => panic!("expected custom model, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_custom_model_is_an_error() {
        let model = Model::Custom(PathBuf::from("/nonexistent/model.bin"));
        let err = ensure_model(&model, &std::env::temp_dir()).await.unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { .. }));
    }
}
