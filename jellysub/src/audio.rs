use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};

/// Target sample rate for whisper.cpp.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Decode a media file to 16kHz mono f32 samples ready for whisper.
///
/// ffmpeg handles demuxing, decoding, resampling, and channel mixing in one
/// shot, so any container/codec ffmpeg understands works here. Output format
/// is raw PCM signed 16-bit little-endian, converted to f32.
pub fn decode_pcm(ffmpeg_path: &str, path: &Path) -> Result<Vec<f32>> {
    let output = Command::new(ffmpeg_path)
        .args(["-nostdin", "-threads", "0", "-i"])
        .arg(path)
        .args([
            "-f",
            "s16le",
            "-ac",
            "1",
            "-acodec",
            "pcm_s16le",
            "-ar",
            &WHISPER_SAMPLE_RATE.to_string(),
            "-",
        ])
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::AudioDecode(format!(
                    "{ffmpeg_path} not found — install ffmpeg or set ffmpeg_path"
                ))
            } else {
                Error::AudioDecode(format!("failed to run {ffmpeg_path}: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr_truncated: String = stderr.chars().take(1000).collect();
        return Err(Error::AudioDecode(format!(
            "ffmpeg failed: {stderr_truncated}"
        )));
    }

    if output.stdout.is_empty() {
        return Err(Error::AudioDecode("ffmpeg produced no output".into()));
    }

    // Convert s16le bytes to f32 samples, normalized to [-1.0, 1.0]
    let samples: Vec<f32> = output
        .stdout
        .chunks_exact(2)
        .map(|chunk| {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            sample as f32 / 32768.0
        })
        .collect();

    debug!(
        samples = samples.len(),
        duration_secs = format!("{:.1}", samples.len() as f64 / WHISPER_SAMPLE_RATE as f64),
        "decoded audio"
    );

    Ok(samples)
}
