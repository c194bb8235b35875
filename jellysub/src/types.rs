use serde::{Deserialize, Serialize};

/// A transcript segment (sentence/phrase).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Complete transcription result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    pub language: String,
    pub duration: f64,
    pub model: String,
}

impl Transcript {
    /// Full text (all segments concatenated).
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Format as SRT subtitles.
    ///
    /// Captions whose trimmed text is empty or equals one of the blacklisted
    /// phrases are dropped; sequence numbers stay consecutive across drops.
    pub fn to_srt(&self, blacklist: &[String]) -> String {
        let mut out = String::new();
        let mut index = 1;
        for seg in &self.segments {
            let text = seg.text.trim();
            if text.is_empty() || blacklist.iter().any(|phrase| phrase == text) {
                continue;
            }
            out.push_str(&format!("{index}\n"));
            out.push_str(&format!(
                "{} --> {}\n",
                format_srt_time(seg.start),
                format_srt_time(seg.end)
            ));
            out.push_str(text);
            out.push_str("\n\n");
            index += 1;
        }
        out
    }
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}
