pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod mapping;
pub mod model;
pub mod mux;
pub mod types;
pub mod worker;

pub use config::{AppConfig, Device, PathMapping};
pub use engine::{Language, SpeechEngine, WhisperEngine};
pub use error::{Error, Result};
pub use gate::{JobGate, JobPermit};
pub use mapping::map_path;
pub use model::Model;
pub use mux::{FfmpegMuxer, SubtitleMuxer};
pub use types::{Segment, Transcript};
pub use worker::{run_job, JobOutcome, TranscriptionJob};
