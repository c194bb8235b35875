use std::sync::Arc;

use jellysub::{AppConfig, JobGate, SpeechEngine, SubtitleMuxer};

/// Shared application state: the immutable configuration plus the capability
/// objects the submission handler dispatches to.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<dyn SpeechEngine>,
    pub muxer: Arc<dyn SubtitleMuxer>,
    pub gate: JobGate,
}
