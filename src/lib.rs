//! Orator - client session core for a speech coaching service.
//!
//! Capture or upload speech audio, transcribe it through a remote
//! collaborator, request context-aware feedback, and — when logged in —
//! persist the session and keep aggregate views (history, improvement
//! scores, generated summary) fresh across auth transitions.

pub mod api;
pub mod app;
pub mod audio;
pub mod auth;
pub mod config;
pub mod insights;
pub mod pipeline;
pub mod stage;

pub use api::{AnalysisContext, CoachClient, FeedbackPrefs};
pub use app::CoachApp;
pub use audio::{AudioArtifact, AudioCapture};
pub use auth::{AuthEvent, AuthSession};
pub use config::Config;
pub use insights::{ScoresPanel, SessionHistory, SummaryPanel};
pub use pipeline::{AnalysisResult, PipelineState, SessionPipeline};
pub use stage::{ErrorKind, StageError, StageResult};

/// Set up tracing output (stdout, plus an optional debug log file)
///
/// Uses the `RUST_LOG` environment filter when set, `info` otherwise.
/// Call once at process start.
pub fn init_logging(log_to_file: bool) {
    use tracing_subscriber::prelude::*;

    /// Format timestamps using the system's local time via chrono
    struct LocalTimer;
    impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
        fn format_time(
            &self,
            w: &mut tracing_subscriber::fmt::format::Writer<'_>,
        ) -> std::fmt::Result {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        }
    }

    let log_file = if log_to_file {
        let log_dir = dirs::home_dir()
            .map(|h| h.join(".orator").join("logs"))
            .unwrap_or_else(|| std::path::PathBuf::from("/tmp"));
        let _ = std::fs::create_dir_all(&log_dir);
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("orator-debug.log"))
            .ok()
    } else {
        None
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(file) = log_file {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_timer(LocalTimer)
            .with_ansi(false);
        let stdout_layer = tracing_subscriber::fmt::layer().with_timer(LocalTimer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        let stdout_layer = tracing_subscriber::fmt::layer().with_timer(LocalTimer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .init();
    }
}
