//! Application composition root.
//!
//! Builds the components from configuration, forwards auth transitions to
//! the pipeline and the views, and exposes the user-facing operations in
//! one place.

use crate::api::{AnalysisContext, CoachClient, FeedbackPrefs};
use crate::audio::AudioCapture;
use crate::auth::{AuthEvent, AuthSession};
use crate::config::Config;
use crate::insights::{ScoresPanel, SessionHistory, SummaryPanel};
use crate::pipeline::SessionPipeline;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// The assembled client core
pub struct CoachApp {
    pub client: Arc<CoachClient>,
    pub auth: Arc<AuthSession>,
    pub capture: Arc<AudioCapture>,
    pub pipeline: Arc<SessionPipeline>,
    pub history: Arc<SessionHistory>,
    pub scores: Arc<ScoresPanel>,
    pub summary: Arc<SummaryPanel>,
}

impl CoachApp {
    /// Wire up all components from configuration
    pub fn new(config: &Config) -> Self {
        let client = Arc::new(CoachClient::with_config(
            &config.server.base_url,
            config.server.timeout_secs,
        ));
        let auth = Arc::new(AuthSession::new(client.clone()));
        let capture = Arc::new(AudioCapture::with_device(config.audio.device_id.clone()));
        let history = Arc::new(SessionHistory::new());
        let pipeline = Arc::new(SessionPipeline::new(
            client.clone(),
            auth.clone(),
            history.clone(),
        ));

        Self {
            client,
            auth,
            capture,
            pipeline,
            history,
            scores: Arc::new(ScoresPanel::new()),
            summary: Arc::new(SummaryPanel::new()),
        }
    }

    /// Restore persisted credentials and load the initial view data
    ///
    /// Call once at process start, before spawning the auth listener.
    pub async fn bootstrap(&self) {
        self.auth.bootstrap().await;
        self.refresh_views().await;
    }

    /// Reload history, scores, and summary for the current auth state
    ///
    /// Each view guards itself: unauthenticated refreshes clear without
    /// network traffic, and one view's failure never affects another.
    pub async fn refresh_views(&self) {
        tokio::join!(
            self.history.refresh(&self.auth, &self.client),
            self.scores.refresh(&self.auth, &self.client),
            self.summary.refresh(&self.auth, &self.client),
        );
    }

    /// Apply one auth transition to the pipeline and the views
    pub async fn handle_auth_event(&self, event: AuthEvent) {
        tracing::debug!("Auth event: {:?}", event);
        match event {
            AuthEvent::LoggedOut => {
                // Deterministic reset: every component clears its own
                // state, no page reload involved
                self.pipeline.on_auth_event(event);
                self.history.clear();
                self.scores.clear();
                self.summary.clear();
            }
            AuthEvent::CredentialsChanged | AuthEvent::IdentityChanged => {
                self.refresh_views().await;
            }
        }
    }

    /// Spawn a task that forwards auth events until the session drops
    pub fn spawn_auth_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let app = self.clone();
        let mut events = self.auth.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => app.handle_auth_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Auth listener lagged, skipped {} events", skipped);
                        app.refresh_views().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Begin microphone capture (silently ignored if no device)
    pub fn start_recording(&self) {
        self.capture.start_recording();
    }

    /// Finish microphone capture and stage the recording for transcription
    pub fn stop_recording(&self) {
        if let Some(artifact) = self.capture.stop_recording() {
            self.pipeline.stage_artifact(artifact);
        }
    }

    /// Stage a user-chosen audio file for transcription
    pub fn select_file(&self, path: &Path) -> std::io::Result<()> {
        let artifact = self.capture.select_file(path)?;
        self.pipeline.stage_artifact(artifact);
        Ok(())
    }

    /// Run the transcription stage on the staged artifact
    pub async fn transcribe(&self) {
        self.pipeline.transcribe().await;
    }

    /// Run the analysis stage on the held transcript
    pub async fn analyze(&self, context: AnalysisContext, prefs: FeedbackPrefs) {
        self.pipeline.analyze(context, prefs).await;
    }
}
