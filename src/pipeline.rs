//! Session pipeline orchestration.
//!
//! Wires together the flow from staged audio to personalized feedback:
//! 1. Stage (microphone recording or file selection produces an artifact)
//! 2. Transcribe (remote speech-to-text, available to anonymous users)
//! 3. Analyze (context-aware feedback; the collaborator persists a session
//!    when an identity is present)
//! 4. Refresh (history reload after a persisted analysis)
//!
//! Each stage keeps a generation counter: a response is applied only when
//! its generation is still current, so replacing the artifact or re-issuing
//! a request makes the older in-flight response a no-op.

use crate::api::{AnalysisContext, AnalyzeRequest, AnalyzeResponse, CoachClient, FeedbackPrefs};
use crate::audio::AudioArtifact;
use crate::auth::{AuthEvent, AuthSession};
use crate::insights::SessionHistory;
use crate::stage::{StageError, StageResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User-facing failure literal for the transcript field
const TRANSCRIPTION_FAILED: &str = "Transcription failed.";

/// User-facing failure literal for the analysis field
const ANALYSIS_FAILED: &str = "Analysis failed.";

/// Pipeline execution state
///
/// Derived from the stage fields; error outcomes fall back to the last
/// successful state so every action stays retryable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// No audio staged
    #[default]
    Idle,
    /// An artifact is staged, nothing transcribed yet
    AudioReady,
    /// Transcription request in flight
    Transcribing,
    /// A transcript is held
    Transcribed,
    /// Analysis request in flight
    Analyzing,
    /// Feedback is held
    Analyzed,
}

/// Feedback produced by the analysis collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// The feedback text.
    pub text: String,
    /// Which backing model produced it.
    pub source: String,
}

impl From<AnalyzeResponse> for AnalysisResult {
    fn from(response: AnalyzeResponse) -> Self {
        Self {
            text: response.analysis,
            source: response.source.unwrap_or_else(|| "gemini".to_string()),
        }
    }
}

impl AnalysisResult {
    /// Feedback with source attribution, as shown to the user
    pub fn display(&self) -> String {
        format!("{}\n\n(Source: {})", self.text, self.source)
    }
}

#[derive(Default)]
struct PipelineInner {
    artifact: Option<AudioArtifact>,
    transcript: Option<StageResult<String>>,
    analysis: Option<StageResult<AnalysisResult>>,
    transcribing: bool,
    analyzing: bool,
    transcribe_gen: u64,
    analyze_gen: u64,
}

/// The transcript as presented to the user: the text on success, the
/// failure literal after a failed attempt, empty before any attempt.
fn transcript_display(inner: &PipelineInner) -> String {
    match &inner.transcript {
        Some(Ok(text)) => text.clone(),
        Some(Err(_)) => TRANSCRIPTION_FAILED.to_string(),
        None => String::new(),
    }
}

/// The session pipeline
///
/// All state lives behind one mutex that is never held across an await;
/// requests are issued from a snapshot and applied through a generation
/// check.
pub struct SessionPipeline {
    inner: Mutex<PipelineInner>,
    client: Arc<CoachClient>,
    auth: Arc<AuthSession>,
    history: Arc<SessionHistory>,
}

impl SessionPipeline {
    pub fn new(
        client: Arc<CoachClient>,
        auth: Arc<AuthSession>,
        history: Arc<SessionHistory>,
    ) -> Self {
        Self {
            inner: Mutex::new(PipelineInner::default()),
            client,
            auth,
            history,
        }
    }

    /// Stage a new artifact, replacing any previous one
    ///
    /// The transcript and analysis derived from the previous artifact are
    /// cleared, and both generations advance so in-flight responses for the
    /// old artifact are discarded.
    pub fn stage_artifact(&self, artifact: AudioArtifact) {
        let mut inner = self.inner.lock();
        tracing::info!(
            "Staged artifact {} ({} bytes, {})",
            artifact.id,
            artifact.data.len(),
            artifact.media_type
        );
        inner.artifact = Some(artifact);
        inner.transcript = None;
        inner.analysis = None;
        inner.transcribing = false;
        inner.analyzing = false;
        inner.transcribe_gen += 1;
        inner.analyze_gen += 1;
    }

    /// The currently staged artifact, if any
    pub fn current_artifact(&self) -> Option<AudioArtifact> {
        self.inner.lock().artifact.clone()
    }

    /// Whether the transcription action is available
    ///
    /// Depends only on artifact presence; a prior failure does not disable
    /// retrying.
    pub fn can_transcribe(&self) -> bool {
        self.inner.lock().artifact.is_some()
    }

    /// Whether the analysis action is available
    ///
    /// Depends on the displayed transcript being non-empty. A visible
    /// failure literal counts as non-empty, so a failed transcription
    /// leaves the action enabled.
    pub fn can_analyze(&self) -> bool {
        !transcript_display(&self.inner.lock()).is_empty()
    }

    /// Current composite state
    pub fn state(&self) -> PipelineState {
        let inner = self.inner.lock();
        if inner.analyzing {
            PipelineState::Analyzing
        } else if matches!(inner.analysis, Some(Ok(_))) {
            PipelineState::Analyzed
        } else if inner.transcribing {
            PipelineState::Transcribing
        } else if matches!(inner.transcript, Some(Ok(_))) {
            PipelineState::Transcribed
        } else if inner.artifact.is_some() {
            PipelineState::AudioReady
        } else {
            PipelineState::Idle
        }
    }

    /// The transcript field as shown to the user
    pub fn transcript_text(&self) -> String {
        transcript_display(&self.inner.lock())
    }

    /// The structured transcript outcome, if an attempt completed
    pub fn transcript(&self) -> Option<StageResult<String>> {
        self.inner.lock().transcript.clone()
    }

    /// The analysis field as shown to the user
    pub fn analysis_text(&self) -> String {
        match &self.inner.lock().analysis {
            Some(Ok(result)) => result.display(),
            Some(Err(_)) => ANALYSIS_FAILED.to_string(),
            None => String::new(),
        }
    }

    /// The structured analysis outcome, if an attempt completed
    pub fn analysis(&self) -> Option<StageResult<AnalysisResult>> {
        self.inner.lock().analysis.clone()
    }

    /// Discard all pipeline state
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.artifact = None;
        inner.transcript = None;
        inner.analysis = None;
        inner.transcribing = false;
        inner.analyzing = false;
        inner.transcribe_gen += 1;
        inner.analyze_gen += 1;
        tracing::info!("Pipeline reset");
    }

    /// React to an auth transition
    ///
    /// Logout discards all in-flight and held state; credential and
    /// identity changes leave the pipeline alone (the views handle their
    /// own refresh).
    pub fn on_auth_event(&self, event: AuthEvent) {
        if event == AuthEvent::LoggedOut {
            self.reset();
        }
    }

    /// Submit the staged artifact for transcription
    ///
    /// No-op without an artifact. On failure the transcript field shows
    /// the failure literal and the action stays available.
    pub async fn transcribe(&self) {
        let Some((artifact, generation)) = self.begin_transcription() else {
            tracing::debug!("Transcribe requested without an artifact");
            return;
        };

        tracing::info!("Transcribing artifact {}", artifact.id);
        let result = self
            .client
            .transcribe(&artifact)
            .await
            .map_err(StageError::from);

        if !self.finish_transcription(generation, result) {
            tracing::debug!("Discarded stale transcription response");
        }
    }

    /// Submit the transcript with context for analysis
    ///
    /// No-op while the displayed transcript is empty. The persistence flag
    /// is `"true"` iff an identity is present at issue time; the bearer
    /// header is attached iff a credential is present at issue time. After
    /// a successful persisted analysis the session history reloads so the
    /// new record appears immediately.
    pub async fn analyze(&self, context: AnalysisContext, prefs: FeedbackPrefs) {
        let Some(issued) = self.begin_analysis(context, prefs) else {
            tracing::debug!("Analyze requested without a transcript");
            return;
        };

        tracing::info!("Analyzing transcript (save={})", issued.request.save);
        let result = self
            .client
            .analyze(&issued.request, issued.access.as_deref())
            .await
            .map(AnalysisResult::from)
            .map_err(StageError::from);

        let succeeded = result.is_ok();
        if !self.finish_analysis(issued.generation, result) {
            tracing::debug!("Discarded stale analysis response");
            return;
        }

        if succeeded && issued.persisted {
            self.history.refresh(&self.auth, &self.client).await;
        }
    }

    // ------------------------------------------------------------------
    // Issue/apply internals. Split out so state transitions are testable
    // without a reachable collaborator.
    // ------------------------------------------------------------------

    fn begin_transcription(&self) -> Option<(AudioArtifact, u64)> {
        let mut inner = self.inner.lock();
        let artifact = inner.artifact.clone()?;
        inner.transcribe_gen += 1;
        inner.transcribing = true;
        Some((artifact, inner.transcribe_gen))
    }

    fn finish_transcription(&self, generation: u64, result: StageResult<String>) -> bool {
        let mut inner = self.inner.lock();
        if inner.transcribe_gen != generation {
            return false;
        }
        inner.transcribing = false;
        if let Err(e) = &result {
            tracing::warn!("Transcription failed: {}", e);
        }
        inner.transcript = Some(result);
        true
    }

    fn begin_analysis(
        &self,
        context: AnalysisContext,
        prefs: FeedbackPrefs,
    ) -> Option<IssuedAnalysis> {
        // Credential and identity are read at issue time, not pinned
        let persisted = self.auth.identity().is_some();
        let access = self.auth.access_token();

        let mut inner = self.inner.lock();
        let text = transcript_display(&inner);
        if text.is_empty() {
            return None;
        }
        inner.analyze_gen += 1;
        inner.analyzing = true;
        Some(IssuedAnalysis {
            request: AnalyzeRequest::new(text, context, prefs, persisted),
            access,
            persisted,
            generation: inner.analyze_gen,
        })
    }

    fn finish_analysis(&self, generation: u64, result: StageResult<AnalysisResult>) -> bool {
        let mut inner = self.inner.lock();
        if inner.analyze_gen != generation {
            return false;
        }
        inner.analyzing = false;
        if let Err(e) = &result {
            tracing::warn!("Analysis failed: {}", e);
        }
        inner.analysis = Some(result);
        true
    }
}

/// Everything captured when an analysis request is issued
struct IssuedAnalysis {
    request: AnalyzeRequest,
    access: Option<String>,
    persisted: bool,
    generation: u64,
}
