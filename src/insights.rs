//! Identity-gated aggregate views.
//!
//! Read-only consumers of the user's saved data: the session history list,
//! the improvement-score bars, and the generated coaching summary. Each
//! view owns its loading/error state; a failure in one never touches the
//! others. When the user is not authenticated every view is empty and no
//! request leaves the process.

use crate::api::{CoachClient, ImprovementScores, SessionRecord};
use crate::auth::AuthSession;
use crate::stage::StageError;
use parking_lot::RwLock;

/// User-facing failure literal for the scores view
const SCORES_FAILED: &str = "Could not load scores.";

/// User-facing failure literal for the summary view
const SUMMARY_FAILED: &str = "Could not load summary.";

/// Ordered list of the user's saved sessions
///
/// The order is the server's; it is never re-sorted client-side.
#[derive(Default)]
pub struct SessionHistory {
    sessions: RwLock<Vec<SessionRecord>>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current list, in server order
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions.read().clone()
    }

    /// Number of sessions currently held
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drop the list without any network traffic
    pub fn clear(&self) {
        self.sessions.write().clear();
    }

    /// Reload the list from the storage collaborator
    ///
    /// Requires both a credential and an identity; otherwise the list is
    /// cleared and no request is made. Any failure also yields the empty
    /// list.
    pub async fn refresh(&self, auth: &AuthSession, client: &CoachClient) {
        let access = match (auth.access_token(), auth.is_authenticated()) {
            (Some(access), true) => access,
            _ => {
                self.clear();
                return;
            }
        };

        match client.sessions(&access).await {
            Ok(list) => {
                tracing::debug!("Loaded {} sessions", list.len());
                *self.sessions.write() = list;
            }
            Err(e) => {
                tracing::warn!("Failed to load sessions: {}", e);
                self.sessions.write().clear();
            }
        }
    }
}

/// Loading/error/value state for one derived-insight panel
#[derive(Debug, Clone)]
struct PanelState<T> {
    loading: bool,
    error: Option<StageError>,
    value: Option<T>,
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            value: None,
        }
    }
}

/// Improvement-score view (category name to 0–5 rating)
#[derive(Default)]
pub struct ScoresPanel {
    state: RwLock<PanelState<ImprovementScores>>,
}

impl ScoresPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading(&self) -> bool {
        self.state.read().loading
    }

    /// The latest scores, if the last refresh succeeded
    pub fn scores(&self) -> Option<ImprovementScores> {
        self.state.read().value.clone()
    }

    pub fn error(&self) -> Option<StageError> {
        self.state.read().error.clone()
    }

    /// The literal shown in place of the score bars on failure
    pub fn error_text(&self) -> Option<&'static str> {
        self.state.read().error.as_ref().map(|_| SCORES_FAILED)
    }

    /// Reset to the unauthenticated blank state
    pub fn clear(&self) {
        *self.state.write() = PanelState::default();
    }

    /// Re-fetch scores for the current credential
    ///
    /// Without a credential the panel clears and no request is made.
    /// Scores are never carried across identity changes.
    pub async fn refresh(&self, auth: &AuthSession, client: &CoachClient) {
        let Some(access) = auth.access_token() else {
            self.clear();
            return;
        };

        {
            let mut state = self.state.write();
            state.loading = true;
            state.error = None;
        }

        let result = client.improvement_scores(&access).await;

        let mut state = self.state.write();
        state.loading = false;
        match result {
            Ok(response) => {
                state.value = Some(response.scores);
            }
            Err(e) => {
                tracing::warn!("Failed to load improvement scores: {}", e);
                state.value = None;
                state.error = Some(e.into());
            }
        }
    }
}

/// Generated coaching-summary view
#[derive(Default)]
pub struct SummaryPanel {
    state: RwLock<PanelState<String>>,
}

impl SummaryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading(&self) -> bool {
        self.state.read().loading
    }

    /// The generated summary, if the last refresh succeeded
    pub fn summary(&self) -> Option<String> {
        self.state.read().value.clone()
    }

    pub fn error(&self) -> Option<StageError> {
        self.state.read().error.clone()
    }

    /// The literal shown in place of the summary on failure
    pub fn error_text(&self) -> Option<&'static str> {
        self.state.read().error.as_ref().map(|_| SUMMARY_FAILED)
    }

    /// Reset to the unauthenticated blank state
    pub fn clear(&self) {
        *self.state.write() = PanelState::default();
    }

    /// Regenerate the summary for the current credential
    ///
    /// Without a credential the panel clears and no request is made.
    pub async fn refresh(&self, auth: &AuthSession, client: &CoachClient) {
        let Some(access) = auth.access_token() else {
            self.clear();
            return;
        };

        {
            let mut state = self.state.write();
            state.loading = true;
            state.error = None;
        }

        let result = client.generate_summary(&access).await;

        let mut state = self.state.write();
        state.loading = false;
        match result {
            Ok(summary) => {
                state.value = Some(summary);
            }
            Err(e) => {
                tracing::warn!("Failed to load summary: {}", e);
                state.value = None;
                state.error = Some(e.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TokenPair, UserProfile};
    use crate::auth::CredentialStore;
    use crate::stage::ErrorKind;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn unreachable_client() -> CoachClient {
        CoachClient::with_config("http://127.0.0.1:1", 2)
    }

    fn anonymous_auth(dir: &std::path::Path) -> AuthSession {
        AuthSession::with_store(
            Arc::new(unreachable_client()),
            CredentialStore::with_path(dir.join("credentials.json")),
        )
    }

    fn authenticated_auth(dir: &std::path::Path) -> AuthSession {
        let auth = anonymous_auth(dir);
        auth.set_state_for_tests(
            Some(TokenPair {
                access: "token".to_string(),
                refresh: None,
            }),
            Some(UserProfile {
                id: 1,
                username: "alice".to_string(),
                email: String::new(),
            }),
        );
        auth
    }

    #[tokio::test]
    async fn test_history_refresh_unauthenticated_clears_without_request() {
        let dir = tempdir().unwrap();
        let auth = anonymous_auth(dir.path());
        let client = unreachable_client();

        let history = SessionHistory::new();
        // The client is unreachable; reaching it would take the full
        // timeout. The guard must return immediately.
        history.refresh(&auth, &client).await;
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_history_refresh_failure_yields_empty() {
        let dir = tempdir().unwrap();
        let auth = authenticated_auth(dir.path());
        let client = unreachable_client();

        let history = SessionHistory::new();
        history.refresh(&auth, &client).await;
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_history_refresh_idempotent() {
        let dir = tempdir().unwrap();
        let auth = authenticated_auth(dir.path());
        let client = unreachable_client();

        let history = SessionHistory::new();
        history.refresh(&auth, &client).await;
        let first = history.sessions();
        history.refresh(&auth, &client).await;
        assert_eq!(history.sessions(), first);
    }

    #[tokio::test]
    async fn test_scores_failure_sets_literal_and_kind() {
        let dir = tempdir().unwrap();
        let auth = authenticated_auth(dir.path());
        let client = unreachable_client();

        let scores = ScoresPanel::new();
        scores.refresh(&auth, &client).await;

        assert!(!scores.loading());
        assert!(scores.scores().is_none());
        assert_eq!(scores.error_text(), Some("Could not load scores."));
        assert_eq!(scores.error().unwrap().kind, ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_summary_failure_sets_literal() {
        let dir = tempdir().unwrap();
        let auth = authenticated_auth(dir.path());
        let client = unreachable_client();

        let summary = SummaryPanel::new();
        summary.refresh(&auth, &client).await;

        assert!(!summary.loading());
        assert!(summary.summary().is_none());
        assert_eq!(summary.error_text(), Some("Could not load summary."));
    }

    #[tokio::test]
    async fn test_panels_clear_without_credential() {
        let dir = tempdir().unwrap();
        let auth = authenticated_auth(dir.path());
        let client = unreachable_client();

        let scores = ScoresPanel::new();
        scores.refresh(&auth, &client).await;
        assert!(scores.error().is_some());

        // Credential gone: the next refresh clears the error without a call
        auth.set_state_for_tests(None, None);
        scores.refresh(&auth, &client).await;
        assert!(scores.error().is_none());
        assert!(scores.scores().is_none());
    }
}
