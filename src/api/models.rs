//! Wire types for the coach backend API.
//!
//! Field names follow the backend's JSON contract, so these derive
//! serde without renaming.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Access/refresh token pair issued by the credential endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Opaque bearer token attached to authenticated requests.
    pub access: String,
    /// Refresh token, if the backend issued one. Never exchanged by this
    /// crate (no token rotation), but persisted alongside the access token.
    pub refresh: Option<String>,
}

/// Credentials submitted to the token endpoint.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Payload for account creation.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User-visible profile returned by the identity lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Response from the transcription endpoint.
#[derive(Debug, Deserialize)]
pub struct TranscribeResponse {
    pub transcription: String,
}

/// Situational metadata attached to an analysis request. All fields are
/// free text and may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisContext {
    #[serde(default)]
    pub listener: String,
    #[serde(default)]
    pub situation: String,
    #[serde(default)]
    pub speaker_trait: String,
    #[serde(default)]
    pub topic_priority: String,
}

/// Feedback preferences attached to an analysis request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackPrefs {
    /// e.g. "concise", "in-depth", "suggestions"; empty for no preference.
    #[serde(default)]
    pub feedback_type: String,
    /// e.g. "pacing", "clarity", "emotion", "brevity"; empty for no preference.
    #[serde(default)]
    pub feedback_goal: String,
}

/// Full analysis request body.
///
/// `save` is sent as the literal string `"true"` or `"false"` — the
/// backend compares it textually, not as a JSON boolean.
#[derive(Debug, Serialize)]
pub struct AnalyzeRequest {
    pub text: String,
    pub feedback_type: String,
    pub feedback_goal: String,
    pub context: AnalysisContext,
    pub save: String,
}

impl AnalyzeRequest {
    /// Builds a request for `text`, persisting the resulting session iff
    /// `persist` (the caller passes identity presence here).
    pub fn new(
        text: String,
        context: AnalysisContext,
        prefs: FeedbackPrefs,
        persist: bool,
    ) -> Self {
        Self {
            text,
            feedback_type: prefs.feedback_type,
            feedback_goal: prefs.feedback_goal,
            context,
            save: if persist { "true" } else { "false" }.to_string(),
        }
    }
}

/// Response from the analysis endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
    /// Which backing model produced the feedback ("gemini", "local_llm", ...).
    /// Older backend builds omit it.
    pub source: Option<String>,
}

/// A persisted coaching session, listed in server order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub id: i64,
    pub created_at: String,
    pub transcription: String,
    pub analysis: String,
    /// Context snapshot as stored server-side; shape varies across backend
    /// versions, so it is kept as raw JSON.
    #[serde(default)]
    pub context: serde_json::Value,
}

/// Category name to rating, 0.0 through 5.0. Ordered for stable display.
pub type ImprovementScores = BTreeMap<String, f64>;

/// Response from the improvement-scores endpoint.
#[derive(Debug, Deserialize)]
pub struct ImprovementsResponse {
    #[serde(default)]
    pub summary: Option<String>,
    pub scores: ImprovementScores,
}

/// Response from the summary-generation endpoint.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub summary: String,
    #[serde(default)]
    pub scores: ImprovementScores,
}

/// User profile extras (bio, avatar).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
}
