//! HTTP client for the coach backend.
//!
//! Wraps every remote collaborator (credential issuance, registration,
//! identity lookup, transcription, analysis, session listing, improvement
//! scores, summary generation, profile) behind one reqwest client with a
//! configurable base URL and timeout. Each call is exactly one attempt;
//! retry policy belongs to the user, not this layer.

use super::models::{
    AnalyzeRequest, AnalyzeResponse, GenerateResponse, ImprovementsResponse, LoginRequest,
    Profile, RegisterRequest, SessionRecord, TokenPair, TranscribeResponse, UserProfile,
};
use crate::audio::AudioArtifact;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default backend address
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default timeout for API requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error types for backend API operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Server error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// HTTP client for the coach backend
///
/// Cheap to clone; all methods take `&self` and are safe to call
/// concurrently.
#[derive(Debug, Clone)]
pub struct CoachClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for CoachClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CoachClient {
    /// Create a new client with default settings
    pub fn new() -> Self {
        Self::with_config(DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a new client with a custom base URL
    pub fn with_base_url(base_url: String) -> Self {
        Self::with_config(&base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a new client with full configuration
    ///
    /// # Arguments
    ///
    /// * `base_url` - The backend base URL (e.g., "http://localhost:8000")
    /// * `timeout_secs` - Request timeout in seconds
    pub fn with_config(base_url: &str, timeout_secs: u64) -> Self {
        let timeout = Duration::from_secs(timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        }
    }

    /// Get the configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout.as_secs())
        } else {
            ApiError::ConnectionFailed(e.to_string())
        }
    }

    /// Reject non-2xx responses, carrying the body as the error message
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError::Status { status, message });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Exchange username/password for a token pair
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        tracing::debug!("Requesting token for user '{}'", username);
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(self.url("/api/token/"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::read_json(response).await
    }

    /// Request account creation. Does not authenticate.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        tracing::debug!("Registering account '{}'", username);
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(self.url("/api/register/"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Look up the profile behind an access token
    pub async fn current_user(&self, access: &str) -> Result<UserProfile, ApiError> {
        let response = self
            .client
            .get(self.url("/api/current_user/"))
            .bearer_auth(access)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::read_json(response).await
    }

    /// Submit an audio artifact for transcription
    ///
    /// No auth header: transcription is available to anonymous users.
    pub async fn transcribe(&self, artifact: &AudioArtifact) -> Result<String, ApiError> {
        tracing::debug!(
            "Uploading {} bytes ({}) for transcription",
            artifact.data.len(),
            artifact.media_type
        );

        let part = multipart::Part::bytes(artifact.data.clone())
            .file_name(artifact.file_name.clone());
        let part = match part.mime_str(&artifact.media_type) {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(
                    "Invalid media type '{}', uploading untyped",
                    artifact.media_type
                );
                multipart::Part::bytes(artifact.data.clone())
                    .file_name(artifact.file_name.clone())
            }
        };
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/transcribe/"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let parsed: TranscribeResponse = Self::read_json(response).await?;
        Ok(parsed.transcription)
    }

    /// Submit a transcript with context for analysis
    ///
    /// The bearer header is attached iff `access` is present; the `save`
    /// flag inside `request` is the caller's responsibility.
    pub async fn analyze(
        &self,
        request: &AnalyzeRequest,
        access: Option<&str>,
    ) -> Result<AnalyzeResponse, ApiError> {
        tracing::debug!(
            "Requesting analysis ({} chars, save={})",
            request.text.len(),
            request.save
        );

        let mut builder = self.client.post(self.url("/api/analyze/")).json(request);
        if let Some(token) = access {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        Self::read_json(response).await
    }

    /// List the authenticated user's saved sessions, in server order
    pub async fn sessions(&self, access: &str) -> Result<Vec<SessionRecord>, ApiError> {
        let response = self
            .client
            .get(self.url("/api/sessions/"))
            .bearer_auth(access)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::read_json(response).await
    }

    /// Fetch the latest improvement scores for the authenticated user
    pub async fn improvement_scores(&self, access: &str) -> Result<ImprovementsResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/api/improvements/"))
            .bearer_auth(access)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::read_json(response).await
    }

    /// Generate a fresh improvement summary from the user's session history
    pub async fn generate_summary(&self, access: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.url("/api/improvements/generate/"))
            .bearer_auth(access)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let parsed: GenerateResponse = Self::read_json(response).await?;
        Ok(parsed.summary)
    }

    /// Fetch the authenticated user's profile extras
    pub async fn profile(&self, access: &str) -> Result<Profile, ApiError> {
        let response = self
            .client
            .get(self.url("/api/profile/"))
            .bearer_auth(access)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::read_json(response).await
    }

    /// Update the authenticated user's profile extras
    pub async fn update_profile(&self, access: &str, profile: &Profile) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/api/profile/update/"))
            .bearer_auth(access)
            .json(profile)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CoachClient::new();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.timeout.as_secs(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_client_with_custom_url() {
        let client = CoachClient::with_base_url("http://coach.example:9000".to_string());
        assert_eq!(client.base_url, "http://coach.example:9000");
    }

    #[test]
    fn test_client_with_config() {
        let client = CoachClient::with_config("http://10.0.0.2:8000", 60);
        assert_eq!(client.base_url, "http://10.0.0.2:8000");
        assert_eq!(client.timeout().as_secs(), 60);
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let client = CoachClient::with_base_url("http://localhost:8000/".to_string());
        assert_eq!(client.url("/api/token/"), "http://localhost:8000/api/token/");
    }

    #[test]
    fn test_endpoint_urls() {
        let client = CoachClient::new();
        assert_eq!(
            client.url("/api/transcribe/"),
            "http://localhost:8000/api/transcribe/"
        );
        assert_eq!(
            client.url("/api/improvements/generate/"),
            "http://localhost:8000/api/improvements/generate/"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::ConnectionFailed("connection refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: connection refused");

        let err = ApiError::Timeout(30);
        assert_eq!(err.to_string(), "Request timeout after 30 seconds");

        let err = ApiError::Status {
            status: 401,
            message: "invalid credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (401): invalid credentials");

        let err = ApiError::Parse("expected value".to_string());
        assert_eq!(err.to_string(), "Failed to parse response: expected value");
    }
}
