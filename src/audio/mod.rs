//! Audio acquisition.
//!
//! Two paths produce speech audio — live microphone capture and file
//! selection — and both normalize into a single in-memory [`AudioArtifact`].
//! Only one artifact is retained at a time; a new one fully replaces the
//! previous regardless of which path produced it.

pub mod capture;

pub use capture::MicRecorder;

use parking_lot::{Mutex, RwLock};
use std::path::Path;
use uuid::Uuid;

/// The single in-memory audio payload staged for transcription
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    /// Identity of this artifact; used to detect replacement downstream.
    pub id: Uuid,
    /// Encoded audio bytes.
    pub data: Vec<u8>,
    /// Declared media type. Not verified against the content.
    pub media_type: String,
    /// File name reported to the transcription collaborator.
    pub file_name: String,
}

impl AudioArtifact {
    /// Create an artifact from arbitrary bytes
    pub fn new(data: Vec<u8>, media_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Package a completed microphone recording (16kHz mono WAV bytes)
    pub fn from_recording(data: Vec<u8>) -> Self {
        Self::new(data, "audio/wav", "recording.wav")
    }

    /// Ingest a user-chosen file as the artifact
    ///
    /// The content is taken as-is; the media type is declared from the file
    /// extension only.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let media_type = media_type_for(path);

        tracing::info!(
            "Ingested audio file '{}' ({} bytes, {})",
            file_name,
            data.len(),
            media_type
        );
        Ok(Self::new(data, media_type, file_name))
    }
}

/// Declare a media type from the file extension
fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

/// Recording lifecycle and artifact slot
///
/// Owns the microphone recorder and the single retained artifact. An
/// unavailable input device is logged and swallowed; recording state is
/// simply never entered.
pub struct AudioCapture {
    recorder: Mutex<MicRecorder>,
    artifact: RwLock<Option<AudioArtifact>>,
    /// Preferred input device name; None records from the system default.
    device_id: Option<String>,
}

impl Default for AudioCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCapture {
    /// Create an idle capture component recording from the default device
    pub fn new() -> Self {
        Self::with_device(None)
    }

    /// Create an idle capture component with a preferred input device
    pub fn with_device(device_id: Option<String>) -> Self {
        Self {
            recorder: Mutex::new(MicRecorder::new()),
            artifact: RwLock::new(None),
            device_id,
        }
    }

    /// Check if microphone capture is in progress
    pub fn is_recording(&self) -> bool {
        self.recorder.lock().is_recording()
    }

    /// Begin microphone capture
    ///
    /// Device or permission problems are logged, not surfaced; callers can
    /// observe the outcome through [`AudioCapture::is_recording`].
    pub fn start_recording(&self) {
        let mut recorder = self.recorder.lock();
        if let Err(e) = recorder.start(self.device_id.as_deref()) {
            tracing::warn!("Could not start recording: {}", e);
        }
    }

    /// Finalize microphone capture into the retained artifact
    ///
    /// Returns the new artifact, or `None` when nothing was recording or
    /// packaging failed (logged).
    pub fn stop_recording(&self) -> Option<AudioArtifact> {
        let mut recorder = self.recorder.lock();
        match recorder.stop() {
            Ok(data) => {
                let artifact = AudioArtifact::from_recording(data);
                *self.artifact.write() = Some(artifact.clone());
                Some(artifact)
            }
            Err(e) => {
                tracing::warn!("Could not finalize recording: {}", e);
                None
            }
        }
    }

    /// Take a user-chosen file as the retained artifact
    pub fn select_file(&self, path: &Path) -> std::io::Result<AudioArtifact> {
        let artifact = AudioArtifact::from_file(path)?;
        *self.artifact.write() = Some(artifact.clone());
        Ok(artifact)
    }

    /// The currently staged artifact, if any
    pub fn current_artifact(&self) -> Option<AudioArtifact> {
        self.artifact.read().clone()
    }

    /// Check whether an artifact is staged
    pub fn has_artifact(&self) -> bool {
        self.artifact.read().is_some()
    }

    /// Drop the retained artifact
    pub fn clear(&self) {
        *self.artifact.write() = None;
    }
}
