//! Remote collaborator access.
//!
//! Everything the core consumes over the network lives behind
//! [`CoachClient`]; the wire types are in [`models`].

pub mod client;
pub mod models;

pub use client::{ApiError, CoachClient};
pub use models::{
    AnalysisContext, AnalyzeRequest, AnalyzeResponse, FeedbackPrefs, ImprovementScores,
    Profile, SessionRecord, TokenPair, UserProfile,
};
