//! TeenCare Risk - Session risk assessment engine for adolescent wellbeing screening
//!
//! The engine reduces two telemetry channels to a small set of interpretable
//! indicators plus a safety-escalation signal: quiz scoring → conversational
//! triage → report aggregation → export encoding.
//!
//! ## Modules
//!
//! - **Quiz**: Score reaction, decision and emotion-sort telemetry; supply decision scenarios
//! - **Triage**: Red-flag escalation, model-backed or scripted replies, structured extraction
//! - **Pipeline**: Merge both channels into one report per session

pub mod config;
pub mod encoder;
pub mod error;
pub mod lexicon;
pub mod model;
pub mod pipeline;
pub mod quiz;
pub mod triage;
pub mod types;

// FFI bindings for C interop (on by default for cdylib/staticlib builds)
#[cfg(feature = "ffi")]
pub mod ffi;

pub use config::EngineConfig;
pub use error::{AssessmentError, ModelError};
pub use pipeline::{generate_summary, summarize_session_json, SessionAssessor};

// Quiz exports
pub use quiz::{score_quiz, QuizAssessment, QuizData, QuizQuestion};

// Triage exports
pub use model::{ConversationalModel, ModelHandle, QuizGenerator};
pub use triage::{respond, TriageReply, TriageSession, TriageState};

pub use types::{
    ChatTurn, CompletionRecord, ExtractedProfile, RawSessionData, SessionRecord, SessionReport,
    SourceKind, Urgency,
};

/// Engine version embedded in all export envelopes
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for export envelopes
pub const PRODUCER_NAME: &str = "teencare-risk";
