//! Core session types
//!
//! These are the values that cross the engine boundary: chat turns, the
//! structured profile a triage run extracts, the session report handed to
//! rendering, and the session record owned by the caller's store. Field names
//! are serialized in snake_case and are stable for template consumption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AssessmentError;
use crate::quiz::QuizData;

/// Author of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model")]
    Assistant,
}

/// A single turn of a conversational intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    /// Turn text. Chat clients that speak the OpenAI message shape send it as `content`.
    #[serde(alias = "content")]
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

/// Ordered, append-only sequence of chat turns
pub type Transcript = Vec<ChatTurn>;

/// Session-level escalation state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Monitor,
    Urgent,
}

impl Urgency {
    /// Combine with another observation. Urgency only ever moves towards `Urgent`.
    pub fn escalate(self, other: Urgency) -> Urgency {
        self.max(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Monitor => "monitor",
            Urgency::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which data channels a session captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Chat,
    Quiz,
    Both,
}

impl SourceKind {
    pub fn includes_quiz(&self) -> bool {
        matches!(self, SourceKind::Quiz | SourceKind::Both)
    }

    pub fn includes_chat(&self) -> bool {
        matches!(self, SourceKind::Chat | SourceKind::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Chat => "chat",
            SourceKind::Quiz => "quiz",
            SourceKind::Both => "both",
        }
    }
}

impl FromStr for SourceKind {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(SourceKind::Chat),
            "quiz" => Ok(SourceKind::Quiz),
            "both" => Ok(SourceKind::Both),
            other => Err(AssessmentError::UnsupportedSource(other.to_string())),
        }
    }
}

/// Stress band derived from the numeric stress score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLabel {
    Low,
    Moderate,
    High,
}

/// Impulsivity band derived from the decision task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpulsivityLabel {
    High,
    Moderate,
    Low,
    Unknown,
}

/// Emotional bias derived from the emotion sort task and user chat turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmotionalBias {
    Negative,
    #[serde(rename = "Neutral/Positive")]
    NeutralOrPositive,
}

/// Structured summary inferred by a completed triage conversation.
///
/// Every field is optional; only what was actually inferred is populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_stressor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_flag: Option<bool>,
}

impl ExtractedProfile {
    pub fn is_empty(&self) -> bool {
        *self == ExtractedProfile::default()
    }

    pub fn has_red_flag(&self) -> bool {
        self.red_flag.unwrap_or(false)
    }
}

/// Envelope emitted by a triage turn that completes (or escalates) a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    #[serde(default = "default_intent")]
    pub intent: String,
    #[serde(default)]
    pub extracted: ExtractedProfile,
    #[serde(default)]
    pub urgency: Urgency,
}

fn default_intent() -> String {
    "complete".to_string()
}

impl CompletionRecord {
    pub fn complete(extracted: ExtractedProfile, urgency: Urgency) -> Self {
        Self {
            intent: default_intent(),
            extracted,
            urgency,
        }
    }

    /// Urgency implied by this record: an explicit `urgent` or a raised red flag.
    pub fn effective_urgency(&self) -> Urgency {
        if self.extracted.has_red_flag() {
            Urgency::Urgent
        } else {
            self.urgency
        }
    }
}

/// Per-session summary produced by the report aggregator.
///
/// Quiz-derived fields are absent when the session has no quiz source;
/// `clinical_notes` is absent when it has no chat source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_label: Option<StressLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impulsivity: Option<ImpulsivityLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_bias: Option<EmotionalBias>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_notes: Option<ExtractedProfile>,
}

/// Raw data captured for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSessionData {
    #[serde(
        default,
        deserialize_with = "crate::quiz::types::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub quiz: Option<QuizData>,
    #[serde(
        default,
        deserialize_with = "lenient_transcript",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub chat_transcript: Transcript,
    #[serde(
        default,
        deserialize_with = "lenient_profile",
        skip_serializing_if = "Option::is_none"
    )]
    pub llm_extracted: Option<ExtractedProfile>,
}

/// Keep the turns that parse; a non-array transcript is empty
fn lenient_transcript<'de, D>(deserializer: D) -> Result<Transcript, D::Error>
where
    D: Deserializer<'de>,
{
    let turns = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    };
    Ok(turns)
}

/// Stored extraction with mistyped fields dropped
fn lenient_profile<'de, D>(deserializer: D) -> Result<Option<ExtractedProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(crate::triage::extraction::profile_from_value))
}

/// Input document for one aggregation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInput {
    pub source: SourceKind,
    #[serde(default)]
    pub raw_data: RawSessionData,
}

/// A session as the caller's store keeps it.
///
/// The engine never loads or saves these; it only fills in `report` and
/// `urgency` when asked to complete one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub participant_id: String,
    pub created_at: DateTime<Utc>,
    pub source: SourceKind,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub raw_data: RawSessionData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<SessionReport>,
}

impl SessionRecord {
    /// A fresh session with a random id, stamped now
    pub fn new(participant_id: impl Into<String>, source: SourceKind, raw_data: RawSessionData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            participant_id: participant_id.into(),
            created_at: Utc::now(),
            source,
            urgency: Urgency::Monitor,
            meta: serde_json::Map::new(),
            raw_data,
            report: None,
        }
    }
}
