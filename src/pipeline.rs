//! Pipeline orchestration
//!
//! This module provides the public API for the assessment engine. It merges
//! quiz scoring and triage extraction into one report per session, according
//! to which sources the session declares.

use crate::config::EngineConfig;
use crate::encoder::ReportEncoder;
use crate::error::AssessmentError;
use crate::model::ModelHandle;
use crate::quiz::{generate_questions, QuizData, QuizQuestion, QuizScorer};
use crate::triage::{TriageReply, TriageSession};
use crate::types::{RawSessionData, SessionInput, SessionRecord, SessionReport, SourceKind, Urgency};

/// Aggregate one session's raw data into a report.
///
/// Quiz and chat blocks are independent: quiz fields come from the scorer,
/// `clinical_notes` is the stored extraction as-is. A missing quiz is scored
/// as empty telemetry; a missing extraction yields an empty profile.
///
/// # Example
/// ```ignore
/// let report = generate_summary(SourceKind::Quiz, &RawSessionData::default());
/// assert_eq!(report.stress_score, Some(0.3));
/// ```
pub fn generate_summary(source: SourceKind, raw: &RawSessionData) -> SessionReport {
    let mut report = SessionReport::default();

    if source.includes_quiz() {
        let empty = QuizData::default();
        let quiz = raw.quiz.as_ref().unwrap_or(&empty);
        let assessment = QuizScorer::score(quiz, &raw.chat_transcript);

        report.stress_score = Some(assessment.stress_score);
        report.stress_label = Some(assessment.stress_label);
        report.attention_score = Some(assessment.attention_score);
        report.impulsivity = Some(assessment.impulsivity);
        report.emotional_bias = Some(assessment.emotional_bias);
    }

    if source.includes_chat() {
        report.clinical_notes = Some(raw.llm_extracted.clone().unwrap_or_default());
    }

    report
}

/// Aggregate a `{source, raw_data}` JSON document into report JSON.
///
/// Only a malformed envelope is an error; malformed telemetry inside it is
/// scored as neutral.
pub fn summarize_session_json(raw_json: &str) -> Result<String, AssessmentError> {
    let input: SessionInput = serde_json::from_str(raw_json)
        .map_err(|e| AssessmentError::ParseError(format!("Invalid session document: {}", e)))?;
    let report = generate_summary(input.source, &input.raw_data);
    serde_json::to_string(&report).map_err(AssessmentError::JsonError)
}

impl SessionRecord {
    /// Urgency implied by the stored extraction
    pub fn extracted_urgency(&self) -> Urgency {
        match &self.raw_data.llm_extracted {
            Some(profile) if profile.has_red_flag() => Urgency::Urgent,
            _ => Urgency::Monitor,
        }
    }

    /// Compute the report and fold extraction urgency into the record
    pub fn complete(&mut self) -> &SessionReport {
        self.urgency = self.urgency.escalate(self.extracted_urgency());
        self.report.insert(generate_summary(self.source, &self.raw_data))
    }
}

/// Stateful entry point holding the model handle and export encoder.
///
/// Use this when serving many sessions from one process: the model backend is
/// constructed once and shared by every triage and quiz-generation call.
pub struct SessionAssessor {
    config: EngineConfig,
    model: ModelHandle,
    encoder: ReportEncoder,
}

impl Default for SessionAssessor {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl SessionAssessor {
    /// Create an assessor whose model backend is built from `config` on first use
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_model(config, ModelHandle::new(config))
    }

    /// Create an assessor around an existing model handle
    pub fn with_model(config: &EngineConfig, model: ModelHandle) -> Self {
        Self {
            config: config.clone(),
            model,
            encoder: ReportEncoder::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Begin a conversational intake
    pub fn start_triage(&self) -> TriageSession {
        TriageSession::from_config(&self.config)
    }

    /// Answer one user turn of an intake
    pub fn triage_turn(&self, session: &mut TriageSession, text: &str) -> TriageReply {
        session.process_turn(text, self.model.conversational())
    }

    /// Decision scenarios for the quiz, generated or static
    pub fn questions(&self, context: &str) -> Vec<QuizQuestion> {
        generate_questions(context, self.model.quiz_generator())
    }

    /// Copy a finished intake into a session record's raw data
    pub fn attach_triage(&self, record: &mut SessionRecord, session: &TriageSession) {
        record.raw_data.chat_transcript = session.transcript().to_vec();
        if let Some(profile) = session.extracted() {
            record.raw_data.llm_extracted = Some(profile.clone());
        }
        record.urgency = record.urgency.escalate(session.urgency());
    }

    /// Complete a record and encode its export envelope
    pub fn complete_record(&self, record: &mut SessionRecord) -> Result<String, AssessmentError> {
        record.complete();
        self.encoder.encode_to_json(record)
    }
}
