//! Report export encoding
//!
//! This module wraps a session report into the envelope handed to rendering
//! and export consumers. The report itself stays deterministic; producer
//! identity and timestamps live on the envelope only.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AssessmentError;
use crate::types::{SessionRecord, SessionReport, SourceKind, Urgency};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Current export envelope version
pub const REPORT_VERSION: &str = "1.0.0";

/// Who produced an envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Export envelope around one session report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub report_version: String,
    pub producer: ReportProducer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_created_at_utc: Option<String>,
    pub computed_at_utc: String,
    pub source: SourceKind,
    pub urgency: Urgency,
    pub report: SessionReport,
}

/// Encoder for report envelopes
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a free-standing report
    pub fn encode(&self, source: SourceKind, urgency: Urgency, report: &SessionReport) -> ReportEnvelope {
        ReportEnvelope {
            report_version: REPORT_VERSION.to_string(),
            producer: self.producer(),
            session_id: None,
            participant_id: None,
            session_created_at_utc: None,
            computed_at_utc: Utc::now().to_rfc3339(),
            source,
            urgency,
            report: report.clone(),
        }
    }

    /// Wrap the report of a completed session record
    pub fn encode_record(&self, record: &SessionRecord) -> Result<ReportEnvelope, AssessmentError> {
        let report = record.report.as_ref().ok_or_else(|| {
            AssessmentError::EncodingError(format!("session {} has no report yet", record.id))
        })?;

        Ok(ReportEnvelope {
            session_id: Some(record.id.clone()),
            participant_id: Some(record.participant_id.clone()),
            session_created_at_utc: Some(record.created_at.to_rfc3339()),
            ..self.encode(record.source, record.urgency, report)
        })
    }

    /// Encode a completed session record to JSON string
    pub fn encode_to_json(&self, record: &SessionRecord) -> Result<String, AssessmentError> {
        let envelope = self.encode_record(record)?;
        serde_json::to_string_pretty(&envelope).map_err(AssessmentError::JsonError)
    }

    fn producer(&self) -> ReportProducer {
        ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }
}
