//! Turn-by-turn triage
//!
//! Every user turn runs the same two phases:
//!
//! 1. Safety check on the new input. A red-flag hit answers with the fixed
//!    escalation message and an urgent completion record. Nothing else runs.
//! 2. Reply generation by the conversational model, or by the fallback policy
//!    when the model is absent, fails, or returns nothing usable.
//!
//! [`respond`] is the stateless form over a borrowed history. [`TriageSession`]
//! owns the transcript and tracks the session state machine:
//!
//! ```text
//! AwaitingFirstInput → InConversation → Complete
//!         └──────────────┴──────────────┴──→ Escalated (red flag)
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::lexicon::{red_flag_in, ESCALATION_MESSAGE};
use crate::model::ConversationalModel;
use crate::triage::extraction::parse_reply;
use crate::triage::inference::infer_profile;
use crate::triage::policy::{FallbackPolicy, PolicyState, CLOSING_REPLY};
use crate::types::{ChatTurn, CompletionRecord, ExtractedProfile, Transcript, Urgency};

/// Lifecycle of a triage conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageState {
    #[default]
    AwaitingFirstInput,
    InConversation,
    Complete,
    Escalated,
}

impl TriageState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TriageState::Complete | TriageState::Escalated)
    }
}

/// What produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// Red-flag escalation
    Safety,
    Model,
    Fallback,
    /// Acknowledgement after the conversation already ended
    Closed,
}

/// Outcome of one user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReply {
    /// Text to show the user
    pub display: String,
    /// Completion payload, present when this turn ends the conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<CompletionRecord>,
    /// Urgency implied by this turn alone
    pub urgency: Urgency,
    pub source: ReplySource,
}

impl TriageReply {
    fn escalation() -> Self {
        let extracted = ExtractedProfile {
            red_flag: Some(true),
            ..Default::default()
        };
        Self {
            display: ESCALATION_MESSAGE.to_string(),
            record: Some(CompletionRecord::complete(extracted, Urgency::Urgent)),
            urgency: Urgency::Urgent,
            source: ReplySource::Safety,
        }
    }

    fn closed() -> Self {
        Self {
            display: CLOSING_REPLY.to_string(),
            record: None,
            urgency: Urgency::Monitor,
            source: ReplySource::Closed,
        }
    }

    pub fn is_escalation(&self) -> bool {
        self.source == ReplySource::Safety
    }
}

/// Answer one user turn given the turns that preceded it
pub fn respond(
    history: &[ChatTurn],
    new_input: &str,
    model: Option<&dyn ConversationalModel>,
    policy: &FallbackPolicy,
) -> TriageReply {
    if red_flag_in(new_input).is_some() {
        return TriageReply::escalation();
    }

    if let Some(model) = model {
        if let Some(reply) = model_reply(model, history, new_input) {
            return reply;
        }
    }

    fallback_reply(history, new_input, policy)
}

fn model_reply(
    model: &dyn ConversationalModel,
    history: &[ChatTurn],
    new_input: &str,
) -> Option<TriageReply> {
    let raw = match model.generate(history, new_input) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "conversational model failed, using fallback policy");
            return None;
        }
    };

    let parsed = parse_reply(&raw);
    let display = match (parsed.display.is_empty(), &parsed.record) {
        (false, _) => parsed.display,
        (true, Some(_)) => CLOSING_REPLY.to_string(),
        (true, None) => {
            tracing::warn!("conversational model returned an empty reply, using fallback policy");
            return None;
        }
    };

    let urgency = parsed
        .record
        .as_ref()
        .map(CompletionRecord::effective_urgency)
        .unwrap_or_default();

    Some(TriageReply {
        display,
        record: parsed.record,
        urgency,
        source: ReplySource::Model,
    })
}

fn fallback_reply(history: &[ChatTurn], new_input: &str, policy: &FallbackPolicy) -> TriageReply {
    let depth = history.iter().filter(|t| !t.is_user()).count();
    let (next, reply) = policy.step(PolicyState::at_depth(depth), new_input);
    tracing::debug!(depth, topic = ?next.last_topic, closes = reply.closes, "fallback policy step");

    let record = reply.closes.then(|| {
        let mut transcript = history.to_vec();
        transcript.push(ChatTurn::user(new_input));
        CompletionRecord::complete(infer_profile(&transcript), Urgency::Monitor)
    });

    TriageReply {
        display: reply.text,
        record,
        urgency: Urgency::Monitor,
        source: ReplySource::Fallback,
    }
}

/// One participant's conversational intake
#[derive(Debug, Clone, Default)]
pub struct TriageSession {
    transcript: Transcript,
    state: TriageState,
    urgency: Urgency,
    record: Option<CompletionRecord>,
    policy: FallbackPolicy,
}

impl TriageSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: FallbackPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_policy(FallbackPolicy::new(config.closing_depth))
    }

    /// Process one user turn and append it and the reply to the transcript
    pub fn process_turn(&mut self, text: &str, model: Option<&dyn ConversationalModel>) -> TriageReply {
        let reply = if !self.state.is_terminal() {
            respond(&self.transcript, text, model, &self.policy)
        } else if red_flag_in(text).is_some() {
            TriageReply::escalation()
        } else {
            TriageReply::closed()
        };

        self.transcript.push(ChatTurn::user(text));
        self.transcript.push(ChatTurn::assistant(reply.display.clone()));
        self.apply(&reply);
        reply
    }

    fn apply(&mut self, reply: &TriageReply) {
        self.urgency = self.urgency.escalate(reply.urgency);

        if let Some(record) = &reply.record {
            self.record = Some(match (self.record.take(), reply.is_escalation()) {
                // Keep what was already learned when a finished session escalates
                (Some(mut previous), true) => {
                    previous.extracted.red_flag = Some(true);
                    previous.urgency = Urgency::Urgent;
                    previous
                }
                _ => record.clone(),
            });
        }

        self.state = if self.urgency == Urgency::Urgent {
            TriageState::Escalated
        } else if reply.record.is_some() {
            TriageState::Complete
        } else if self.state == TriageState::AwaitingFirstInput {
            TriageState::InConversation
        } else {
            self.state
        };

        if self.state == TriageState::Escalated && reply.urgency == Urgency::Urgent {
            tracing::info!(turns = self.transcript.len(), "session escalated for counselor review");
        }
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    pub fn state(&self) -> TriageState {
        self.state
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    /// Latest completion record, if the conversation has ended
    pub fn record(&self) -> Option<&CompletionRecord> {
        self.record.as_ref()
    }

    /// Extracted profile for the session report
    pub fn extracted(&self) -> Option<&ExtractedProfile> {
        self.record.as_ref().map(|r| &r.extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::ScriptedModel;
    use crate::triage::policy::SLEEP_REPLY;
    use pretty_assertions::assert_eq;

    fn history_at_depth(depth: usize) -> Transcript {
        (0..depth)
            .flat_map(|_| [ChatTurn::user("hmm"), ChatTurn::assistant("Go on.")])
            .collect()
    }

    #[test]
    fn test_escalation_on_final_turn() {
        let model = ScriptedModel::replying(&["should never be used"]);
        let mut session = TriageSession::new();
        session.process_turn("hey", None);
        session.process_turn("not great", None);

        let reply = session.process_turn("I want to die", Some(&model));

        assert_eq!(reply.display, ESCALATION_MESSAGE);
        let record = reply.record.unwrap();
        assert_eq!(record.urgency, Urgency::Urgent);
        assert_eq!(
            record.extracted,
            ExtractedProfile {
                red_flag: Some(true),
                ..Default::default()
            }
        );
        assert!(model.calls().is_empty());
        assert_eq!(session.state(), TriageState::Escalated);
        assert_eq!(session.urgency(), Urgency::Urgent);
    }

    #[test]
    fn test_escalation_at_any_depth() {
        let model = ScriptedModel::replying(&["unused"; 8]);
        for depth in 0..8 {
            let history = history_at_depth(depth);
            let reply = respond(
                &history,
                "I sometimes think I want to die",
                Some(&model),
                &FallbackPolicy::default(),
            );
            assert_eq!(reply.display, ESCALATION_MESSAGE);
            assert_eq!(reply.urgency, Urgency::Urgent);
        }
        assert!(model.calls().is_empty());
    }

    #[test]
    fn test_model_reply_is_used() {
        let model = ScriptedModel::replying(&["That sounds hard. What happened?"]);
        let history = vec![ChatTurn::assistant("How was your day?")];
        let reply = respond(&history, "rough", Some(&model), &FallbackPolicy::default());

        assert_eq!(reply.source, ReplySource::Model);
        assert_eq!(reply.display, "That sounds hard. What happened?");
        assert_eq!(model.calls(), vec![(1, "rough".to_string())]);
    }

    #[test]
    fn test_model_failure_falls_back_for_that_turn_only() {
        let model = ScriptedModel::script(&[None, Some("Tell me more about school.")]);
        let mut session = TriageSession::new();

        let first = session.process_turn("hi", Some(&model));
        assert_eq!(first.source, ReplySource::Fallback);

        let second = session.process_turn("school", Some(&model));
        assert_eq!(second.source, ReplySource::Model);
        assert_eq!(second.display, "Tell me more about school.");
        assert_eq!(model.calls().len(), 2);
    }

    #[test]
    fn test_empty_model_reply_falls_back() {
        let model = ScriptedModel::replying(&["   "]);
        let reply = respond(&[], "hello", Some(&model), &FallbackPolicy::default());
        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(!reply.display.is_empty());
    }

    #[test]
    fn test_model_completion_record_completes_session() {
        let model = ScriptedModel::replying(&[
            "Thanks for chatting!\n```json\n{\"intent\":\"complete\",\"extracted\":{\"mood_word\":\"okay\",\"red_flag\":false},\"urgency\":\"monitor\"}\n```",
        ]);
        let mut session = TriageSession::new();
        let reply = session.process_turn("I'm done", Some(&model));

        assert_eq!(reply.display, "Thanks for chatting!");
        assert_eq!(session.state(), TriageState::Complete);
        assert_eq!(session.urgency(), Urgency::Monitor);
        assert_eq!(
            session.extracted().and_then(|p| p.mood_word.as_deref()),
            Some("okay")
        );
    }

    #[test]
    fn test_model_urgent_record_escalates() {
        let model = ScriptedModel::replying(&[
            "Please reach out to someone.\n```\n{\"extracted\":{\"red_flag\":true},\"urgency\":\"monitor\"}\n```",
        ]);
        let mut session = TriageSession::new();
        let reply = session.process_turn("everything feels pointless", Some(&model));

        assert_eq!(reply.urgency, Urgency::Urgent);
        assert_eq!(session.state(), TriageState::Escalated);
    }

    #[test]
    fn test_fallback_conversation_closes_with_inferred_profile() {
        let mut session = TriageSession::new();
        assert_eq!(session.state(), TriageState::AwaitingFirstInput);

        session.process_turn("hello", None);
        assert_eq!(session.state(), TriageState::InConversation);

        assert_eq!(session.process_turn("It was rough", None).source, ReplySource::Fallback);
        assert_eq!(session.process_turn("I can't sleep", None).display, SLEEP_REPLY);
        session.process_turn("about 5 hours", None);
        let closing = session.process_turn("bye", None);

        assert_eq!(closing.display, CLOSING_REPLY);
        assert_eq!(session.state(), TriageState::Complete);
        let profile = session.extracted().unwrap();
        assert_eq!(profile.mood_word.as_deref(), Some("rough"));
        assert_eq!(profile.sleep_hours, Some(5.0));
        assert_eq!(profile.red_flag, Some(false));
    }

    #[test]
    fn test_terminal_session_acknowledges_without_model() {
        let model = ScriptedModel::replying(&["unused"]);
        let mut session = TriageSession::new();
        session.process_turn("hey", None);
        session.process_turn("done", None);
        assert_eq!(session.state(), TriageState::Complete);
        let record = session.record().cloned();

        let reply = session.process_turn("one more thing", Some(&model));
        assert_eq!(reply.source, ReplySource::Closed);
        assert_eq!(reply.display, CLOSING_REPLY);
        assert!(model.calls().is_empty());
        assert_eq!(session.record().cloned(), record);
    }

    #[test]
    fn test_terminal_session_still_escalates() {
        let mut session = TriageSession::new();
        session.process_turn("hey", None);
        session.process_turn("bye", None);

        let reply = session.process_turn("actually I feel hopeless", None);
        assert!(reply.is_escalation());
        assert_eq!(session.state(), TriageState::Escalated);
        let record = session.record().unwrap();
        assert_eq!(record.urgency, Urgency::Urgent);
        assert_eq!(record.extracted.red_flag, Some(true));

        // Urgency never downgrades
        session.process_turn("ok I'm fine now", None);
        assert_eq!(session.urgency(), Urgency::Urgent);
        assert_eq!(session.state(), TriageState::Escalated);
    }

    #[test]
    fn test_transcript_is_append_only() {
        let mut session = TriageSession::new();
        session.process_turn("hi", None);
        let snapshot = session.transcript().to_vec();
        session.process_turn("school", None);

        assert_eq!(session.transcript().len(), 4);
        assert_eq!(&session.transcript()[..2], snapshot.as_slice());
        assert_eq!(session.transcript()[2], ChatTurn::user("school"));
    }

    #[test]
    fn test_custom_closing_depth() {
        let config = EngineConfig {
            closing_depth: 1,
            ..EngineConfig::default()
        };
        let mut session = TriageSession::from_config(&config);
        session.process_turn("hey", None);
        session.process_turn("hmm", None);
        session.process_turn("hmm", None);
        assert_eq!(session.state(), TriageState::Complete);
    }
}
