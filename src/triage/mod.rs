//! Conversational triage module
//!
//! This module drives the chat intake: red-flag escalation on every user
//! turn, model-backed or scripted replies, and the structured extraction a
//! finished conversation yields.
//!
//! Pipeline: user turn → safety check → model / fallback policy → fenced
//! block extraction → CompletionRecord

pub mod extraction;
pub mod inference;
pub mod policy;
pub mod prompt;
pub mod session;

pub use extraction::{locate_fenced_block, parse_record, parse_reply, ParsedReply};
pub use inference::infer_profile;
pub use policy::{FallbackPolicy, PolicyReply, PolicyState, Topic, DEFAULT_CLOSING_DEPTH};
pub use prompt::system_prompt;
pub use session::{respond, ReplySource, TriageReply, TriageSession, TriageState};
