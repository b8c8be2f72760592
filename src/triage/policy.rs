//! Deterministic fallback dialogue policy
//!
//! Used whenever the conversational model is unavailable. The policy is a pure
//! function from `(PolicyState, user input)` to `(PolicyState, PolicyReply)`;
//! its state is the number of assistant turns already produced plus the topic
//! the last user turn matched.

use serde::{Deserialize, Serialize};

/// Default assistant depth after which the policy closes the conversation
pub const DEFAULT_CLOSING_DEPTH: usize = 3;

const GREETING: &str =
    "Hi there. I'm here to chat and see how things are going. How was your day? (great/okay/rough)";
const HELLO_REPLY: &str = "Hey there! I'm listening. How are things going for you today?";
const CHECK_IN_REPLY: &str =
    "I'm just a computer program, but I'm here to support you! How are *you* doing?";
const ROUGH_REPLY: &str =
    "I'm sorry to hear that. Which area was rough? (school/family/friends/sleep/other)";
const SCHOOL_REPLY: &str =
    "School can be stressful. Is there anything specific worrying you a lot this week?";
pub(crate) const SLEEP_REPLY: &str = "Sleep is important. How many hours did you sleep last night?";
pub(crate) const CLOSING_REPLY: &str = "Thanks for sharing. I've noted everything down. Take care!";

const GENERIC_REPLIES: &[&str] = &[
    "I hear you. Tell me a bit more about that?",
    "That sounds important. How does that make you feel?",
    "I'm listening. Please go on.",
    "It's okay to feel that way. I'm here with you.",
    "Can you help me understand a little better?",
];

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey"];
const CLOSING_WORDS: &[&str] = &["bye", "done"];

/// Topic a user turn matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Greeting,
    CheckIn,
    Rough,
    School,
    Sleep,
    Closing,
}

impl Topic {
    /// Classify a user turn. Topic keywords win over closing words.
    pub fn detect(input: &str) -> Option<Topic> {
        let lowered = input.to_lowercase();
        let greeted = words(&lowered).any(|w| GREETING_WORDS.contains(&w));
        if greeted {
            Some(Topic::Greeting)
        } else if lowered.contains("how are you") {
            Some(Topic::CheckIn)
        } else if lowered.contains("rough") {
            Some(Topic::Rough)
        } else if lowered.contains("school") || lowered.contains("exams") {
            Some(Topic::School)
        } else if lowered.contains("sleep") {
            Some(Topic::Sleep)
        } else if CLOSING_WORDS.iter().any(|w| lowered.contains(w)) {
            Some(Topic::Closing)
        } else {
            None
        }
    }
}

/// Conversation position as seen by the fallback policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyState {
    /// Assistant turns produced so far
    pub depth: usize,
    /// Topic matched by the most recent user turn
    pub last_topic: Option<Topic>,
}

impl PolicyState {
    pub fn at_depth(depth: usize) -> Self {
        Self {
            depth,
            last_topic: None,
        }
    }
}

/// Reply chosen by the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyReply {
    pub text: String,
    /// Whether this reply closes the conversation and should carry an extraction
    pub closes: bool,
}

impl PolicyReply {
    fn say(text: &str) -> Self {
        Self {
            text: text.to_string(),
            closes: false,
        }
    }

    fn close() -> Self {
        Self {
            text: CLOSING_REPLY.to_string(),
            closes: true,
        }
    }
}

/// Keyword and depth driven dialogue policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    closing_depth: usize,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSING_DEPTH)
    }
}

impl FallbackPolicy {
    /// The conversation closes once the assistant depth exceeds `closing_depth`
    pub fn new(closing_depth: usize) -> Self {
        Self { closing_depth }
    }

    /// Advance the dialogue by one user turn
    pub fn step(&self, state: PolicyState, input: &str) -> (PolicyState, PolicyReply) {
        let topic = Topic::detect(input);
        let next = PolicyState {
            depth: state.depth + 1,
            last_topic: topic,
        };

        if state.depth == 0 {
            return (next, PolicyReply::say(GREETING));
        }

        let reply = match topic {
            Some(Topic::Greeting) => PolicyReply::say(HELLO_REPLY),
            Some(Topic::CheckIn) => PolicyReply::say(CHECK_IN_REPLY),
            Some(Topic::Rough) => PolicyReply::say(ROUGH_REPLY),
            Some(Topic::School) => PolicyReply::say(SCHOOL_REPLY),
            Some(Topic::Sleep) => PolicyReply::say(SLEEP_REPLY),
            Some(Topic::Closing) => PolicyReply::close(),
            None if state.depth > self.closing_depth => PolicyReply::close(),
            None => PolicyReply::say(GENERIC_REPLIES[state.depth % GENERIC_REPLIES.len()]),
        };
        (next, reply)
    }
}

/// Lowercase alphanumeric words of `text`
pub(crate) fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'' && c != '.')
        .map(|w| w.trim_matches(|c: char| c == '\'' || c == '.'))
        .filter(|w| !w.is_empty())
}
