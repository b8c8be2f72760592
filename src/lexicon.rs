//! Fixed keyword lexicons
//!
//! All matching here is case-insensitive substring containment, not tokenized
//! word matching. Short entries can fire inside longer unrelated words ("cut"
//! inside "cute", "bad" inside "badminton"); that imprecision is accepted for
//! the safety list, where a false positive only costs a counselor review.

/// Phrases whose presence in a user turn mandates immediate escalation
pub const RED_FLAG_PHRASES: &[&str] = &[
    "suicidal",
    "kill myself",
    "want to die",
    "cut",
    "overdose",
    "harm myself",
    "hopeless",
    "no hope",
    "plan to",
];

/// Words that mark a user turn as negatively toned
pub const NEGATIVE_WORDS: &[&str] = &["sad", "angry", "hopeless", "rough", "bad"];

/// Escalation message shown verbatim whenever a red flag fires
pub const ESCALATION_MESSAGE: &str = "I’m really sorry you’re feeling this way. I’m not able to provide emergency help. If you are in immediate danger or thinking about harming yourself, please contact local emergency services right now, or a crisis line. If you can, tell me if you are safe right now. I will flag this session for the counselor to review immediately.";

/// First lexicon entry contained in `text`, ignoring case
pub fn first_match<'a>(text: &str, lexicon: &[&'a str]) -> Option<&'a str> {
    let lowered = text.to_lowercase();
    lexicon
        .iter()
        .copied()
        .find(|entry| lowered.contains(entry))
}

/// Whether any lexicon entry is contained in `text`, ignoring case
pub fn contains_any(text: &str, lexicon: &[&str]) -> bool {
    first_match(text, lexicon).is_some()
}

/// Red-flag phrase contained in a user turn, if any
pub fn red_flag_in(text: &str) -> Option<&'static str> {
    first_match(text, RED_FLAG_PHRASES)
}

/// Whether a user turn carries negative tone
pub fn is_negative(text: &str) -> bool {
    contains_any(text, NEGATIVE_WORDS)
}
