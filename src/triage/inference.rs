//! Profile inference for fallback conversations
//!
//! When the fallback policy closes a conversation there is no model to write
//! the extraction, so the profile is inferred from the user turns. Only fields
//! with direct evidence in the transcript are populated.

use crate::triage::policy::{words, SLEEP_REPLY};
use crate::types::{ChatRole, ChatTurn, ExtractedProfile};

/// Mood words and the tone each implies
const MOOD_WORDS: &[(&str, &str)] = &[
    ("great", "positive"),
    ("good", "positive"),
    ("okay", "neutral"),
    ("ok", "neutral"),
    ("fine", "neutral"),
    ("rough", "negative"),
    ("tired", "negative"),
    ("bad", "negative"),
    ("sad", "negative"),
    ("stressed", "negative"),
];

/// Stressor keywords, most specific first
const STRESSORS: &[(&str, &str)] = &[
    ("exam", "exams"),
    ("test", "exams"),
    ("school", "school"),
    ("homework", "school"),
    ("family", "family"),
    ("parent", "family"),
    ("friend", "friends"),
    ("sleep", "sleep"),
];

const NUMBER_WORDS: &[(&str, f64)] = &[
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
    ("eleven", 11.0),
    ("twelve", 12.0),
];

/// Plausible nightly sleep range in hours
const MAX_SLEEP_HOURS: f64 = 24.0;

/// Infer a profile from a fallback conversation
pub fn infer_profile(transcript: &[ChatTurn]) -> ExtractedProfile {
    let user_turns: Vec<&str> = transcript
        .iter()
        .filter(|t| t.is_user())
        .map(|t| t.text.as_str())
        .collect();

    let mood = user_turns.iter().find_map(|text| mood_in(text));

    ExtractedProfile {
        mood_word: mood.map(|(word, _)| word.to_string()),
        mood_tone: mood.map(|(_, tone)| tone.to_string()),
        sleep_hours: sleep_answer(transcript),
        main_stressor: user_turns
            .iter()
            .find_map(|text| stressor_in(text))
            .map(str::to_string),
        decision_style: None,
        red_flag: Some(false),
    }
}

fn mood_in(text: &str) -> Option<(&'static str, &'static str)> {
    let lowered = text.to_lowercase();
    let found = words(&lowered)
        .find_map(|w| MOOD_WORDS.iter().copied().find(|(mood, _)| *mood == w));
    found
}

fn stressor_in(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    STRESSORS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, stressor)| *stressor)
}

/// Hours given in the user turn that answers the sleep prompt
fn sleep_answer(transcript: &[ChatTurn]) -> Option<f64> {
    transcript
        .windows(2)
        .filter(|pair| pair[0].role == ChatRole::Assistant && pair[0].text == SLEEP_REPLY)
        .filter(|pair| pair[1].is_user())
        .find_map(|pair| first_number(&pair[1].text))
}

fn first_number(text: &str) -> Option<f64> {
    let lowered = text.to_lowercase();
    let hours = words(&lowered).find_map(|w| {
        w.parse::<f64>()
            .ok()
            .or_else(|| NUMBER_WORDS.iter().find(|(name, _)| *name == w).map(|(_, n)| *n))
    });
    hours.filter(|hours| (0.0..=MAX_SLEEP_HOURS).contains(hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_infers_from_rough_school_conversation() {
        let transcript = vec![
            ChatTurn::assistant("How was your day? (great/okay/rough)"),
            ChatTurn::user("It was rough."),
            ChatTurn::assistant("Which area was rough?"),
            ChatTurn::user("school exams"),
            ChatTurn::assistant(SLEEP_REPLY),
            ChatTurn::user("maybe 5 hours"),
        ];

        assert_eq!(
            infer_profile(&transcript),
            ExtractedProfile {
                mood_word: Some("rough".to_string()),
                mood_tone: Some("negative".to_string()),
                sleep_hours: Some(5.0),
                main_stressor: Some("exams".to_string()),
                decision_style: None,
                red_flag: Some(false),
            }
        );
    }

    #[test]
    fn test_only_evidenced_fields_are_set() {
        let transcript = vec![ChatTurn::user("meh"), ChatTurn::assistant("Go on."), ChatTurn::user("bye")];
        let profile = infer_profile(&transcript);
        assert_eq!(profile.mood_word, None);
        assert_eq!(profile.sleep_hours, None);
        assert_eq!(profile.main_stressor, None);
        assert_eq!(profile.red_flag, Some(false));
    }

    #[test]
    fn test_sleep_hours_from_words_and_bounds() {
        let words_answer = vec![ChatTurn::assistant(SLEEP_REPLY), ChatTurn::user("about six")];
        assert_eq!(infer_profile(&words_answer).sleep_hours, Some(6.0));

        let implausible = vec![ChatTurn::assistant(SLEEP_REPLY), ChatTurn::user("like 100")];
        assert_eq!(infer_profile(&implausible).sleep_hours, None);

        // Numbers outside the sleep answer are ignored
        let unrelated = vec![ChatTurn::assistant("Go on."), ChatTurn::user("I have 3 tests")];
        assert_eq!(infer_profile(&unrelated).sleep_hours, None);
    }

    #[test]
    fn test_mood_uses_whole_words() {
        // "good" must not fire inside "goodbye"
        let transcript = vec![ChatTurn::user("goodbye")];
        assert_eq!(infer_profile(&transcript).mood_word, None);

        let great = vec![ChatTurn::user("Great, thanks")];
        assert_eq!(infer_profile(&great).mood_tone.as_deref(), Some("positive"));
    }

    #[test]
    fn test_word_scanners() {
        assert_eq!(mood_in("Honestly pretty TIRED today"), Some(("tired", "negative")));
        assert_eq!(mood_in("nothing to report"), None);
        assert_eq!(first_number("slept 6.5 hrs"), Some(6.5));
        assert_eq!(first_number("Eight, I think"), Some(8.0));
        assert_eq!(first_number("no idea"), None);
    }
}
