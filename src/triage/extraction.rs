//! Structured extraction from assistant replies
//!
//! A completing reply carries its payload in a fenced code block, either
//! ```` ```json ```` tagged or a plain ```` ``` ```` fence. The block is parsed
//! into a [`CompletionRecord`] and removed from the text shown to the user.
//! Extraction is best-effort: a missing or malformed block yields `None`.

use serde_json::Value;

use crate::types::{CompletionRecord, ExtractedProfile, Urgency};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// A fenced block located inside free text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Trimmed contents between the fences
    pub body: &'a str,
    /// Byte offset where the opening fence starts
    pub start: usize,
    /// Byte offset just past the closing fence (or end of text if unclosed)
    pub end: usize,
}

/// An assistant reply split into display text and structured payload
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    /// Reply text with the fenced block removed
    pub display: String,
    /// Parsed payload, if a usable block was present
    pub record: Option<CompletionRecord>,
}

/// Locate the first fenced block, preferring a ```` ```json ```` fence.
pub fn locate_fenced_block(text: &str) -> Option<FencedBlock<'_>> {
    let (start, body_start) = match text.find(JSON_FENCE) {
        Some(pos) => (pos, pos + JSON_FENCE.len()),
        None => {
            let pos = text.find(FENCE)?;
            (pos, pos + FENCE.len())
        }
    };

    let (body_end, end) = match text[body_start..].find(FENCE) {
        Some(offset) => (body_start + offset, body_start + offset + FENCE.len()),
        None => (text.len(), text.len()),
    };

    Some(FencedBlock {
        body: text[body_start..body_end].trim(),
        start,
        end,
    })
}

/// Split a reply into display text and an optional completion record.
///
/// The display text is everything before the fence, trimmed. When that is
/// empty (a reply that is only a block), the text after the fence is used.
pub fn parse_reply(reply: &str) -> ParsedReply {
    let Some(block) = locate_fenced_block(reply) else {
        return ParsedReply {
            display: reply.trim().to_string(),
            record: None,
        };
    };

    let before = reply[..block.start].trim();
    let display = if before.is_empty() {
        reply[block.end..].trim().to_string()
    } else {
        before.to_string()
    };

    let record = parse_record(block.body);
    if record.is_none() {
        tracing::warn!("discarding malformed extraction block");
    }

    ParsedReply { display, record }
}

/// Parse a completion payload.
///
/// Accepts the `{intent, extracted, urgency}` envelope or a bare profile
/// object. Individual fields with unexpected types are dropped rather than
/// failing the whole record.
pub fn parse_record(json: &str) -> Option<CompletionRecord> {
    let value: Value = serde_json::from_str(json).ok()?;
    let object = value.as_object()?;

    let profile_value = object.get("extracted").unwrap_or(&value);
    let extracted = profile_from_value(profile_value)?;

    let urgency = match object.get("urgency").and_then(Value::as_str) {
        Some(s) if s.eq_ignore_ascii_case("urgent") => Urgency::Urgent,
        _ => Urgency::Monitor,
    };
    let intent = object
        .get("intent")
        .and_then(Value::as_str)
        .unwrap_or("complete")
        .to_string();

    Some(CompletionRecord {
        intent,
        extracted,
        urgency,
    })
}

/// Build a profile from a JSON object, keeping only well-typed fields
pub(crate) fn profile_from_value(value: &Value) -> Option<ExtractedProfile> {
    let object = value.as_object()?;
    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let sleep_hours = object.get("sleep_hours").and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });

    Some(ExtractedProfile {
        mood_word: text("mood_word"),
        mood_tone: text("mood_tone"),
        sleep_hours,
        main_stressor: text("main_stressor"),
        decision_style: text("decision_style"),
        red_flag: object.get("red_flag").and_then(Value::as_bool),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reply_without_block() {
        let parsed = parse_reply("  How was school today?  ");
        assert_eq!(parsed.display, "How was school today?");
        assert_eq!(parsed.record, None);
    }

    #[test]
    fn test_json_fence_is_stripped_and_parsed() {
        let reply = "Thanks for sharing. Take care!\n```json\n{\"intent\": \"complete\", \"extracted\": {\"mood_word\": \"okay\", \"sleep_hours\": 7, \"red_flag\": false}, \"urgency\": \"monitor\"}\n```";
        let parsed = parse_reply(reply);

        assert_eq!(parsed.display, "Thanks for sharing. Take care!");
        let record = parsed.record.unwrap();
        assert_eq!(record.intent, "complete");
        assert_eq!(record.urgency, Urgency::Monitor);
        assert_eq!(
            record.extracted,
            ExtractedProfile {
                mood_word: Some("okay".to_string()),
                sleep_hours: Some(7.0),
                red_flag: Some(false),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_plain_fence_is_accepted() {
        let reply = "Noted.\n```\n{\"extracted\": {\"main_stressor\": \"exams\"}, \"urgency\": \"urgent\"}\n```";
        let parsed = parse_reply(reply);
        assert_eq!(parsed.display, "Noted.");
        let record = parsed.record.unwrap();
        assert_eq!(record.urgency, Urgency::Urgent);
        assert_eq!(record.extracted.main_stressor.as_deref(), Some("exams"));
    }

    #[test]
    fn test_bare_profile_object() {
        let record = parse_record(r#"{"mood_word": "rough", "mood_tone": "negative"}"#).unwrap();
        assert_eq!(record.intent, "complete");
        assert_eq!(record.extracted.mood_tone.as_deref(), Some("negative"));
    }

    #[test]
    fn test_malformed_block_yields_no_record() {
        let parsed = parse_reply("All done!\n```json\n{not json at all\n```");
        assert_eq!(parsed.display, "All done!");
        assert_eq!(parsed.record, None);

        assert_eq!(parse_record("[1, 2, 3]"), None);
        assert_eq!(parse_record(r#"{"extracted": "nope"}"#), None);
    }

    #[test]
    fn test_mistyped_fields_are_dropped() {
        let record =
            parse_record(r#"{"extracted": {"sleep_hours": "6.5", "red_flag": "yes", "mood_word": 4}}"#)
                .unwrap();
        assert_eq!(record.extracted.sleep_hours, Some(6.5));
        assert_eq!(record.extracted.red_flag, None);
        assert_eq!(record.extracted.mood_word, None);
    }

    #[test]
    fn test_block_only_reply_uses_trailing_text() {
        let parsed = parse_reply("```json\n{\"extracted\": {}}\n```\nTake care!");
        assert_eq!(parsed.display, "Take care!");
        assert!(parsed.record.is_some());
    }

    #[test]
    fn test_unclosed_fence() {
        let block = locate_fenced_block("text ```json {\"a\": 1}").unwrap();
        assert_eq!(block.body, "{\"a\": 1}");
        assert_eq!(block.start, 5);
    }
}
