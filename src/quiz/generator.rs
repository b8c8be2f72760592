//! Decision-task question generation
//!
//! Scenario questions can be generated by an external model for onboarding
//! context. Generation is fail-soft: any failure or unusable output yields the
//! fixed two-item static list.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::QuizGenerator;
use crate::quiz::types::Choice;
use crate::triage::extraction::locate_fenced_block;

/// Taxonomy tag of an answer option, serialized in title case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(alias = "calm")]
    Calm,
    #[serde(alias = "impulsive")]
    Impulsive,
    #[serde(alias = "avoidant")]
    Avoidant,
}

impl OptionType {
    /// Decision telemetry label recorded when this option is picked
    pub fn choice(self) -> Choice {
        match self {
            OptionType::Calm => Choice::Calm,
            OptionType::Impulsive => Choice::Impulsive,
            OptionType::Avoidant => Choice::Avoidant,
        }
    }
}

/// One answer option of a decision scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: OptionType,
}

/// A decision scenario shown to the participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub text: String,
    pub options: Vec<QuizOption>,
}

impl QuizQuestion {
    fn new(text: &str, options: [(&str, OptionType); 3]) -> Self {
        Self {
            text: text.to_string(),
            options: options
                .into_iter()
                .map(|(label, kind)| QuizOption {
                    label: label.to_string(),
                    kind,
                })
                .collect(),
        }
    }

    fn is_usable(&self) -> bool {
        !self.text.trim().is_empty()
            && !self.options.is_empty()
            && self.options.iter().all(|o| !o.label.trim().is_empty())
    }
}

/// Questions used whenever generation is unavailable
pub fn static_questions() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion::new(
            "You have a big test tomorrow but your friends are going out tonight.",
            [
                ("Study at home", OptionType::Calm),
                ("Go out with friends", OptionType::Impulsive),
                ("Ignore both", OptionType::Avoidant),
            ],
        ),
        QuizQuestion::new(
            "Someone posts something mean about you online.",
            [
                ("Talk to them directly", OptionType::Calm),
                ("Post something back", OptionType::Impulsive),
                ("Pretend you didn't see it", OptionType::Avoidant),
            ],
        ),
    ]
}

/// Prompt sent to a model asked for new scenarios
pub fn question_prompt(context: &str) -> String {
    let context = if context.trim().is_empty() {
        "General stress and anxiety"
    } else {
        context.trim()
    };
    format!(
        "Generate 2 decision-making scenarios for a teenager.\n\
         Context: {context}.\n\
         Output strictly valid JSON list of objects with keys: 'text' (scenario description), \
         'options' (list of 3 objects with 'label' and 'type' (Calm/Impulsive/Avoidant)).\n\
         Example: [{{\"text\": \"...\", \"options\": [{{\"label\": \"...\", \"type\": \"Calm\"}}]}}]"
    )
}

/// Parse generated questions from raw model text.
///
/// Accepts a fenced JSON block or bare JSON. Returns `None` when nothing
/// usable is found, including options tagged outside Calm/Impulsive/Avoidant.
pub fn parse_questions(raw: &str) -> Option<Vec<QuizQuestion>> {
    let json = locate_fenced_block(raw)
        .map(|block| block.body)
        .unwrap_or_else(|| raw.trim());

    let questions: Vec<QuizQuestion> = serde_json::from_str(json).ok()?;
    if questions.is_empty() || !questions.iter().all(QuizQuestion::is_usable) {
        return None;
    }
    Some(questions)
}

/// Generate decision scenarios, falling back to [`static_questions`].
pub fn generate_questions(context: &str, generator: Option<&dyn QuizGenerator>) -> Vec<QuizQuestion> {
    let Some(generator) = generator else {
        return static_questions();
    };

    match generator.generate_questions(context) {
        Ok(questions) if !questions.is_empty() => questions,
        Ok(_) => {
            tracing::warn!("quiz generation returned no questions, using static list");
            static_questions()
        }
        Err(e) => {
            tracing::warn!(error = %e, "quiz generation failed, using static list");
            static_questions()
        }
    }
}

/// Shared helper for generators that produce free text
pub(crate) fn questions_from_text(raw: &str) -> Result<Vec<QuizQuestion>, ModelError> {
    parse_questions(raw)
        .ok_or_else(|| ModelError::MalformedResponse("no usable question list in reply".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::ScriptedModel;

    #[test]
    fn test_static_questions_shape() {
        let questions = static_questions();
        assert_eq!(questions.len(), 2);
        for q in &questions {
            assert_eq!(q.options.len(), 3);
            assert_eq!(q.options[1].kind, OptionType::Impulsive);
        }
    }

    #[test]
    fn test_static_question_wire_format() {
        let json = serde_json::to_value(&static_questions()[0]).unwrap();
        assert_eq!(json["options"][0]["label"], "Study at home");
        let types: Vec<&str> = json["options"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["Calm", "Impulsive", "Avoidant"]);
    }

    #[test]
    fn test_option_type_maps_to_telemetry_choice() {
        let picked: Vec<Choice> = static_questions()[1].options.iter().map(|o| o.kind.choice()).collect();
        assert_eq!(picked, vec![Choice::Calm, Choice::Impulsive, Choice::Avoidant]);
    }

    #[test]
    fn test_parse_rejects_unknown_option_type() {
        let raw = r#"[{"text": "A friend cancels plans.", "options": [
            {"label": "Ask why", "type": "Calm"},
            {"label": "Shrug", "type": "Indifferent"}]}]"#;
        assert!(parse_questions(raw).is_none());

        let model = ScriptedModel::replying(&[raw]);
        assert_eq!(generate_questions("friends", Some(&model)), static_questions());
    }

    #[test]
    fn test_parse_fenced_questions() {
        let raw = "Here you go:\n```json\n[{\"text\": \"A friend cancels plans.\", \"options\": [\
                   {\"label\": \"Ask why\", \"type\": \"Calm\"},\
                   {\"label\": \"Send an angry text\", \"type\": \"Impulsive\"},\
                   {\"label\": \"Say nothing\", \"type\": \"Avoidant\"}]}]\n```";
        let questions = parse_questions(raw).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options[2].kind, OptionType::Avoidant);
    }

    #[test]
    fn test_parse_bare_json_and_rejects_garbage() {
        let raw = r#"[{"text": "Exam results are out.", "options": [{"label": "Check calmly", "type": "calm"}]}]"#;
        assert!(parse_questions(raw).is_some());
        assert!(parse_questions("no json here").is_none());
        assert!(parse_questions("[]").is_none());
        assert!(parse_questions(r#"[{"text": "", "options": []}]"#).is_none());
    }

    #[test]
    fn test_question_prompt_defaults_context() {
        assert!(question_prompt("  ").contains("General stress and anxiety"));
        assert!(question_prompt("exam season").contains("Context: exam season."));
    }

    #[test]
    fn test_generate_without_generator_uses_static() {
        assert_eq!(generate_questions("", None), static_questions());
    }

    #[test]
    fn test_generate_falls_back_on_failure() {
        let failing = ScriptedModel::failing();
        assert_eq!(generate_questions("exams", Some(&failing)), static_questions());

        let garbage = ScriptedModel::replying(&["definitely not json"]);
        assert_eq!(generate_questions("exams", Some(&garbage)), static_questions());
    }

    #[test]
    fn test_generate_uses_model_output() {
        let model = ScriptedModel::replying(&[
            r#"```json
[{"text": "Your phone buzzes during homework.", "options": [{"label": "Finish first", "type": "Calm"}]}]
```"#,
        ]);
        let questions = generate_questions("focus", Some(&model));
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Your phone buzzes during homework.");
    }
}
