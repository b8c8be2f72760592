//! Quiz telemetry types
//!
//! Telemetry arrives from the quiz client as loosely-typed JSON. Every field
//! is deserialized leniently: a missing, null or malformed field becomes its
//! neutral default instead of failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a field, falling back to its default when the value does not fit
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Choice taxonomy of the decision task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    #[serde(alias = "Calm")]
    Calm,
    #[serde(alias = "Impulsive")]
    Impulsive,
    #[serde(alias = "Avoidant")]
    Avoidant,
    /// Any label outside the fixed taxonomy. Counts towards the total only.
    #[serde(other)]
    Other,
}

/// Reaction task telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionTelemetry {
    /// Reaction time samples in milliseconds
    #[serde(default, deserialize_with = "lenient")]
    pub reaction_times: Vec<f64>,
    /// Trials with no response
    #[serde(default, deserialize_with = "lenient")]
    pub misses: u32,
}

impl ReactionTelemetry {
    /// Responded trials plus misses
    pub fn total_trials(&self) -> usize {
        self.reaction_times.len() + self.misses as usize
    }
}

/// Decision task telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionTelemetry {
    /// Choice labels in presentation order
    #[serde(default, deserialize_with = "lenient")]
    pub choices: Vec<Choice>,
    /// Choice latencies in milliseconds, parallel to `choices`
    #[serde(default, deserialize_with = "lenient")]
    pub choice_times: Vec<f64>,
}

impl DecisionTelemetry {
    pub fn count(&self, choice: Choice) -> usize {
        self.choices.iter().filter(|c| **c == choice).count()
    }
}

/// Emotion sort task telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionSortTelemetry {
    /// Share of faces sorted correctly (0-1)
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Share of neutral/positive faces sorted as negative (0-1)
    #[serde(default, deserialize_with = "lenient")]
    pub negative_confusions: f64,
    /// Mean response time in milliseconds
    #[serde(
        default,
        alias = "mean_rt",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub avg_time: Option<f64>,
}

/// All quiz telemetry captured for a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizData {
    #[serde(default, deserialize_with = "lenient")]
    pub reaction: ReactionTelemetry,
    #[serde(default, deserialize_with = "lenient")]
    pub decision: DecisionTelemetry,
    #[serde(default, deserialize_with = "lenient")]
    pub emotion_sort: EmotionSortTelemetry,
}
