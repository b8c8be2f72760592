//! Quiz telemetry scoring module
//!
//! This module scores the reaction, decision and emotion-sort tasks into stress,
//! attention, impulsivity and emotional-bias indicators, and supplies the
//! decision-task scenarios shown to participants.
//!
//! Pipeline: Quiz JSON → QuizData (lenient parse) → QuizScorer → QuizAssessment

pub mod generator;
pub mod scorer;
pub mod stats;
pub mod types;

pub use generator::{generate_questions, static_questions, OptionType, QuizOption, QuizQuestion};
pub use scorer::{
    attention_score, emotional_bias, impulsivity_label, score_quiz, stress_label,
    stress_score, QuizAssessment, QuizScorer,
};
pub use types::{Choice, DecisionTelemetry, EmotionSortTelemetry, QuizData, ReactionTelemetry};
