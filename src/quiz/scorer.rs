//! Quiz scoring
//!
//! Maps raw quiz telemetry to four independent indicators. Every function is
//! pure: the same `QuizData` always yields the same result, and absent
//! telemetry is scored as the statistically neutral value.

use serde::{Deserialize, Serialize};

use crate::lexicon;
use crate::quiz::stats::{mean, proportion, sample_std_dev};
use crate::quiz::types::{Choice, QuizData};
use crate::types::{ChatTurn, EmotionalBias, ImpulsivityLabel, StressLabel};

/// Stress score every session starts from
const STRESS_BASELINE: f64 = 0.3;

/// Mean reaction time (ms) above which stress is raised
const SLOW_REACTION_MS: f64 = 450.0;
const SLOW_REACTION_WEIGHT: f64 = 0.2;

/// Miss rate above which stress is raised
const MISS_RATE_THRESHOLD: f64 = 0.1;
const MISS_RATE_WEIGHT: f64 = 0.15;

/// Negative confusion share above which stress is raised and bias turns negative
const NEGATIVE_CONFUSION_THRESHOLD: f64 = 0.2;
const NEGATIVE_CONFUSION_WEIGHT: f64 = 0.2;

/// Impulsive choice share above which stress is raised and impulsivity is High
const HIGH_IMPULSIVITY: f64 = 0.5;
const IMPULSIVITY_WEIGHT: f64 = 0.2;

/// Lower bound of the Moderate impulsivity band (inclusive)
const MODERATE_IMPULSIVITY: f64 = 0.25;

/// Stress label cut points
const STRESS_LOW_BELOW: f64 = 0.33;
const STRESS_MODERATE_BELOW: f64 = 0.66;

/// All quiz-derived indicators for one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuizAssessment {
    pub stress_score: f64,
    pub stress_label: StressLabel,
    pub attention_score: f64,
    pub impulsivity: ImpulsivityLabel,
    pub emotional_bias: EmotionalBias,
}

/// Scorer for quiz telemetry
pub struct QuizScorer;

impl QuizScorer {
    /// Run every quiz indicator over one session's telemetry
    pub fn score(quiz: &QuizData, transcript: &[ChatTurn]) -> QuizAssessment {
        let stress = stress_score(quiz, transcript);
        QuizAssessment {
            stress_score: stress,
            stress_label: stress_label(stress),
            attention_score: attention_score(quiz),
            impulsivity: impulsivity_label(quiz),
            emotional_bias: emotional_bias(quiz, transcript),
        }
    }
}

/// Convenience wrapper around [`QuizScorer::score`]
pub fn score_quiz(quiz: &QuizData, transcript: &[ChatTurn]) -> QuizAssessment {
    QuizScorer::score(quiz, transcript)
}

/// Compute the stress score (0-1)
///
/// Formula:
/// ```text
/// stress = 0.3
///        + 0.2  if mean_rt > 450ms
///        + 0.15 if miss_rate > 0.1
///        + 0.2  if negative_confusions > 0.2
///        + 0.2  if impulsive_share > 0.5
/// ```
/// clamped to [0, 1].
///
/// The transcript is accepted alongside [`emotional_bias`] but does not move
/// the numeric score.
pub fn stress_score(quiz: &QuizData, _transcript: &[ChatTurn]) -> f64 {
    let mut score = STRESS_BASELINE;

    if mean(&quiz.reaction.reaction_times) > SLOW_REACTION_MS {
        score += SLOW_REACTION_WEIGHT;
    }
    if miss_rate(quiz) > MISS_RATE_THRESHOLD {
        score += MISS_RATE_WEIGHT;
    }
    if quiz.emotion_sort.negative_confusions > NEGATIVE_CONFUSION_THRESHOLD {
        score += NEGATIVE_CONFUSION_WEIGHT;
    }
    if impulsive_share(quiz) > HIGH_IMPULSIVITY {
        score += IMPULSIVITY_WEIGHT;
    }

    score.clamp(0.0, 1.0)
}

/// Compute the attention score (0-100)
///
/// Formula: `100 - mean_rt/10 - stdev_rt/2 - misses*10`, clamped.
/// Sessions without any reaction samples score exactly 0.
pub fn attention_score(quiz: &QuizData) -> f64 {
    let samples = &quiz.reaction.reaction_times;
    if samples.is_empty() {
        return 0.0;
    }

    let score = 100.0
        - mean(samples) / 10.0
        - sample_std_dev(samples) / 2.0
        - quiz.reaction.misses as f64 * 10.0;
    score.clamp(0.0, 100.0)
}

/// Classify impulsivity from the share of impulsive choices
///
/// `> 0.5` High, `[0.25, 0.5]` Moderate, below Low, no choices Unknown.
pub fn impulsivity_label(quiz: &QuizData) -> ImpulsivityLabel {
    if quiz.decision.choices.is_empty() {
        return ImpulsivityLabel::Unknown;
    }

    let share = impulsive_share(quiz);
    if share > HIGH_IMPULSIVITY {
        ImpulsivityLabel::High
    } else if share >= MODERATE_IMPULSIVITY {
        ImpulsivityLabel::Moderate
    } else {
        ImpulsivityLabel::Low
    }
}

/// Classify emotional bias from the emotion sort task and user chat turns
pub fn emotional_bias(quiz: &QuizData, transcript: &[ChatTurn]) -> EmotionalBias {
    let negative_chat = transcript
        .iter()
        .filter(|turn| turn.is_user())
        .any(|turn| lexicon::is_negative(&turn.text));

    if quiz.emotion_sort.negative_confusions > NEGATIVE_CONFUSION_THRESHOLD || negative_chat {
        EmotionalBias::Negative
    } else {
        EmotionalBias::NeutralOrPositive
    }
}

/// Map a stress score to its band
pub fn stress_label(score: f64) -> StressLabel {
    if score < STRESS_LOW_BELOW {
        StressLabel::Low
    } else if score < STRESS_MODERATE_BELOW {
        StressLabel::Moderate
    } else {
        StressLabel::High
    }
}

fn miss_rate(quiz: &QuizData) -> f64 {
    proportion(quiz.reaction.misses as usize, quiz.reaction.total_trials())
}

fn impulsive_share(quiz: &QuizData) -> f64 {
    proportion(
        quiz.decision.count(Choice::Impulsive),
        quiz.decision.choices.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::types::{DecisionTelemetry, EmotionSortTelemetry, ReactionTelemetry};

    fn quiz(rts: &[f64], misses: u32, choices: &[Choice], negative_confusions: f64) -> QuizData {
        QuizData {
            reaction: ReactionTelemetry {
                reaction_times: rts.to_vec(),
                misses,
            },
            decision: DecisionTelemetry {
                choices: choices.to_vec(),
                choice_times: vec![],
            },
            emotion_sort: EmotionSortTelemetry {
                accuracy: None,
                negative_confusions,
                avg_time: None,
            },
        }
    }

    fn choices_with_share(impulsive: usize, total: usize) -> Vec<Choice> {
        (0..total)
            .map(|i| if i < impulsive { Choice::Impulsive } else { Choice::Calm })
            .collect()
    }

    #[test]
    fn test_stress_all_signals_clamps_to_one() {
        let q = quiz(
            &[500.0, 520.0, 480.0],
            2,
            &[Choice::Impulsive, Choice::Impulsive, Choice::Calm],
            0.3,
        );
        let score = stress_score(&q, &[]);
        assert_eq!(score, 1.0);
        assert_eq!(stress_label(score), StressLabel::High);
    }

    #[test]
    fn test_stress_empty_quiz_is_baseline() {
        let q = QuizData::default();
        assert_eq!(stress_score(&q, &[]), 0.3);
        assert_eq!(stress_label(0.3), StressLabel::Low);
    }

    #[test]
    fn test_stress_individual_contributions() {
        let slow = quiz(&[600.0], 0, &[], 0.0);
        assert!((stress_score(&slow, &[]) - 0.5).abs() < 1e-9);

        // 1 miss out of 5 trials = 0.2 miss rate
        let missy = quiz(&[300.0, 300.0, 300.0, 300.0], 1, &[], 0.0);
        assert!((stress_score(&missy, &[]) - 0.45).abs() < 1e-9);

        let confused = quiz(&[], 0, &[], 0.25);
        assert!((stress_score(&confused, &[]) - 0.5).abs() < 1e-9);

        let impulsive = quiz(&[], 0, &choices_with_share(3, 4), 0.0);
        assert!((stress_score(&impulsive, &[]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stress_thresholds_are_exclusive() {
        let at_threshold = quiz(&[450.0], 0, &choices_with_share(1, 2), 0.2);
        assert_eq!(stress_score(&at_threshold, &[]), 0.3);
    }

    #[test]
    fn test_stress_ignores_transcript() {
        let q = quiz(&[300.0], 0, &[Choice::Calm], 0.0);
        let transcript = vec![ChatTurn::user("today was rough and bad")];
        assert_eq!(stress_score(&q, &transcript), stress_score(&q, &[]));
    }

    #[test]
    fn test_stress_monotonic_in_each_input() {
        let mut previous = 0.0;
        for rt in (300..=700).step_by(25) {
            let score = stress_score(&quiz(&[rt as f64], 0, &[], 0.0), &[]);
            assert!(score >= previous && (0.0..=1.0).contains(&score));
            previous = score;
        }

        previous = 0.0;
        for misses in 0..10 {
            let score = stress_score(&quiz(&[300.0; 10], misses, &[], 0.0), &[]);
            assert!(score >= previous);
            previous = score;
        }

        previous = 0.0;
        for step in 0..=10 {
            let score = stress_score(&quiz(&[], 0, &[], step as f64 / 10.0), &[]);
            assert!(score >= previous);
            previous = score;
        }

        previous = 0.0;
        for impulsive in 0..=8 {
            let score = stress_score(&quiz(&[], 0, &choices_with_share(impulsive, 8), 0.0), &[]);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_attention_empty_is_zero() {
        assert_eq!(attention_score(&QuizData::default()), 0.0);
        // Misses alone do not produce a score
        assert_eq!(attention_score(&quiz(&[], 3, &[], 0.0)), 0.0);
    }

    #[test]
    fn test_attention_formula() {
        // mean 500 -> -50, stdev 20 -> -10, 2 misses -> -20
        let q = quiz(&[500.0, 520.0, 480.0], 2, &[], 0.0);
        assert!((attention_score(&q) - 20.0).abs() < 1e-9);

        // Single sample has no spread
        let single = quiz(&[300.0], 0, &[], 0.0);
        assert!((attention_score(&single) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_attention_is_clamped() {
        let terrible = quiz(&[2000.0, 100.0], 9, &[], 0.0);
        assert_eq!(attention_score(&terrible), 0.0);

        let instant = quiz(&[0.0, 0.0], 0, &[], 0.0);
        assert_eq!(attention_score(&instant), 100.0);

        for n in 1..20 {
            let rts: Vec<f64> = (0..n).map(|i| (i * 97 % 900) as f64).collect();
            let score = attention_score(&quiz(&rts, (n % 4) as u32, &[], 0.0));
            assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn test_impulsivity_bands() {
        assert_eq!(impulsivity_label(&QuizData::default()), ImpulsivityLabel::Unknown);
        assert_eq!(
            impulsivity_label(&quiz(&[], 0, &choices_with_share(0, 4), 0.0)),
            ImpulsivityLabel::Low
        );
        assert_eq!(
            impulsivity_label(&quiz(&[], 0, &choices_with_share(1, 5), 0.0)),
            ImpulsivityLabel::Low
        );
        // Boundaries: 0.25 and 0.5 are both Moderate
        assert_eq!(
            impulsivity_label(&quiz(&[], 0, &choices_with_share(1, 4), 0.0)),
            ImpulsivityLabel::Moderate
        );
        assert_eq!(
            impulsivity_label(&quiz(&[], 0, &choices_with_share(2, 4), 0.0)),
            ImpulsivityLabel::Moderate
        );
        assert_eq!(
            impulsivity_label(&quiz(&[], 0, &choices_with_share(3, 5), 0.0)),
            ImpulsivityLabel::High
        );
    }

    #[test]
    fn test_unknown_choices_count_towards_total() {
        let q = quiz(&[], 0, &[Choice::Impulsive, Choice::Other, Choice::Other, Choice::Other], 0.0);
        assert_eq!(impulsivity_label(&q), ImpulsivityLabel::Moderate);
    }

    #[test]
    fn test_emotional_bias_from_quiz() {
        assert_eq!(
            emotional_bias(&quiz(&[], 0, &[], 0.21), &[]),
            EmotionalBias::Negative
        );
        assert_eq!(
            emotional_bias(&quiz(&[], 0, &[], 0.2), &[]),
            EmotionalBias::NeutralOrPositive
        );
    }

    #[test]
    fn test_emotional_bias_only_reads_user_turns() {
        let q = QuizData::default();
        let assistant_only = vec![ChatTurn::assistant("How was your day? (great/okay/rough)")];
        assert_eq!(emotional_bias(&q, &assistant_only), EmotionalBias::NeutralOrPositive);

        let user_negative = vec![
            ChatTurn::assistant("How was your day?"),
            ChatTurn::user("Honestly pretty SAD"),
        ];
        assert_eq!(emotional_bias(&q, &user_negative), EmotionalBias::Negative);
    }

    #[test]
    fn test_stress_label_cut_points() {
        assert_eq!(stress_label(0.0), StressLabel::Low);
        assert_eq!(stress_label(0.3299), StressLabel::Low);
        assert_eq!(stress_label(0.33), StressLabel::Moderate);
        assert_eq!(stress_label(0.6599), StressLabel::Moderate);
        assert_eq!(stress_label(0.66), StressLabel::High);
        assert_eq!(stress_label(1.0), StressLabel::High);
    }

    #[test]
    fn test_scorer_bundles_all_indicators() {
        let q = quiz(&[400.0, 420.0], 0, &[Choice::Calm, Choice::Avoidant], 0.05);
        let assessment = QuizScorer::score(&q, &[]);
        assert_eq!(assessment.stress_score, 0.3);
        assert_eq!(assessment.stress_label, StressLabel::Low);
        assert_eq!(assessment.impulsivity, ImpulsivityLabel::Low);
        assert_eq!(assessment.emotional_bias, EmotionalBias::NeutralOrPositive);
        assert!(assessment.attention_score > 0.0);
    }
}
