//! External text-generation capabilities
//!
//! The engine consumes two capabilities: a conversational model that writes
//! the assistant's next turn, and a quiz generator that writes decision
//! scenarios. Both are fail-soft: callers treat any error as "unavailable for
//! this call" and fall back to deterministic behavior without retrying.

mod handle;
mod ollama;

pub use handle::ModelHandle;
pub use ollama::OllamaClient;

use crate::error::ModelError;
use crate::quiz::QuizQuestion;
use crate::types::ChatTurn;

/// Writes the assistant's next utterance
pub trait ConversationalModel: Send + Sync {
    /// Generate a reply to `new_input` given the turns that preceded it
    fn generate(&self, history: &[ChatTurn], new_input: &str) -> Result<String, ModelError>;
}

/// Writes decision-task scenarios for onboarding
pub trait QuizGenerator: Send + Sync {
    fn generate_questions(&self, context: &str) -> Result<Vec<QuizQuestion>, ModelError>;
}

/// A backend that provides both capabilities
pub trait ModelBackend: Send + Sync {
    fn conversational(&self) -> &dyn ConversationalModel;
    fn quiz_generator(&self) -> &dyn QuizGenerator;
}

impl<T: ConversationalModel + QuizGenerator> ModelBackend for T {
    fn conversational(&self) -> &dyn ConversationalModel {
        self
    }

    fn quiz_generator(&self) -> &dyn QuizGenerator {
        self
    }
}
