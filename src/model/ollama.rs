//! Ollama HTTP client
//!
//! Talks to a local (or LAN) Ollama-compatible server: `/api/chat` for
//! conversation turns, `/api/generate` for quiz scenarios, `/api/tags` for
//! health checks. Requests are blocking and bounded by the configured timeout.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::ModelError;
use crate::model::{ConversationalModel, QuizGenerator};
use crate::quiz::generator::{question_prompt, questions_from_text};
use crate::quiz::QuizQuestion;
use crate::triage::prompt::system_prompt;
use crate::types::{ChatRole, ChatTurn};

/// Blocking client for an Ollama-compatible endpoint
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, ModelError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ModelError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ModelError> {
        Self::new(&config.model_url, &config.model_name, config.request_timeout_secs)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the configured model is installed on the server
    pub fn is_model_available(&self) -> Result<bool, ModelError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().map_err(|e| self.map_send_error(e))?;
        let tags: TagsResponse = self.read_json(response)?;
        Ok(tags.models.iter().any(|m| m.name.starts_with(&self.model)))
    }

    fn map_send_error(&self, e: reqwest::Error) -> ModelError {
        if e.is_connect() {
            ModelError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ModelError::Timeout(self.timeout_secs)
        } else {
            ModelError::HttpClient(e.to_string())
        }
    }

    fn read_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<T, ModelError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagsModel>,
}

#[derive(Deserialize)]
struct TagsModel {
    name: String,
}

/// Build the chat message list: system prompt, prior turns, new user input
fn chat_messages<'a>(system: &'a str, history: &'a [ChatTurn], new_input: &'a str) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage {
        role: "system",
        content: system,
    });
    messages.extend(history.iter().map(|turn| ChatMessage {
        role: match turn.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        },
        content: turn.text.as_str(),
    }));
    messages.push(ChatMessage {
        role: "user",
        content: new_input,
    });
    messages
}

impl ConversationalModel for OllamaClient {
    fn generate(&self, history: &[ChatTurn], new_input: &str) -> Result<String, ModelError> {
        let url = format!("{}/api/chat", self.base_url);
        let system = system_prompt();
        let body = ChatRequest {
            model: &self.model,
            messages: chat_messages(&system, history, new_input),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;
        let parsed: ChatResponse = self.read_json(response)?;

        if parsed.message.content.trim().is_empty() {
            return Err(ModelError::EmptyReply);
        }
        Ok(parsed.message.content)
    }
}

impl QuizGenerator for OllamaClient {
    fn generate_questions(&self, context: &str) -> Result<Vec<QuizQuestion>, ModelError> {
        let url = format!("{}/api/generate", self.base_url);
        let prompt = question_prompt(context);
        let body = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;
        let parsed: GenerateResponse = self.read_json(response)?;

        questions_from_text(&parsed.response)
    }
}
