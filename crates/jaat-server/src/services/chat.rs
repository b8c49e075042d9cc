//! Chat execution service - validation, prompt assembly and failure normalization.

use std::sync::Arc;
use std::time::Duration;

use jaat_config::ServerConfig;
use jaat_core::{ChatError, ChatTurn, Message};
use jaat_llm::{CompletionBackend, CompletionRequest, LlmClient};
use tracing::{error, info};

use crate::dto::{ChatRequest, ChatResponse};

pub const DEFAULT_MODE: &str = "assistant";

/// Number of prior turns forwarded to the completion API.
pub const HISTORY_LIMIT: usize = 10;

pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const MAX_MODE_CHARS: usize = 64;
pub const MAX_TURN_CHARS: usize = 4000;

const LOG_PREVIEW_CHARS: usize = 50;

pub const MISSING_CREDENTIAL_RESPONSE: &str =
    "I'm sorry, I can't process your request at the moment. The OpenAI API key is not configured.";

/// A request that passed validation.
#[derive(Debug)]
struct ValidChat {
    message: String,
    mode: String,
    history: Vec<ChatTurn>,
}

fn validate(req: ChatRequest) -> Result<ValidChat, ChatError> {
    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ChatError::validation("Message is required"))?;

    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatError::validation("Message is too long"));
    }

    let mode = req
        .mode
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MODE.to_string());

    if mode.chars().count() > MAX_MODE_CHARS {
        return Err(ChatError::validation("Mode is too long"));
    }

    Ok(ValidChat {
        message,
        mode,
        history: req.history.unwrap_or_default(),
    })
}

/// Builds the system prompt for a mode.
pub fn system_prompt(mode: &str) -> String {
    format!(
        "You are JAAT-AI, an advanced AI assistant operating in {} mode. \
         Provide helpful, accurate, and detailed responses.",
        mode
    )
}

/// Keeps the newest [`HISTORY_LIMIT`] turns, oldest first, with long texts truncated.
pub fn fold_history(history: &[ChatTurn]) -> Vec<Message> {
    let start = history.len().saturating_sub(HISTORY_LIMIT);
    history[start..]
        .iter()
        .map(|turn| {
            let mut msg = Message::from(turn);
            if msg.content.chars().count() > MAX_TURN_CHARS {
                msg.content = msg.content.chars().take(MAX_TURN_CHARS).collect();
            }
            msg
        })
        .collect()
}

/// First [`LOG_PREVIEW_CHARS`] characters of a message, for logging.
fn preview(message: &str) -> String {
    message.chars().take(LOG_PREVIEW_CHARS).collect()
}

fn upstream_apology(err: &ChatError) -> String {
    format!(
        "I'm sorry, but there was an error processing your request. Please try again later. (Error: {})",
        err
    )
}

/// Handles `/api/chat` requests against a completion backend.
pub struct ChatService {
    backend: Arc<dyn CompletionBackend>,
    credential_configured: bool,
    timeout: Duration,
}

impl ChatService {
    pub fn new(backend: Arc<dyn CompletionBackend>, credential_configured: bool, timeout: Duration) -> Self {
        Self { backend, credential_configured, timeout }
    }

    /// Creates a service backed by the OpenAI-compatible client described by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        let client = LlmClient::new(
            &config.model,
            config.api_key.as_deref().unwrap_or_default(),
            config.api_base.as_deref(),
        );
        Self::new(Arc::new(client), config.has_credential(), config.upstream_timeout)
    }

    /// Answers a chat request.
    ///
    /// Only invalid input is returned as an error. A missing credential or a
    /// failed completion call still yields a response that echoes the mode.
    pub async fn handle(&self, req: ChatRequest) -> Result<ChatResponse, ChatError> {
        let chat = validate(req)?;

        if !self.credential_configured {
            return Ok(ChatResponse::new(MISSING_CREDENTIAL_RESPONSE, chat.mode));
        }

        info!(
            "Chat request (mode: {}, model: {}, history: {}): {}...",
            chat.mode,
            self.backend.model_name(),
            chat.history.len(),
            preview(&chat.message)
        );

        let request = CompletionRequest::new(
            system_prompt(&chat.mode),
            fold_history(&chat.history),
            chat.message,
        );

        let outcome = match tokio::time::timeout(self.timeout, self.backend.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ChatError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(completion) => Ok(ChatResponse::new(completion.content, chat.mode)),
            Err(e) => {
                error!("Completion API error: {}", e);
                Ok(ChatResponse::new(upstream_apology(&e), chat.mode))
            }
        }
    }
}
