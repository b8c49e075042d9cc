//! OpenAI-compatible chat completion client.
//!
//! Works with the OpenAI API and any compatible endpoint (including Ollama's /v1 endpoint).

use std::time::{Duration, Instant};

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use jaat_core::{ChatError, Message, MessageRole};
use tracing::{info, warn};

pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Token usage and timing metrics from an LLM call.
#[derive(Debug, Clone, Default)]
pub struct LlmMetrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub elapsed_ms: u64,
}

/// Complete response from an LLM call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub metrics: LlmMetrics,
}

/// Everything needed for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    /// Prior turns, oldest first.
    pub history: Vec<Message>,
    /// The new user message, always sent last.
    pub user_input: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Creates a request with the default output limit and temperature.
    pub fn new(
        system_prompt: impl Into<String>,
        history: Vec<Message>,
        user_input: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history,
            user_input: user_input.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// A chat completion provider.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends the conversation and returns the first completion.
    async fn complete(&self, request: CompletionRequest) -> Result<LlmResponse, ChatError>;

    /// The model identifier requests are sent to.
    fn model_name(&self) -> &str;
}

/// Converts any error into a `ChatError::Upstream`.
fn llm_err(e: impl ToString) -> ChatError {
    ChatError::Upstream(e.to_string())
}

/// Builds the role-tagged message list: system, history, then the user input.
fn build_messages(request: &CompletionRequest) -> Result<Vec<ChatCompletionRequestMessage>, ChatError> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);

    messages.push(ChatCompletionRequestMessage::System(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.as_str())
            .build()
            .map_err(llm_err)?,
    ));

    for msg in &request.history {
        let role_msg = match msg.role {
            MessageRole::User => user_message(&msg.content)?,
            MessageRole::Assistant => ChatCompletionRequestMessage::Assistant(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(msg.content.as_str())
                    .build()
                    .map_err(llm_err)?,
            ),
        };
        messages.push(role_msg);
    }

    messages.push(user_message(&request.user_input)?);
    Ok(messages)
}

fn user_message(content: &str) -> Result<ChatCompletionRequestMessage, ChatError> {
    Ok(ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(llm_err)?,
    ))
}

#[allow(deprecated)]
fn build_request(model: &str, request: &CompletionRequest) -> Result<CreateChatCompletionRequest, ChatError> {
    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(build_messages(request)?)
        .max_tokens(request.max_tokens)
        .temperature(request.temperature)
        .build()
        .map_err(llm_err)
}

/// Extracts content and metrics from a completion response.
fn extract_response(response: CreateChatCompletionResponse, elapsed_ms: u64) -> Result<LlmResponse, ChatError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ChatError::Upstream("No response content".into()))?;

    let (input_tokens, output_tokens) = response
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    info!(
        "LLM: {}ms, tokens: {}/{} (in/out)",
        elapsed_ms, input_tokens, output_tokens
    );

    Ok(LlmResponse {
        content,
        metrics: LlmMetrics { input_tokens, output_tokens, elapsed_ms },
    })
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl LlmClient {
    /// Creates a new client for the given model, credential and optional API base URL.
    pub fn new(model: &str, api_key: &str, api_base: Option<&str>) -> Self {
        let config = match api_base {
            Some(base) => OpenAIConfig::new().with_api_base(base).with_api_key(api_key),
            None => OpenAIConfig::new().with_api_key(api_key),
        };

        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            client: Client::with_config(config)
                .with_http_client(http_client)
                .with_backoff(no_retry()),
            model: model.to_string(),
        }
    }
}

/// A backoff policy that gives up on the first rate-limit response.
fn no_retry() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<LlmResponse, ChatError> {
        let start = Instant::now();
        let request = build_request(&self.model, &request)?;

        let response = self.client.chat().create(request).await.map_err(llm_err)?;
        extract_response(response, start.elapsed().as_millis() as u64)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
