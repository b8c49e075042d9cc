//! Chat completion client for the JAAT relay.
//!
//! - [`CompletionBackend`] — The seam the chat service calls; swap it for a double in tests
//! - [`CompletionRequest`] — System prompt, folded history, new user input and sampling limits
//! - [`LlmClient`] — OpenAI-compatible implementation backed by `async-openai`
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use jaat_llm::{CompletionBackend, CompletionRequest, LlmClient};
//!
//! let client = LlmClient::new("gpt-4o", "sk-...", None);
//! let request = CompletionRequest::new("You are helpful.", Vec::new(), "Hello!");
//! let response = client.complete(request).await?;
//! println!("{}", response.content);
//! ```

mod client;

pub use client::{
    CompletionBackend, CompletionRequest, LlmClient, LlmMetrics, LlmResponse,
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use jaat_core::{ChatError, Message, MessageRole};
