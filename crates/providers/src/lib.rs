//! Language-model providers for the news pipeline.
//!
//! The pipeline only talks to [`ChatModel`]; [`openai::OpenAIClient`] is the
//! production implementation.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use shared::agent_api::{ChatMessage, ToolDefinition};

pub use openai::OpenAIClient;

/// One chat-completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Functions the model may call; empty disables function calling
    pub tools: Vec<ToolDefinition>,
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the assistant turn, including any requested tool calls.
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage>;
}
