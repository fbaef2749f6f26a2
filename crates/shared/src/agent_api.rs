//! Message and agent types passed between the pipeline and model providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system" | "user" | "assistant" | "tool"
    pub content: String,
    /// Function calls requested by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on "tool" messages: the call this result answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Set on "tool" messages: the function that produced the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain("assistant", content)
        }
    }

    pub fn tool(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            name: Some(call.name.clone()),
            ..Self::plain("tool", content)
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A model's request to run one agent function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON text exactly as the model produced it
    pub arguments: String,
}

/// Function schema advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Capability an agent may invoke by name during a run.
#[async_trait]
pub trait AgentFunction: Send + Sync {
    /// Name the model calls (snake_case)
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> serde_json::Value;

    async fn call(&self, args: serde_json::Value) -> anyhow::Result<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Static configuration for one stage of the prompt chain.
#[derive(Clone)]
pub struct AgentSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub functions: Vec<Arc<dyn AgentFunction>>,
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            functions: Vec::new(),
        }
    }

    pub fn with_function(mut self, function: Arc<dyn AgentFunction>) -> Self {
        self.functions.push(function);
        self
    }

    pub fn function(&self, name: &str) -> Option<&Arc<dyn AgentFunction>> {
        self.functions.iter().find(|f| f.name() == name)
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.functions.iter().map(|f| f.definition()).collect()
    }
}

impl fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("name", &self.name)
            .field("model", &self.model)
            .field(
                "functions",
                &self.functions.iter().map(|func| func.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
