//! Runs a single agent to completion, executing any functions it calls.
//!
//! The model sees the agent's instructions as a system message followed by
//! the conversation so far. Whenever it answers with tool calls, each call is
//! dispatched to the matching [`AgentFunction`] and the results are fed back
//! until the model produces a plain reply.

use anyhow::Result;
use providers::{ChatModel, CompletionRequest};
use shared::agent_api::{AgentSpec, ChatMessage, ToolCall};
use shared::NewsError;
use std::sync::Arc;

pub const DEFAULT_MAX_TURNS: usize = 10;

/// Messages produced by one run (the input messages are not included).
#[derive(Debug, Clone)]
pub struct SwarmResponse {
    pub agent: String,
    pub messages: Vec<ChatMessage>,
}

impl SwarmResponse {
    pub fn last_content(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

pub struct Swarm {
    model: Arc<dyn ChatModel>,
    max_turns: usize,
}

impl Swarm {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub async fn run(
        &self,
        agent: &AgentSpec,
        messages: Vec<ChatMessage>,
    ) -> Result<SwarmResponse> {
        let start = messages.len();
        let mut history = messages;
        let tools = agent.tool_definitions();

        for turn in 0..self.max_turns {
            let mut request_messages = Vec::with_capacity(history.len() + 1);
            request_messages.push(ChatMessage::system(agent.instructions.as_str()));
            request_messages.extend(history.iter().cloned());

            let reply = self
                .model
                .complete(CompletionRequest {
                    model: agent.model.clone(),
                    messages: request_messages,
                    tools: tools.clone(),
                })
                .await?;

            let calls = reply.tool_calls.clone();
            history.push(reply);

            if calls.is_empty() {
                tracing::debug!(agent = %agent.name, turns = turn + 1, "agent finished");
                return Ok(SwarmResponse {
                    agent: agent.name.clone(),
                    messages: history.split_off(start),
                });
            }

            for call in &calls {
                let result = self.handle_tool_call(agent, call).await;
                history.push(ChatMessage::tool(call, result));
            }
        }

        Err(NewsError::MaxTurns {
            agent: agent.name.clone(),
            turns: self.max_turns,
        }
        .into())
    }

    /// Run `agent` on a single user message and return its final reply.
    pub async fn run_stage(&self, agent: &AgentSpec, input: &str) -> Result<String> {
        let response = self.run(agent, vec![ChatMessage::user(input)]).await?;
        match response.last_content() {
            Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
            _ => Err(NewsError::EmptyResponse {
                agent: agent.name.clone(),
            }
            .into()),
        }
    }

    /// Failures are reported back to the model as the tool result.
    async fn handle_tool_call(&self, agent: &AgentSpec, call: &ToolCall) -> String {
        let Some(function) = agent.function(&call.name) else {
            tracing::warn!(agent = %agent.name, tool = %call.name, "unknown tool requested");
            return format!("Error: Tool {} not found.", call.name);
        };

        let args: serde_json::Value = if call.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(&call.arguments) {
                Ok(args) => args,
                Err(e) => return format!("Error: invalid arguments for {}: {}", call.name, e),
            }
        };

        tracing::info!(agent = %agent.name, tool = %call.name, "calling agent function");
        match function.call(args).await {
            Ok(output) => output,
            Err(e) => format!("Error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::research::NewsLocator;
    use crate::test_support::{FakePages, FakeSearch, ScriptedModel};
    use shared::settings::NewsSettings;

    fn searcher() -> AgentSpec {
        let locator = NewsLocator::new(
            Arc::new(FakeSearch::urls(&["https://www.bbc.com/news/1"])),
            Arc::new(FakePages::ok()),
            NewsSettings {
                fetch_delay_ms: 0,
                ..NewsSettings::default()
            },
        );
        AgentSpec::new("News Searcher", "Find news.", "gpt-4o-mini")
            .with_function(Arc::new(locator))
    }

    #[tokio::test]
    async fn test_plain_reply() {
        let model = Arc::new(ScriptedModel::new().reply("just text"));
        let swarm = Swarm::new(model.clone());
        let agent = AgentSpec::new("Writer", "Write.", "gpt-4o-mini");

        let out = swarm.run_stage(&agent, "hello").await.unwrap();
        assert_eq!(out, "just text");

        let requests = model.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].messages[0], ChatMessage::system("Write."));
        assert_eq!(requests[0].messages[1], ChatMessage::user("hello"));
        assert!(requests[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_tool_call_round_trip() {
        let model = Arc::new(
            ScriptedModel::new()
                .call_tool("call_1", "search_news", r#"{"topic":"ai"}"#)
                .reply("structured results"),
        );
        let swarm = Swarm::new(model.clone());

        let response = swarm
            .run(&searcher(), vec![ChatMessage::user("Find recent news about ai")])
            .await
            .unwrap();

        // assistant(tool call), tool result, assistant(final)
        assert_eq!(response.messages.len(), 3);
        assert_eq!(response.messages[1].role, "tool");
        assert_eq!(
            response.messages[1].content,
            "URL: https://www.bbc.com/news/1\nContent: excerpt of https://www.bbc.com/news/1"
        );
        assert_eq!(response.last_content(), Some("structured results"));

        let requests = model.requests.lock();
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].messages[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments() {
        let model = Arc::new(
            ScriptedModel::new()
                .call_tool("c1", "launch_rockets", "{}")
                .call_tool("c2", "search_news", "{not json")
                .reply("gave up"),
        );
        let swarm = Swarm::new(model);

        let response = swarm
            .run(&searcher(), vec![ChatMessage::user("go")])
            .await
            .unwrap();
        assert_eq!(response.messages[1].content, "Error: Tool launch_rockets not found.");
        assert!(response.messages[3]
            .content
            .starts_with("Error: invalid arguments for search_news:"));
        assert_eq!(response.last_content(), Some("gave up"));
    }

    #[tokio::test]
    async fn test_max_turns() {
        let model = Arc::new(
            ScriptedModel::new()
                .call_tool("c1", "search_news", r#"{"topic":"a"}"#)
                .call_tool("c2", "search_news", r#"{"topic":"b"}"#),
        );
        let swarm = Swarm::new(model.clone()).with_max_turns(2);

        let err = swarm.run_stage(&searcher(), "loop").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NewsError>(),
            Some(NewsError::MaxTurns { turns: 2, .. })
        ));
        assert_eq!(model.request_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_reply_is_error() {
        let model = Arc::new(ScriptedModel::new().reply("   "));
        let swarm = Swarm::new(model);
        let agent = AgentSpec::new("News Summarizer", "Summarize.", "gpt-4o-mini");

        let err = swarm.run_stage(&agent, "x").await.unwrap_err();
        assert_eq!(err.to_string(), "News Summarizer returned an empty response");
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = Arc::new(ScriptedModel::new().fail("rate limited"));
        let swarm = Swarm::new(model);
        let agent = AgentSpec::new("Writer", "Write.", "gpt-4o-mini");

        let err = swarm.run_stage(&agent, "x").await.unwrap_err();
        assert_eq!(err.to_string(), "rate limited");
    }
}
