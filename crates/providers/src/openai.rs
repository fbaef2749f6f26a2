use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::{ChatMessage, ToolCall, ToolDefinition};
use shared::settings::ModelProvider;
use shared::NewsError;
use std::env;
use std::time::Duration;

use crate::{ChatModel, CompletionRequest};

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

/// OpenAI function-calling tool definition.
#[derive(Debug, Clone, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIToolCallFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCallFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

// ── Conversion ───────────────────────────────────────────────────────

fn to_openai_tool(tool: &ToolDefinition) -> OpenAITool {
    OpenAITool {
        tool_type: "function".to_string(),
        function: OpenAIFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

/// Convert ChatMessages to OpenAI message format.
///
/// Handles:
/// - system / user / assistant messages as simple {role, content}
/// - assistant messages carrying tool calls → `tool_calls` array, content may be null
/// - tool results → `{role: "tool", tool_call_id, content}`
fn to_openai_messages(messages: &[ChatMessage]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            if m.role == "tool" {
                return serde_json::json!({
                    "role": "tool",
                    "tool_call_id": m.tool_call_id.as_deref().unwrap_or(""),
                    "content": m.content
                });
            }

            if m.has_tool_calls() {
                let tool_calls: Vec<serde_json::Value> = m
                    .tool_calls
                    .iter()
                    .map(|call| {
                        serde_json::json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments
                            }
                        })
                    })
                    .collect();

                let content = if m.content.is_empty() {
                    serde_json::Value::Null
                } else {
                    serde_json::Value::String(m.content.clone())
                };
                return serde_json::json!({
                    "role": "assistant",
                    "content": content,
                    "tool_calls": tool_calls
                });
            }

            serde_json::json!({
                "role": m.role,
                "content": m.content
            })
        })
        .collect()
}

fn into_chat_message(body: OpenAIResponse) -> Result<ChatMessage> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("openai response contained no choices"))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: tc.function.arguments,
        })
        .collect();

    Ok(ChatMessage::assistant(
        choice.message.content.unwrap_or_default(),
        tool_calls,
    ))
}

// ── Client ───────────────────────────────────────────────────────────

pub struct OpenAIClient {
    http: Client,
    auth_token: String,
    base_url: String,
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .pool_max_idle_per_host(2)
            .build()?;

        Ok(Self {
            http,
            auth_token: api_key.into(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Build from settings, falling back to `OPENAI_API_KEY` in the environment.
    pub fn from_settings(config: &ModelProvider) -> Result<Self> {
        let key = match &config.api_key {
            Some(key) => key.clone(),
            None => env::var("OPENAI_API_KEY").map_err(|_| NewsError::MissingApiKey)?,
        };
        Self::new(key, config.openai_base_url.as_deref())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatModel for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(request.tools.iter().map(to_openai_tool).collect())
        };
        let req = OpenAIRequest {
            model: request.model,
            messages: to_openai_messages(&request.messages),
            tools,
        };

        tracing::debug!(
            model = %req.model,
            messages = req.messages.len(),
            tools = req.tools.as_ref().map_or(0, |t| t.len()),
            "openai chat completion"
        );

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.auth_token))
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let detail: String = body.chars().take(800).collect();
            return Err(NewsError::Provider {
                status: status.as_u16(),
                detail,
            }
            .into());
        }
        let body: OpenAIResponse = resp.json().await?;
        into_chat_message(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::thread;

    /// Serve exactly one request, returning the captured body and auth header.
    fn one_shot_server(
        status: u16,
        response: &'static str,
    ) -> (String, thread::JoinHandle<(String, String)>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let handle = thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            let auth = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string())
                .unwrap_or_default();
            request
                .respond(tiny_http::Response::from_string(response).with_status_code(status))
                .unwrap();
            (body, auth)
        });
        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_message_conversion() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "search_news".into(),
            arguments: r#"{"topic":"ai"}"#.into(),
        };
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("Find recent news about ai"),
            ChatMessage::assistant("", vec![call.clone()]),
            ChatMessage::tool(&call, "URL: https://bbc.com/x\nContent: ..."),
        ];

        let out = to_openai_messages(&messages);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0]["role"], "system");
        assert_eq!(out[2]["content"], serde_json::Value::Null);
        assert_eq!(out[2]["tool_calls"][0]["function"]["name"], "search_news");
        assert_eq!(out[3]["role"], "tool");
        assert_eq!(out[3]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_response_with_tool_calls() {
        let body: OpenAIResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":null,
                "tool_calls":[{"id":"call_9","type":"function",
                "function":{"name":"search_news","arguments":"{\"topic\":\"x\"}"}}]}}]}"#,
        )
        .unwrap();
        let msg = into_chat_message(body).unwrap();
        assert_eq!(msg.role, "assistant");
        assert!(msg.content.is_empty());
        assert_eq!(msg.tool_calls[0].id, "call_9");
        assert_eq!(msg.tool_calls[0].arguments, r#"{"topic":"x"}"#);
    }

    #[test]
    fn test_empty_choices_is_error() {
        let body: OpenAIResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(into_chat_message(body).is_err());
    }

    #[tokio::test]
    async fn test_complete_round_trip() {
        let (base, handle) = one_shot_server(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"Summary text"}}]}"#,
        );
        let client = OpenAIClient::new("sk-test", Some(&format!("{}/", base))).unwrap();
        assert_eq!(client.base_url(), base);

        let reply = client
            .complete(CompletionRequest {
                model: "gpt-4o-mini".into(),
                messages: vec![ChatMessage::user("hello")],
                tools: vec![ToolDefinition {
                    name: "search_news".into(),
                    description: "Search".into(),
                    parameters: serde_json::json!({"type": "object"}),
                }],
            })
            .await
            .unwrap();
        assert_eq!(reply.content, "Summary text");

        let (body, auth) = handle.join().unwrap();
        assert_eq!(auth, "Bearer sk-test");
        let sent: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sent["model"], "gpt-4o-mini");
        assert_eq!(sent["tools"][0]["type"], "function");
    }

    #[tokio::test]
    async fn test_complete_http_error() {
        let (base, handle) = one_shot_server(401, r#"{"error":"bad key"}"#);
        let client = OpenAIClient::new("sk-wrong", Some(&base)).unwrap();
        let err = client
            .complete(CompletionRequest {
                model: "gpt-4o-mini".into(),
                messages: vec![ChatMessage::user("hello")],
                tools: Vec::new(),
            })
            .await
            .unwrap_err();
        handle.join().unwrap();

        match err.downcast_ref::<NewsError>() {
            Some(NewsError::Provider { status, detail }) => {
                assert_eq!(*status, 401);
                assert!(detail.contains("bad key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
