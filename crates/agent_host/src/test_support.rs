//! In-memory stand-ins for the model, search provider and page fetcher.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use providers::{ChatModel, CompletionRequest};
use services::SearchProvider;
use shared::agent_api::{ChatMessage, ToolCall};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::skills::research::ContentSource;

#[derive(Clone)]
pub struct FakeSearch {
    urls: Option<Vec<String>>,
    pub queries: Arc<Mutex<Vec<(String, usize)>>>,
}

impl FakeSearch {
    pub fn urls(urls: &[&str]) -> Self {
        Self {
            urls: Some(urls.iter().map(|u| u.to_string()).collect()),
            queries: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            urls: None,
            queries: Arc::default(),
        }
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        self.queries.lock().push((query.to_string(), max_results));
        match &self.urls {
            Some(urls) => Ok(urls.iter().take(max_results).cloned().collect()),
            None => Err(anyhow!("search backend unavailable")),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakePages {
    failing: Vec<String>,
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl FakePages {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing_for(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            seen: Arc::default(),
        }
    }
}

#[async_trait]
impl ContentSource for FakePages {
    async fn excerpt(&self, url: &str, _max_chars: usize) -> Result<String> {
        self.seen.lock().push(url.to_string());
        if self.failing.iter().any(|u| u == url) {
            return Err(anyhow!("connection refused"));
        }
        Ok(format!("excerpt of {}", url))
    }
}

/// Replays canned assistant turns in order and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ChatMessage, String>>>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, content: &str) -> Self {
        self.replies
            .lock()
            .push_back(Ok(ChatMessage::assistant(content, Vec::new())));
        self
    }

    pub fn call_tool(self, id: &str, name: &str, arguments: &str) -> Self {
        let call = ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        };
        self.replies
            .lock()
            .push_back(Ok(ChatMessage::assistant("", vec![call])));
        self
    }

    pub fn fail(self, error: &str) -> Self {
        self.replies.lock().push_back(Err(error.to_string()));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage> {
        self.requests.lock().push(request);
        match self.replies.lock().pop_front() {
            Some(Ok(message)) => Ok(message),
            Some(Err(error)) => Err(anyhow!(error)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}
