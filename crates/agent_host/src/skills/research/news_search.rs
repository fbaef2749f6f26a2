//! News search skill for the search agent.
//!
//! Builds a site-restricted query for the topic, asks the search provider for
//! candidate URLs and pulls a short excerpt from each of the top results.
//! Every outcome, including failure, is returned as text for the model.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Datelike, Local};
use services::{unavailable_excerpt, PageExcerpter, SearchProvider};
use shared::agent_api::AgentFunction;
use shared::news::SearchResult;
use shared::settings::NewsSettings;
use std::sync::Arc;
use std::time::Duration;

/// Where article excerpts come from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn excerpt(&self, url: &str, max_chars: usize) -> Result<String>;
}

#[async_trait]
impl ContentSource for PageExcerpter {
    async fn excerpt(&self, url: &str, max_chars: usize) -> Result<String> {
        self.try_fetch_excerpt(url, max_chars).await
    }
}

/// Finds recent coverage of a topic on reputable news sites.
pub struct NewsLocator {
    search: Arc<dyn SearchProvider>,
    pages: Arc<dyn ContentSource>,
    config: NewsSettings,
}

impl NewsLocator {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        pages: Arc<dyn ContentSource>,
        config: NewsSettings,
    ) -> Self {
        Self {
            search,
            pages,
            config,
        }
    }

    /// `"<topic> news <year> site:a OR site:b ..."`
    pub fn build_query(&self, topic: &str, year: i32) -> String {
        let sites = self
            .config
            .domains
            .iter()
            .map(|d| format!("site:{}", d))
            .collect::<Vec<_>>()
            .join(" OR ");
        if sites.is_empty() {
            format!("{} news {}", topic, year)
        } else {
            format!("{} news {} {}", topic, year, sites)
        }
    }

    /// Search and excerpt; never fails, errors come back as text.
    pub async fn locate_news(&self, topic: &str) -> String {
        match self.try_locate(topic).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(topic, error = %e, "news search failed");
                format!("Error searching for news: {}", e)
            }
        }
    }

    async fn try_locate(&self, topic: &str) -> Result<String> {
        let query = self.build_query(topic, Local::now().year());
        let urls = self.search.search(&query, self.config.max_results).await?;
        tracing::info!(
            topic,
            provider = self.search.name(),
            urls = urls.len(),
            "news search"
        );

        if urls.is_empty() {
            return Ok(format!("No news found for {}.", topic));
        }

        let delay = Duration::from_millis(self.config.fetch_delay_ms);
        let mut blocks = Vec::new();
        let mut fetched = 0usize;

        for url in urls.iter().take(self.config.fetch_limit) {
            match self.pages.excerpt(url, self.config.excerpt_chars).await {
                Ok(excerpt) => {
                    fetched += 1;
                    blocks.push(SearchResult::new(url.as_str(), excerpt).to_block());
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "excerpt failed");
                    let note = unavailable_excerpt(&e);
                    blocks.push(SearchResult::new(url.as_str(), note).to_block());
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        if fetched == 0 {
            return Ok(format!("No accessible news found for {}.", topic));
        }
        Ok(blocks.join("\n\n"))
    }
}

#[async_trait]
impl AgentFunction for NewsLocator {
    fn name(&self) -> &'static str {
        "search_news"
    }

    fn description(&self) -> &'static str {
        "Search for recent news articles on a topic from reputable sources"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "description": "The news topic to search for"
                }
            },
            "required": ["topic"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<String> {
        let topic = args
            .get("topic")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("missing required argument: topic"))?;
        Ok(self.locate_news(topic).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePages, FakeSearch};

    fn quiet_settings() -> NewsSettings {
        NewsSettings {
            fetch_delay_ms: 0,
            search_interval_ms: 0,
            ..NewsSettings::default()
        }
    }

    fn locator(search: FakeSearch, pages: FakePages) -> NewsLocator {
        NewsLocator::new(Arc::new(search), Arc::new(pages), quiet_settings())
    }

    #[test]
    fn test_build_query() {
        let loc = locator(FakeSearch::urls(&[]), FakePages::ok());
        assert_eq!(
            loc.build_query("climate change", 2025),
            "climate change news 2025 site:reuters.com OR site:bbc.com OR site:cnn.com OR site:apnews.com OR site:theguardian.com"
        );
    }

    #[tokio::test]
    async fn test_no_urls() {
        let loc = locator(FakeSearch::urls(&[]), FakePages::ok());
        assert_eq!(
            loc.locate_news("quantum widgets").await,
            "No news found for quantum widgets."
        );
    }

    #[tokio::test]
    async fn test_only_top_three_fetched() {
        let search = FakeSearch::urls(&[
            "https://a.example/1",
            "https://a.example/2",
            "https://a.example/3",
            "https://a.example/4",
            "https://a.example/5",
        ]);
        let pages = FakePages::ok();
        let seen = pages.seen.clone();
        let loc = locator(search.clone(), pages);

        let text = loc.locate_news("space exploration").await;
        assert_eq!(
            text,
            "URL: https://a.example/1\nContent: excerpt of https://a.example/1\n\n\
             URL: https://a.example/2\nContent: excerpt of https://a.example/2\n\n\
             URL: https://a.example/3\nContent: excerpt of https://a.example/3"
        );
        assert_eq!(seen.lock().len(), 3);

        let queries = search.queries.lock();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].1, 5);
        let year = Local::now().year();
        assert!(queries[0]
            .0
            .starts_with(&format!("space exploration news {} site:", year)));
    }

    #[tokio::test]
    async fn test_partial_failure_is_inline() {
        let search = FakeSearch::urls(&["https://ok.example", "https://down.example"]);
        let loc = locator(search, FakePages::failing_for(&["https://down.example"]));

        let text = loc.locate_news("cryptocurrency").await;
        assert!(text.contains("URL: https://ok.example\nContent: excerpt of https://ok.example"));
        assert!(text.contains(
            "URL: https://down.example\nContent: Could not extract content: connection refused"
        ));
    }

    #[tokio::test]
    async fn test_all_fetches_fail() {
        let search = FakeSearch::urls(&["https://x.example", "https://y.example"]);
        let loc = locator(
            search,
            FakePages::failing_for(&["https://x.example", "https://y.example"]),
        );
        assert_eq!(
            loc.locate_news("renewable energy").await,
            "No accessible news found for renewable energy."
        );
    }

    #[tokio::test]
    async fn test_search_error_becomes_text() {
        let loc = locator(FakeSearch::failing(), FakePages::ok());
        let text = loc.locate_news("healthcare technology").await;
        assert_eq!(text, "Error searching for news: search backend unavailable");
    }

    #[tokio::test]
    async fn test_agent_function_call() {
        let loc = locator(FakeSearch::urls(&[]), FakePages::ok());
        let out = loc
            .call(serde_json::json!({"topic": "artificial intelligence"}))
            .await
            .unwrap();
        assert_eq!(out, "No news found for artificial intelligence.");

        assert!(loc.call(serde_json::json!({})).await.is_err());
        assert_eq!(loc.definition().name, "search_news");
    }
}
