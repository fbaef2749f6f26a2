//! Web search through DuckDuckGo's HTML interface.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::page_excerpt::BROWSER_USER_AGENT;

const DDG_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Source of candidate URLs for a query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Up to `max_results` result URLs, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>>;
}

/// DuckDuckGo HTML search with a minimum spacing between requests.
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl DuckDuckGoSearch {
    pub fn new(min_interval: Duration) -> Result<Self> {
        Self::with_endpoint(DDG_HTML_ENDPOINT, min_interval)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, min_interval: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            min_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Sleep until `min_interval` has passed since the previous request.
    /// The lock is held through the request so concurrent callers queue up.
    async fn fetch_results_page(&self, query: &str) -> Result<String> {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());

        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("search failed: HTTP {}", response.status()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        let html = self.fetch_results_page(query).await?;
        let mut urls = parse_result_links(&html)?;
        urls.truncate(max_results);
        tracing::debug!(query, results = urls.len(), "web search");
        Ok(urls)
    }
}

/// Pull result URLs out of a DuckDuckGo HTML results page, in order.
///
/// Result anchors carry `class="result__a"`; their hrefs are usually
/// `//duckduckgo.com/l/?uddg=<encoded target>&rut=...` redirects. Sponsored
/// links and duplicates are dropped.
fn parse_result_links(html: &str) -> Result<Vec<String>> {
    let link_re = Regex::new(r#"<a[^>]*class="result__a"[^>]*href="([^"]*)""#)?;
    let link_re_rev = Regex::new(r#"<a[^>]*href="([^"]*)"[^>]*class="result__a""#)?;

    let mut hrefs: Vec<(usize, String)> = link_re
        .captures_iter(html)
        .chain(link_re_rev.captures_iter(html))
        .filter_map(|cap| cap.get(1).map(|m| (m.start(), m.as_str().to_string())))
        .collect();
    hrefs.sort_by_key(|(pos, _)| *pos);

    let mut urls: Vec<String> = Vec::new();
    for (_, href) in hrefs {
        let Some(url) = resolve_result_url(&html_decode(&href)) else {
            continue;
        };
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    Ok(urls)
}

fn resolve_result_url(href: &str) -> Option<String> {
    if href.contains("duckduckgo.com/y.js") {
        return None; // sponsored
    }

    let target = match href.split("uddg=").nth(1) {
        Some(encoded) => {
            let encoded = encoded.split('&').next().unwrap_or(encoded);
            urlencoding::decode(encoded).ok()?.into_owned()
        }
        None => href.to_string(),
    };

    let parsed = url::Url::parse(&target).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}

/// Basic HTML entity decoding
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .trim()
        .to_string()
}
