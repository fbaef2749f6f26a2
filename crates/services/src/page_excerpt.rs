//! Plain-text excerpts of web pages.
//!
//! Fetches a page with a browser identity, drops `script`/`style` content,
//! collapses whitespace and keeps the first few hundred characters.

use anyhow::{anyhow, Result};
use html5ever::driver::{self, ParseOpts};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use reqwest::Client;
use scraper::{Html, HtmlTreeSink, Node};
use std::fmt::Display;
use std::time::Duration;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const TRUNCATION_MARKER: &str = "...";

/// Fetches pages and reduces them to bounded text excerpts.
#[derive(Clone)]
pub struct PageExcerpter {
    client: Client,
}

impl PageExcerpter {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch `url` and return at most `max_chars` characters of visible text
    /// (plus the truncation marker).
    pub async fn try_fetch_excerpt(&self, url: &str, max_chars: usize) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {}", response.status()));
        }

        let html = response.text().await?;
        let text = extract_visible_text(&html);
        Ok(truncate_excerpt(&text, max_chars))
    }

    /// Like [`Self::try_fetch_excerpt`], but failures come back as text.
    pub async fn fetch_excerpt(&self, url: &str, max_chars: usize) -> String {
        match self.try_fetch_excerpt(url, max_chars).await {
            Ok(excerpt) => excerpt,
            Err(e) => {
                tracing::debug!(url, error = %e, "page excerpt failed");
                unavailable_excerpt(&e)
            }
        }
    }
}

/// Stand-in excerpt for a page that could not be fetched or parsed.
pub fn unavailable_excerpt(err: &impl Display) -> String {
    format!("Could not extract content: {}", err)
}

/// Parse with scripting off so `<noscript>` bodies become elements rather
/// than raw markup text.
fn parse_page(html: &str) -> Html {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    driver::parse_document(HtmlTreeSink::new(Html::new_document()), opts).one(html)
}

/// Visible text of an HTML document, whitespace-normalized.
pub fn extract_visible_text(html: &str) -> String {
    let document = parse_page(html);
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "script" | "style"))
        });
        if !hidden {
            raw.push_str(text);
        }
    }

    normalize_text(&raw)
}

/// Trim every line, break lines on double spaces, and join the non-empty
/// pieces with single spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.split(is_line_break)
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Line boundaries as recognised by Unicode-aware line splitting, not just `\n`.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// First `max_chars` characters of `text`, marked when anything was cut.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut excerpt: String = text.chars().take(max_chars).collect();
    excerpt.push_str(TRUNCATION_MARKER);
    excerpt
}
