pub mod agent_api;
pub mod error;
pub mod events;

pub use error::NewsError;

pub mod settings {
    use serde::{Deserialize, Serialize};

    /// Characters of page text handed to the search agent per article
    pub const DEFAULT_EXCERPT_CHARS: usize = 500;

    fn default_true() -> bool {
        true
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelProvider {
        pub openai_model: String, // e.g., "gpt-4o-mini"
        #[serde(default)]
        pub openai_base_url: Option<String>,
        /// Never serialized; comes from `OPENAI_API_KEY`.
        #[serde(skip)]
        pub api_key: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ServerSettings {
        pub host: String,
        pub port: u16,
        /// Verbose logging and error detail in responses
        #[serde(default = "default_true")]
        pub debug: bool,
    }

    /// Knobs for the news locator and content fetcher
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct NewsSettings {
        /// Reputable domains the search query is restricted to
        pub domains: Vec<String>,
        /// URLs requested from the search provider
        pub max_results: usize,
        /// URLs actually fetched for excerpts
        pub fetch_limit: usize,
        pub excerpt_chars: usize,
        /// Minimum spacing between search provider requests
        pub search_interval_ms: u64,
        /// Pause after each page fetch
        pub fetch_delay_ms: u64,
        pub fetch_timeout_secs: u64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        pub model: ModelProvider,
        pub server: ServerSettings,
        pub news: NewsSettings,
    }

    impl Default for ModelProvider {
        fn default() -> Self {
            Self {
                openai_model: "gpt-4o-mini".into(),
                openai_base_url: None,
                api_key: None,
            }
        }
    }

    impl Default for ServerSettings {
        fn default() -> Self {
            Self {
                host: "0.0.0.0".into(),
                port: 7860,
                debug: true,
            }
        }
    }

    impl Default for NewsSettings {
        fn default() -> Self {
            Self {
                domains: vec![
                    "reuters.com".into(),
                    "bbc.com".into(),
                    "cnn.com".into(),
                    "apnews.com".into(),
                    "theguardian.com".into(),
                ],
                max_results: 5,
                fetch_limit: 3,
                excerpt_chars: DEFAULT_EXCERPT_CHARS,
                search_interval_ms: 1000,
                fetch_delay_ms: 1000,
                fetch_timeout_secs: 10,
            }
        }
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                model: ModelProvider::default(),
                server: ServerSettings::default(),
                news: NewsSettings::default(),
            }
        }
    }

    impl AppSettings {
        /// Defaults overlaid with values from the process environment.
        pub fn from_env() -> Self {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Defaults overlaid with values from `lookup`. Unparseable values are ignored.
        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
            let mut settings = Self::default();
            let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            settings.model.api_key = non_empty("OPENAI_API_KEY");
            settings.model.openai_base_url = non_empty("OPENAI_BASE_URL");
            if let Some(model) = non_empty("NEWS_MODEL") {
                settings.model.openai_model = model;
            }
            if let Some(host) = non_empty("NEWS_HOST") {
                settings.server.host = host;
            }
            if let Some(port) = non_empty("NEWS_PORT").and_then(|p| p.trim().parse().ok()) {
                settings.server.port = port;
            }
            if let Some(debug) = non_empty("NEWS_DEBUG") {
                settings.server.debug = !matches!(
                    debug.trim().to_lowercase().as_str(),
                    "0" | "false" | "no" | "off"
                );
            }
            settings
        }

        pub fn bind_addr(&self) -> String {
            format!("{}:{}", self.server.host, self.server.port)
        }
    }
}

pub mod news {
    use serde::{Deserialize, Serialize};

    /// One fetched article: where it came from and what it says
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
    pub struct SearchResult {
        pub url: String,
        pub excerpt: String,
    }

    impl SearchResult {
        pub fn new(url: impl Into<String>, excerpt: impl Into<String>) -> Self {
            Self {
                url: url.into(),
                excerpt: excerpt.into(),
            }
        }

        /// Block layout handed to the search agent
        pub fn to_block(&self) -> String {
            format!("URL: {}\nContent: {}", self.url, self.excerpt)
        }
    }
}
