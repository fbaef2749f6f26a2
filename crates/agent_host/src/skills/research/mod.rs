//! Research skills for finding and reading news.
//!
//! Provides:
//! - Site-restricted news search
//! - Article excerpts for the top results

pub mod news_search;

pub use news_search::{ContentSource, NewsLocator};
