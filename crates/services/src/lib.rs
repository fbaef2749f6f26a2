//! Network-facing services: page excerpts and web search.

pub mod page_excerpt;
pub mod web_search;

pub use page_excerpt::{unavailable_excerpt, PageExcerpter};
pub use web_search::{DuckDuckGoSearch, SearchProvider};
