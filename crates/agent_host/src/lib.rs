//! Agent Host - the news agents and the pipeline that chains them
//!
//! This crate provides:
//! - The `search_news` capability (web search + page excerpts)
//! - Static agent definitions for the search, synthesis and summary stages
//! - A function-calling runner that executes one agent to completion
//! - The three-stage pipeline with progress events

pub mod pipeline;
pub mod prompts;
pub mod skills;
pub mod swarm;

#[cfg(test)]
pub(crate) mod test_support;

pub use pipeline::{format_summary, NewsPipeline, EMPTY_TOPIC_MESSAGE, ERROR_PREFIX};
pub use prompts::NewsAgents;
pub use skills::research::{ContentSource, NewsLocator};
pub use swarm::{Swarm, SwarmResponse};
