//! Error conditions callers match on.

/// Pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("Please enter a topic!")]
    EmptyTopic,

    #[error("OPENAI_API_KEY not set")]
    MissingApiKey,

    #[error("openai error: {status}\n{detail}")]
    Provider { status: u16, detail: String },

    #[error("{agent} returned an empty response")]
    EmptyResponse { agent: String },

    #[error("{agent} did not finish within {turns} turns")]
    MaxTurns { agent: String, turns: usize },
}
