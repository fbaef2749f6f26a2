//! Agent definitions for the three pipeline stages.
//!
//! Each stage is a static prompt plus, for the searcher, the `search_news`
//! capability. All three share one model identifier.

use shared::agent_api::{AgentFunction, AgentSpec};
use std::sync::Arc;

/// Name and instructions for one stage
#[derive(Clone, Debug)]
pub struct StagePrompt {
    pub name: &'static str,
    pub instructions: &'static str,
}

pub static SEARCH_PROMPT: StagePrompt = StagePrompt {
    name: "News Searcher",
    instructions: r#"You are a news search specialist. Your task is to:
1. Search for the most relevant and recent news on the given topic
2. Ensure the results are from reputable sources
3. Return the raw search results in a structured format
4. Return URLs of a list of using sources"#,
};

pub static SYNTHESIS_PROMPT: StagePrompt = StagePrompt {
    name: "News Synthesizer",
    instructions: r#"You are a news synthesis expert. Your task is to:
1. Analyze the raw news articles provided
2. Identify the key themes and important information
3. Combine information from multiple sources
4. Create a comprehensive but concise synthesis
5. Focus on facts and maintain journalistic objectivity
6. Write in a clear, professional style
7. Listing of using sources
Provide a 2-3 paragraph synthesis of the main points."#,
};

pub static SUMMARY_PROMPT: StagePrompt = StagePrompt {
    name: "News Summarizer",
    instructions: r#"You are an expert news summarizer combining AP and Reuters style clarity with digital-age brevity.

Your task:
1. Core Information:
   - Lead with the most newsworthy development
   - Include key stakeholders and their actions
   - Add critical numbers/data if relevant
   - Explain why this matters now
   - Mention immediate implications
   - List the citation of information

2. Style Guidelines:
   - Use strong, active verbs
   - Be specific, not general
   - Maintain journalistic objectivity
   - Make every word count
   - Explain technical terms if necessary

Format: Create a single paragraph of 250-400 words that informs and engages.
Pattern: [Major News] + [Key Details/Data] + [Why It Matters/What's Next] + [list of citation]

Focus on answering: What happened? Why is it significant? What's the impact?

IMPORTANT: Provide ONLY the summary paragraph. Do not include any introductory phrases,
labels, or meta-text like "Here's a summary" or "In AP/Reuters style."
Start directly with the news content."#,
};

impl StagePrompt {
    pub fn agent(&self, model: &str) -> AgentSpec {
        AgentSpec::new(self.name, self.instructions, model)
    }
}

/// The three stage agents, built once at startup.
#[derive(Clone, Debug)]
pub struct NewsAgents {
    pub search: AgentSpec,
    pub synthesis: AgentSpec,
    pub summary: AgentSpec,
}

impl NewsAgents {
    pub fn new(model: &str, search_news: Arc<dyn AgentFunction>) -> Self {
        Self {
            search: SEARCH_PROMPT.agent(model).with_function(search_news),
            synthesis: SYNTHESIS_PROMPT.agent(model),
            summary: SUMMARY_PROMPT.agent(model),
        }
    }
}

pub fn search_request(topic: &str) -> String {
    format!("Find recent news about {}", topic)
}

pub fn synthesis_request(raw_news: &str) -> String {
    format!("Synthesize these news articles:\n{}", raw_news)
}

pub fn summary_request(synthesis: &str) -> String {
    format!("Summarize this synthesis:\n{}", synthesis)
}
