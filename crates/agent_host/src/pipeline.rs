//! The search → synthesize → summarize pipeline.
//!
//! Stages run strictly one after another, each consuming the previous
//! stage's text. Callers always get a string back: the formatted summary or
//! a user-facing error.

use anyhow::Result;
use providers::{ChatModel, OpenAIClient};
use services::{DuckDuckGoSearch, PageExcerpter};
use shared::events::PipelineEvent;
use shared::settings::AppSettings;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::prompts::{search_request, summary_request, synthesis_request, NewsAgents};
use crate::skills::research::NewsLocator;
use crate::swarm::Swarm;

pub const EMPTY_TOPIC_MESSAGE: &str = "❌ Error: Please enter a topic!";
pub const ERROR_PREFIX: &str = "❌ An error occurred: ";

pub fn format_summary(topic: &str, summary: &str) -> String {
    format!("# 📝 News Summary: {}\n\n{}", topic, summary)
}

pub struct NewsPipeline {
    swarm: Swarm,
    agents: NewsAgents,
}

impl NewsPipeline {
    pub fn new(swarm: Swarm, agents: NewsAgents) -> Self {
        Self { swarm, agents }
    }

    /// Wire the production model, search provider and page fetcher.
    pub fn from_settings(settings: &AppSettings) -> Result<Self> {
        let model: Arc<dyn ChatModel> = Arc::new(OpenAIClient::from_settings(&settings.model)?);
        let news = &settings.news;
        let search = DuckDuckGoSearch::new(Duration::from_millis(news.search_interval_ms))?;
        let pages = PageExcerpter::new(Duration::from_secs(news.fetch_timeout_secs))?;
        let locator = NewsLocator::new(Arc::new(search), Arc::new(pages), news.clone());
        let agents = NewsAgents::new(&settings.model.openai_model, Arc::new(locator));
        Ok(Self::new(Swarm::new(model), agents))
    }

    pub async fn process(&self, topic: &str) -> String {
        self.run(topic, None).await
    }

    /// Same as [`Self::process`], reporting checkpoints on `tx`.
    pub async fn process_with_events(
        &self,
        topic: &str,
        tx: UnboundedSender<PipelineEvent>,
    ) -> String {
        self.run(topic, Some(&tx)).await
    }

    async fn run(&self, topic: &str, tx: Option<&UnboundedSender<PipelineEvent>>) -> String {
        if topic.trim().is_empty() {
            return EMPTY_TOPIC_MESSAGE.to_string();
        }

        let run_id = Uuid::new_v4();
        let start = Instant::now();
        let emit = |event: PipelineEvent| {
            if let Some(tx) = tx {
                // Receiver may have gone away; the run still completes.
                let _ = tx.send(event);
            }
        };

        tracing::info!(%run_id, topic, "news pipeline started");
        emit(PipelineEvent::started(run_id, topic));

        match self.run_stages(run_id, topic, &emit).await {
            Ok(summary) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                tracing::info!(%run_id, duration_ms, "news pipeline complete");
                emit(PipelineEvent::Completed {
                    run_id,
                    duration_ms,
                });
                format_summary(topic, &summary)
            }
            Err(e) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                tracing::warn!(%run_id, duration_ms, error = %e, "news pipeline failed");
                emit(PipelineEvent::Failed {
                    run_id,
                    error: e.to_string(),
                    duration_ms,
                });
                format!("{}{}", ERROR_PREFIX, e)
            }
        }
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        topic: &str,
        emit: &impl Fn(PipelineEvent),
    ) -> Result<String> {
        emit(PipelineEvent::progress(run_id, 10, "🔍 Searching for news..."));
        let raw_news = self
            .swarm
            .run_stage(&self.agents.search, &search_request(topic))
            .await?;

        emit(PipelineEvent::progress(run_id, 50, "🔄 Synthesizing information..."));
        let synthesized = self
            .swarm
            .run_stage(&self.agents.synthesis, &synthesis_request(&raw_news))
            .await?;

        emit(PipelineEvent::progress(run_id, 80, "📝 Creating summary..."));
        let summary = self
            .swarm
            .run_stage(&self.agents.summary, &summary_request(&synthesized))
            .await?;

        emit(PipelineEvent::progress(run_id, 100, "✅ Complete!"));
        Ok(summary)
    }
}
