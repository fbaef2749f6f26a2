//! News Inshorts: type a topic, get a three-stage AI news summary.

mod jobs;
mod page;
mod server;
mod simple_md;

use agent_host::NewsPipeline;
use anyhow::Context;
use shared::settings::AppSettings;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::server::NewsServer;

fn main() -> anyhow::Result<()> {
    // .env first so it feeds into the settings below
    let env_file = dotenvy::dotenv().ok();
    let settings = AppSettings::from_env();
    init_tracing(settings.server.debug);

    if let Some(path) = env_file {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    let pipeline = Arc::new(
        NewsPipeline::from_settings(&settings).context("failed to set up the news pipeline")?,
    );

    let addr = settings.bind_addr();
    let server = NewsServer::bind(
        &addr,
        pipeline,
        runtime.handle().clone(),
        settings.server.debug,
    )?;
    tracing::info!(
        addr = ?server.local_addr(),
        model = %settings.model.openai_model,
        debug = settings.server.debug,
        "📰 News Inshorts listening"
    );

    server.run();
    Ok(())
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "info,news_inshorts=debug,agent_host=debug,providers=debug,services=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
