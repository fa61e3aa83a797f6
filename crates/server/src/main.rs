mod config;
mod error;
mod extract;
mod logging;
mod routes;
mod sessions;

use anyhow::Context;
use std::sync::Arc;
use tally_core::{LedgerStore, SystemClock};
use tally_ingest::{ChatCompletion, CompletionBackend, DedupGate, IngestPipeline, KeywordRules, TextParser};
use tally_storage::{create_db, SqliteLedger};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(config.log_format);

    let pool = create_db(&config.db_path)
        .await
        .with_context(|| format!("Failed to open ledger at {}", config.db_path.display()))?;
    tracing::info!(path = %config.db_path.display(), "ledger database ready");
    let store: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::new(pool));

    let rules = match &config.category_rules {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read category rules {}", path.display()))?;
            KeywordRules::from_toml(&content)?
        }
        None => KeywordRules::default(),
    };

    if config.completion.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, parsing with keyword rules only");
    }
    let backend: Box<dyn CompletionBackend> = Box::new(ChatCompletion::new(config.completion.clone()));
    let parser = TextParser::new(backend)
        .with_rules(rules)
        .with_timeout(config.completion.timeout);
    let gate = DedupGate::new(config.dedup_threshold, chrono::Duration::hours(24));
    let pipeline = IngestPipeline::new(parser, gate, store, Arc::new(SystemClock));

    let app = routes::router(AppState::new(pipeline));

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
