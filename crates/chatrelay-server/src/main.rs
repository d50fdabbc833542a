//! chatrelay: chat backend forwarding conversations to a hosted LLM.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatrelay_chat::{CompletionClient, LLMConfig, OpenAIClient};
use chatrelay_core::{ChatMode, ChatRelayConfig};
use chatrelay_infer::{CachedEmbedder, OpenAIEmbedder};
use chatrelay_ingest::{load_document, FixedSizeChunker};
use chatrelay_server::session::start_session_sweeper;
use chatrelay_server::{build_router, AppState, Responder};
use chatrelay_store::RetrievalIndex;
use chatrelay_tools::{CoinGeckoClient, ToolDispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ChatRelayConfig::from_env()?;
    let llm_config = LLMConfig::from_env()?;
    info!("Mode: {}", config.mode);
    info!("Model: {} via {}", llm_config.model, llm_config.base_url);

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let responder = build_responder(&config, &llm_config, http).await?;

    let state = Arc::new(AppState::new(config, responder)?);
    start_session_sweeper(state.clone());

    let app = build_router(state.clone());

    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("chatrelay listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_responder(
    config: &ChatRelayConfig,
    llm_config: &LLMConfig,
    http: reqwest::Client,
) -> anyhow::Result<Responder> {
    let completions: Arc<dyn CompletionClient> =
        Arc::new(OpenAIClient::new(http.clone(), llm_config));

    let responder = match config.mode {
        ChatMode::Plain => Responder::plain(completions),
        ChatMode::Retrieval => {
            let document = load_document(&config.document_path)?;
            let embedder = CachedEmbedder::with_defaults(OpenAIEmbedder::new(http, llm_config));
            let index = RetrievalIndex::build(
                &document,
                &FixedSizeChunker::new(config.chunk_size),
                Arc::new(embedder),
                config.top_k,
            )
            .await
            .context("Failed to build retrieval index")?;
            Responder::retrieval(completions, Arc::new(index))
        }
        ChatMode::Tools => {
            let prices = CoinGeckoClient::new(http, config.price_api_base_url.clone());
            Responder::tools(completions, Arc::new(ToolDispatcher::new(Arc::new(prices))))
        }
    };
    Ok(responder)
}
