use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interview_api::config::Config;
use interview_api::documents::DocumentExtractor;
use interview_api::interview::SessionController;
use interview_api::llm_client::{self, LlmClient, RetryPolicy};
use interview_api::provider::llm::LlmProvider;
use interview_api::routes::build_router;
use interview_api::state::AppState;
use interview_api::store::{FileStore, KeyValueStore, MemoryStore, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;
    info!("Session store initialized (backend: {})", store.backend());

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone()).with_retry(RetryPolicy {
        max_attempts: config.llm_max_attempts,
        ..RetryPolicy::default()
    });
    info!(
        "LLM client initialized (model: {}, max attempts: {})",
        llm_client::MODEL,
        config.llm_max_attempts
    );

    let interview = config.interview_config();
    info!(
        "Interview schedule: {} questions, {}s total",
        interview.question_count(),
        interview.total_allotted_seconds()
    );

    let controller = SessionController::new(
        Arc::new(LlmProvider::new(llm)),
        Arc::new(DocumentExtractor),
        store,
        interview,
    );

    if let Some(saved) = controller.saved_session().await {
        info!(
            "Found saved session {} for '{}' at question {}/{}",
            saved.session_id, saved.candidate_name, saved.question_number, saved.total_questions
        );
    }

    let state = AppState {
        controller,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Redis when `REDIS_URL` is set, else files under `DATA_DIR`, else memory.
async fn build_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    if let Some(url) = &config.redis_url {
        return Ok(Arc::new(RedisStore::connect(url).await?));
    }
    if let Some(dir) = &config.data_dir {
        return Ok(Arc::new(FileStore::new(dir.clone())?));
    }
    warn!("Neither REDIS_URL nor DATA_DIR is set; sessions will not survive a restart");
    Ok(Arc::new(MemoryStore::new()))
}
