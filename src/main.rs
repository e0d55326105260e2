use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use kuching::application::ports::{ModelOptions, RetrievalClient};
use kuching::application::services::{ChatTurnService, ContextAggregator};
use kuching::infrastructure::llm::GeminiClient;
use kuching::infrastructure::observability::{init_tracing, TracingConfig};
use kuching::infrastructure::persistence::{
    create_pool, PgConversationRepository, PgFileRecordStore, PgProjectDirectory, PgSessionStore,
};
use kuching::infrastructure::retrieval::HttpRetrievalClient;
use kuching::presentation::{create_router, AppState, Environment, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let settings = Settings::load(environment)?;
    init_tracing(
        TracingConfig {
            environment: environment.to_string(),
            ..TracingConfig::default()
        },
        settings.server.port,
    );

    let pool = create_pool(&settings.database.url, settings.database.max_connections).await?;
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Migrations complete");

    let conversations = Arc::new(PgConversationRepository::new(pool.clone()));
    let directory = Arc::new(PgProjectDirectory::new(pool.clone()));
    let file_records = Arc::new(PgFileRecordStore::new(pool.clone()));
    let sessions = Arc::new(PgSessionStore::new(pool.clone()));

    let retrieval: Option<Arc<dyn RetrievalClient>> = match &settings.retrieval.url {
        Some(url) => {
            let client = HttpRetrievalClient::new(
                url.clone(),
                Duration::from_secs(settings.retrieval.timeout_seconds),
            )?;
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("No retrieval service configured, chat runs without augmentation");
            None
        }
    };

    let aggregator = ContextAggregator::new(
        directory,
        file_records,
        retrieval,
        settings.storage.provider.clone(),
    );

    let model = Arc::new(GeminiClient::new(&settings.llm));
    let options = ModelOptions {
        chat_model: settings.llm.chat_model.clone(),
        title_model: settings.llm.title_model.clone(),
        temperature: settings.llm.temperature,
        max_output_tokens: settings.llm.max_output_tokens,
    };

    let chat_turns = Arc::new(ChatTurnService::new(
        conversations.clone(),
        aggregator,
        model,
        options,
    ));

    let state = AppState {
        chat_turns,
        conversations,
        sessions,
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    pool.close().await;
    Ok(())
}
