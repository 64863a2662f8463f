use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use docustruct::application::services::{ExtractionService, StructureService};
use docustruct::infrastructure::document_intelligence::AzureDocIntelligenceAdapter;
use docustruct::infrastructure::llm::AzureOpenAiClient;
use docustruct::infrastructure::observability::{init_tracing, TracingConfig};
use docustruct::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env().context("Failed to load settings")?;

    let tracing_config = TracingConfig {
        environment: settings.environment.to_string(),
        ..TracingConfig::default()
    };
    init_tracing(tracing_config, settings.server.port);

    let analyzer = Arc::new(
        AzureDocIntelligenceAdapter::new(
            &settings.document_intelligence.endpoint,
            &settings.document_intelligence.api_key,
        )
        .with_poll_timeout(Duration::from_secs(
            settings.document_intelligence.poll_timeout_secs,
        )),
    );

    let chat_client = Arc::new(AzureOpenAiClient::new(
        &settings.openai.endpoint,
        &settings.openai.api_key,
        &settings.openai.api_version,
    ));

    let structure_service = Arc::new(StructureService::new(
        Arc::clone(&analyzer),
        Arc::clone(&chat_client),
        settings.openai.classification_model.clone(),
    ));

    let extraction_service = Arc::new(ExtractionService::new(
        Arc::clone(&chat_client),
        settings.openai.extraction_model.clone(),
    ));

    let state = AppState {
        structure_service,
        extraction_service,
    };

    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
