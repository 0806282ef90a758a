mod chat;
mod config;
mod errors;
mod llm_client;
mod models;
mod persona;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::evaluator::LlmEvaluator;
use crate::chat::policy::StyleTrigger;
use crate::chat::responder::LlmResponder;
use crate::chat::ChatLoop;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::persona::load_persona_context;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Persona API v{}", env!("CARGO_PKG_VERSION"));

    // Load persona documents once; PDF extraction is CPU-bound
    let loader_config = config.clone();
    let persona = tokio::task::spawn_blocking(move || load_persona_context(&loader_config))
        .await
        .context("Persona loader task panicked")??;
    let persona = Arc::new(persona);

    // Initialize LLM clients (responder and evaluator may be different providers)
    let responder_llm = LlmClient::new(
        &config.responder_base_url,
        config.responder_api_key.clone(),
        config.llm_timeout,
    )?;
    info!(
        "Responder client initialized (model: {}, endpoint: {})",
        config.responder_model,
        responder_llm.endpoint()
    );

    let evaluator_llm = LlmClient::new(
        &config.evaluator_base_url,
        config.evaluator_api_key.clone(),
        config.llm_timeout,
    )?;
    info!(
        "Evaluator client initialized (model: {}, endpoint: {})",
        config.evaluator_model,
        evaluator_llm.endpoint()
    );

    let responder = LlmResponder::new(Arc::new(responder_llm), config.responder_model.clone());
    let evaluator = LlmEvaluator::new(
        Arc::new(evaluator_llm),
        config.evaluator_model.clone(),
        persona.clone(),
    );

    let chat = ChatLoop::new(persona, Arc::new(responder), Arc::new(evaluator))
        .with_policy(Arc::new(StyleTrigger::pig_latin(config.style_trigger.clone())));

    // Build app state
    let state = AppState {
        chat: Arc::new(chat),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the widget's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
