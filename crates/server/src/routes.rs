use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use dappazon_agent::AgentRuntime;
use dappazon_ledger::CatalogSource;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{chat, health};

#[derive(Clone)]
pub struct AppState {
    pub agent_runtime: Arc<AgentRuntime>,
    pub catalog: Arc<dyn CatalogSource>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
