use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use dappazon_ledger::CatalogSource;
use serde::Serialize;

use crate::routes::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub ledger: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let ledger = ledger_check(state.catalog.as_ref()).await;
    let ready = ledger.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "Dappazon AI Server is running".to_string(),
        },
        ledger,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn ledger_check(catalog: &dyn CatalogSource) -> HealthCheck {
    match catalog.ping().await {
        Ok(block) => HealthCheck { status: "ready", detail: format!("ledger at block {block}") },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("ledger unreachable: {error}") }
        }
    }
}
