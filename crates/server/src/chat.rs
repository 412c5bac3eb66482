use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use dappazon_agent::ChatRequest;
use dappazon_core::domain::action::Action;
use dappazon_core::domain::turn::{TokenUsage, TurnResult};
use dappazon_core::errors::{InterfaceError, TurnError};
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::routes::AppState;

/// Success body in the shape the storefront chat widget reads.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub actions: Vec<Action>,
    pub model: String,
    pub usage: TokenUsage,
}

impl From<TurnResult> for ChatResponse {
    fn from(result: TurnResult) -> Self {
        Self {
            response: result.text,
            actions: result.actions,
            model: result.model_used,
            usage: result.usage,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatErrorBody {
    pub error: &'static str,
    pub details: String,
    pub error_class: &'static str,
    pub correlation_id: String,
}

pub type ChatFailure = (StatusCode, Json<ChatErrorBody>);

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatFailure> {
    let correlation_id = Uuid::new_v4().to_string();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let error = TurnError::MalformedRequest(rejection.body_text());
            return Err(failure(error, &correlation_id));
        }
    };

    match state.agent_runtime.handle_turn(&request, &correlation_id).await {
        Ok(result) => Ok(Json(ChatResponse::from(result))),
        Err(turn_error) => Err(failure(turn_error, &correlation_id)),
    }
}

fn failure(turn_error: TurnError, correlation_id: &str) -> ChatFailure {
    let error_class = turn_error.error_class();
    let interface = turn_error.into_interface(correlation_id);
    let status = status_for(&interface);

    if status.is_server_error() {
        error!(
            event_name = "server.chat.failed",
            correlation_id = %interface.correlation_id(),
            error_class,
            error = %interface,
            "chat turn failed"
        );
    } else {
        warn!(
            event_name = "server.chat.rejected",
            correlation_id = %interface.correlation_id(),
            error_class,
            error = %interface,
            "chat request rejected"
        );
    }

    let body = ChatErrorBody {
        error: interface.user_message(),
        details: interface.message().to_string(),
        error_class,
        correlation_id: interface.correlation_id().to_string(),
    };
    (status, Json(body))
}

pub fn status_for(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } | InterfaceError::MalformedBody { .. } => {
            StatusCode::BAD_REQUEST
        }
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
