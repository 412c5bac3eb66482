use thiserror::Error;

/// Failures a chat turn can surface to its caller. Snapshot and search
/// failures are absorbed before they reach this level.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("malformed request body: {0}")]
    MalformedRequest(String),
    #[error("all models are rate limited (attempted: {})", attempted.join(", "))]
    AllModelsRateLimited { attempted: Vec<String> },
    #[error("completion provider failed for model `{model}`: {message}")]
    Provider { model: String, message: String },
    #[error("follow-up completion failed for model `{model}`: {message}")]
    FollowUp { model: String, message: String },
}

impl TurnError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::MalformedRequest(_) => "malformed_request",
            Self::AllModelsRateLimited { .. } => "all_models_rate_limited",
            Self::Provider { .. } => "provider_error",
            Self::FollowUp { .. } => "follow_up_failure",
        }
    }

    /// Only cascade exhaustion is worth retrying later unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllModelsRateLimited { .. })
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::MalformedBody { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("malformed body: {message}")]
    MalformedBody { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "Message is required",
            Self::MalformedBody { .. } => "Request body is not a valid chat request",
            Self::ServiceUnavailable { .. } => {
                "All models are rate limited. Please try again later."
            }
            Self::Internal { .. } => "Failed to get response from AI",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::MalformedBody { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::MalformedBody { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl From<TurnError> for InterfaceError {
    fn from(value: TurnError) -> Self {
        let message = value.to_string();
        match value {
            TurnError::InvalidInput(_) => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            TurnError::MalformedRequest(_) => {
                Self::MalformedBody { message, correlation_id: "unassigned".to_owned() }
            }
            TurnError::AllModelsRateLimited { .. } => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            TurnError::Provider { .. } | TurnError::FollowUp { .. } => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
