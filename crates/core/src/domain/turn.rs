use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::action::Action;

/// Token accounting as reported by the completion provider. Fields the
/// gateway does not interpret are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnResult {
    pub text: String,
    pub actions: Vec<Action>,
    pub model_used: String,
    pub usage: TokenUsage,
}
