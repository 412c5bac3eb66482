use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dappazon_core::config::LlmConfig;
use dappazon_core::domain::conversation::ConversationMessage;
use dappazon_core::domain::turn::TokenUsage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion provider api key is not configured")]
    NotConfigured,
    #[error("model `{model}` is rate limited")]
    RateLimited { model: String },
    #[error("completion provider returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("completion transport failed: {0}")]
    Transport(String),
    #[error("completion response could not be decoded: {0}")]
    Decode(String),
}

impl CompletionError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Sampling {
    pub fn primary(config: &LlmConfig) -> Self {
        Self { temperature: config.temperature, max_tokens: config.max_tokens, top_p: config.top_p }
    }

    /// Same knobs with the larger budget used to summarize search results.
    pub fn follow_up(config: &LlmConfig) -> Self {
        Self { max_tokens: config.follow_up_max_tokens, ..Self::primary(config) }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Completion {
    /// `None` when the provider answered without any message content.
    pub text: Option<String>,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ConversationMessage],
        sampling: Sampling,
    ) -> Result<Completion, CompletionError>;
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for any OpenAI-compatible `chat/completions` endpoint (Groq by default).
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

impl ChatCompletionsClient {
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let api_key = config.api_key.clone().ok_or(CompletionError::NotConfigured)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ConversationMessage],
        sampling: Sampling,
    ) -> Result<Completion, CompletionError> {
        let request = ChatCompletionRequest {
            model,
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            top_p: sampling.top_p,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(model, status, &body));
        }

        let body: ChatCompletionResponse =
            response.json().await.map_err(|err| CompletionError::Decode(err.to_string()))?;
        Ok(into_completion(body))
    }
}

fn map_http_error(model: &str, status: StatusCode, body: &str) -> CompletionError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return CompletionError::RateLimited { model: model.to_string() };
    }

    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());
    CompletionError::Upstream { status: status.as_u16(), message }
}

fn into_completion(body: ChatCompletionResponse) -> Completion {
    let text = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.is_empty());
    Completion { text, usage: body.usage.unwrap_or_default() }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use dappazon_core::config::AppConfig;
    use dappazon_core::domain::conversation::ConversationMessage;

    use super::{
        into_completion, map_http_error, ChatCompletionRequest, ChatCompletionResponse,
        ChatCompletionsClient, CompletionError,
    };

    #[test]
    fn too_many_requests_is_the_only_rate_limit_signal() {
        assert_eq!(
            map_http_error("model-a", StatusCode::TOO_MANY_REQUESTS, ""),
            CompletionError::RateLimited { model: "model-a".to_string() }
        );

        let error = map_http_error(
            "model-a",
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"context length exceeded"}}"#,
        );
        assert_eq!(
            error,
            CompletionError::Upstream { status: 400, message: "context length exceeded".into() }
        );
        assert!(!error.is_rate_limited());
    }

    #[test]
    fn client_without_api_key_is_not_configured() {
        let config = AppConfig::default();
        assert!(config.llm.api_key.is_none());

        let error = ChatCompletionsClient::new(&config.llm).err();
        assert_eq!(error, Some(CompletionError::NotConfigured));
    }

    #[test]
    fn non_json_error_body_is_kept_verbatim() {
        let error = map_http_error("model-a", StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(
            error,
            CompletionError::Upstream { status: 502, message: "upstream down".into() }
        );
    }

    #[test]
    fn request_uses_openai_wire_shape() {
        let messages = vec![ConversationMessage::system("sys"), ConversationMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "llama-3.3-70b-versatile",
            messages: &messages,
            temperature: 0.7,
            max_tokens: 500,
            top_p: 1.0,
            stream: false,
        };

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["model"], "llama-3.3-70b-versatile");
        assert_eq!(value["messages"][0], json!({"role": "system", "content": "sys"}));
        assert_eq!(value["max_tokens"], 500);
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn empty_choice_content_becomes_none() {
        let body: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": ""}}],
            "usage": {"total_tokens": 12}
        }))
        .expect("parse");

        let completion = into_completion(body);
        assert_eq!(completion.text, None);
        assert_eq!(completion.usage.total_tokens, Some(12));
    }

    #[test]
    fn first_choice_text_is_taken() {
        let body: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"content": "Đây là Drone! [ACTION:VIEW_PRODUCT:2]"}},
                {"message": {"content": "second"}}
            ]
        }))
        .expect("parse");

        assert_eq!(
            into_completion(body).text.as_deref(),
            Some("Đây là Drone! [ACTION:VIEW_PRODUCT:2]")
        );
    }
}
