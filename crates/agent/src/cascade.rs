use dappazon_core::domain::conversation::ConversationMessage;
use dappazon_core::errors::TurnError;

use crate::llm::{Completion, LlmClient, Sampling};

/// Completion from the first model that was not rate limited.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeOutcome {
    pub completion: Completion,
    pub model: String,
}

/// Ordered model preference list. Only a rate-limit answer advances to the
/// next model; every other failure ends the cascade.
#[derive(Clone, Debug)]
pub struct ModelCascade {
    models: Vec<String>,
}

impl ModelCascade {
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }

    pub async fn complete(
        &self,
        client: &dyn LlmClient,
        messages: &[ConversationMessage],
        sampling: Sampling,
        correlation_id: &str,
    ) -> Result<CascadeOutcome, TurnError> {
        let mut attempted = Vec::with_capacity(self.models.len());

        for model in &self.models {
            attempted.push(model.clone());
            match client.complete(model, messages, sampling).await {
                Ok(completion) => {
                    tracing::info!(
                        event_name = "agent.cascade.selected",
                        correlation_id = %correlation_id,
                        model = %model,
                        attempts = attempted.len(),
                        "completion model selected"
                    );
                    return Ok(CascadeOutcome { completion, model: model.clone() });
                }
                Err(error) if error.is_rate_limited() => {
                    tracing::warn!(
                        event_name = "agent.cascade.rate_limited",
                        correlation_id = %correlation_id,
                        model = %model,
                        "model rate limited, trying next"
                    );
                }
                Err(error) => {
                    return Err(TurnError::Provider {
                        model: model.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }

        Err(TurnError::AllModelsRateLimited { attempted })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use dappazon_core::domain::conversation::ConversationMessage;
    use dappazon_core::domain::turn::TokenUsage;
    use dappazon_core::errors::TurnError;

    use super::ModelCascade;
    use crate::llm::{Completion, CompletionError, LlmClient, Sampling};

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) struct RecordedCall {
        pub model: String,
        pub messages: Vec<ConversationMessage>,
        pub sampling: Sampling,
    }

    /// Replays scripted answers in order and records every call it receives.
    #[derive(Default)]
    pub(crate) struct ScriptedLlm {
        script: Mutex<VecDeque<Result<Completion, CompletionError>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedLlm {
        pub(crate) fn new(script: Vec<Result<Completion, CompletionError>>) -> Self {
            Self { script: Mutex::new(script.into()), calls: Mutex::default() }
        }

        pub(crate) fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().expect("calls lock").clone()
        }

        pub(crate) fn models_called(&self) -> Vec<String> {
            self.calls().into_iter().map(|call| call.model).collect()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(
            &self,
            model: &str,
            messages: &[ConversationMessage],
            sampling: Sampling,
        ) -> Result<Completion, CompletionError> {
            self.calls.lock().expect("calls lock").push(RecordedCall {
                model: model.to_string(),
                messages: messages.to_vec(),
                sampling,
            });
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::Transport("script exhausted".into())))
        }
    }

    pub(crate) fn text(content: &str) -> Result<Completion, CompletionError> {
        Ok(Completion {
            text: Some(content.to_string()),
            usage: TokenUsage { total_tokens: Some(42), ..TokenUsage::default() },
        })
    }

    pub(crate) fn rate_limited(model: &str) -> Result<Completion, CompletionError> {
        Err(CompletionError::RateLimited { model: model.to_string() })
    }

    pub(crate) fn sampling() -> Sampling {
        Sampling { temperature: 0.7, max_tokens: 500, top_p: 1.0 }
    }

    fn cascade(models: &[&str]) -> ModelCascade {
        ModelCascade::new(models.iter().map(|model| model.to_string()).collect())
    }

    #[tokio::test]
    async fn advances_past_rate_limited_models_and_stops_at_first_success() {
        let llm = ScriptedLlm::new(vec![rate_limited("a"), rate_limited("b"), text("hello")]);
        let messages = vec![ConversationMessage::user("hi")];

        let outcome = cascade(&["a", "b", "c", "d"])
            .complete(&llm, &messages, sampling(), "req-1")
            .await
            .expect("cascade succeeds");

        assert_eq!(outcome.model, "c");
        assert_eq!(outcome.completion.text.as_deref(), Some("hello"));
        assert_eq!(llm.models_called(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn exhausting_every_model_reports_all_attempts_in_order() {
        let llm = ScriptedLlm::new(vec![rate_limited("a"), rate_limited("b"), rate_limited("c")]);

        let error = cascade(&["a", "b", "c"])
            .complete(&llm, &[ConversationMessage::user("hi")], sampling(), "req-2")
            .await
            .expect_err("cascade exhausted");

        assert_eq!(
            error,
            TurnError::AllModelsRateLimited {
                attempted: vec!["a".to_string(), "b".to_string(), "c".to_string()]
            }
        );
        assert_eq!(llm.models_called(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn non_rate_limit_failure_aborts_without_trying_next_model() {
        let llm = ScriptedLlm::new(vec![
            Err(CompletionError::Upstream { status: 400, message: "bad request".into() }),
            text("never reached"),
        ]);

        let error = cascade(&["a", "b"])
            .complete(&llm, &[ConversationMessage::user("hi")], sampling(), "req-3")
            .await
            .expect_err("provider error");

        assert!(matches!(error, TurnError::Provider { ref model, .. } if model == "a"));
        assert_eq!(llm.models_called(), vec!["a"]);
    }

    #[tokio::test]
    async fn single_model_list_is_a_single_attempt() {
        let llm = ScriptedLlm::new(vec![rate_limited("only")]);

        let error = cascade(&["only"])
            .complete(&llm, &[ConversationMessage::user("hi")], sampling(), "req-4")
            .await
            .expect_err("exhausted");

        assert!(error.is_retryable());
        assert_eq!(llm.calls().len(), 1);
    }
}
