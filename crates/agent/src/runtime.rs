use std::sync::Arc;

use dappazon_core::config::AppConfig;
use dappazon_core::domain::turn::TurnResult;
use dappazon_core::errors::TurnError;
use dappazon_ledger::CatalogSource;

use crate::actions::extract;
use crate::augment::{FirstPass, SearchAugmenter};
use crate::cascade::ModelCascade;
use crate::conversation::{primary_messages, trailing_window, ChatRequest, NO_REPLY_TEXT};
use crate::llm::{LlmClient, Sampling};
use crate::prompt::{PromptComposer, SystemPrompt};
use crate::search::WebSearch;

#[derive(Clone, Debug)]
pub struct RuntimeSettings {
    pub models: Vec<String>,
    pub sampling: Sampling,
    pub follow_up_sampling: Sampling,
    pub history_window: usize,
    pub catalog_size: u64,
}

impl RuntimeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            models: config.llm.models.clone(),
            sampling: Sampling::primary(&config.llm),
            follow_up_sampling: Sampling::follow_up(&config.llm),
            history_window: config.chat.history_window,
            catalog_size: config.ledger.item_count,
        }
    }
}

/// Runs one chat turn end to end. Holds no per-turn state, so a single
/// instance serves concurrent requests.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    prompts: PromptComposer,
    cascade: ModelCascade,
    augmenter: SearchAugmenter,
    sampling: Sampling,
    history_window: usize,
}

impl AgentRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        catalog: Arc<dyn CatalogSource>,
        search: Arc<dyn WebSearch>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            llm,
            prompts: PromptComposer::new(catalog, settings.catalog_size),
            cascade: ModelCascade::new(settings.models),
            augmenter: SearchAugmenter::new(search, settings.follow_up_sampling),
            sampling: settings.sampling,
            history_window: settings.history_window,
        }
    }

    pub async fn system_prompt(&self, correlation_id: &str) -> SystemPrompt {
        self.prompts.compose(correlation_id).await
    }

    pub async fn handle_turn(
        &self,
        request: &ChatRequest,
        correlation_id: &str,
    ) -> Result<TurnResult, TurnError> {
        let message = request.validated_message()?;
        let history = trailing_window(&request.conversation_history, self.history_window);

        let prompt = self.prompts.compose(correlation_id).await;
        let messages = primary_messages(&prompt.text, history, message);

        let outcome = self
            .cascade
            .complete(self.llm.as_ref(), &messages, self.sampling, correlation_id)
            .await?;
        let raw_text = outcome.completion.text.as_deref().unwrap_or(NO_REPLY_TEXT);

        let reply = self
            .augmenter
            .apply(
                self.llm.as_ref(),
                FirstPass {
                    primary_messages: &messages,
                    raw_text,
                    extraction: extract(raw_text),
                    model: &outcome.model,
                },
                correlation_id,
            )
            .await?;

        tracing::info!(
            event_name = "agent.turn.completed",
            correlation_id = %correlation_id,
            model = %outcome.model,
            live_prompt = prompt.advertises_actions(),
            message_len = message.len(),
            history_len = history.len(),
            action_count = reply.actions.len(),
            "chat turn completed"
        );

        Ok(TurnResult {
            text: reply.text,
            actions: reply.actions,
            model_used: outcome.model,
            usage: outcome.completion.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use dappazon_core::domain::action::Action;
    use dappazon_core::domain::conversation::{ConversationMessage, Role};
    use dappazon_core::errors::TurnError;
    use dappazon_ledger::{demo_entries, CatalogSource, InMemoryCatalog};

    use super::{AgentRuntime, RuntimeSettings};
    use crate::augment::tests::{results, ScriptedSearch};
    use crate::cascade::tests::{rate_limited, text, ScriptedLlm};
    use crate::conversation::{ChatRequest, NO_REPLY_TEXT};
    use crate::llm::{Completion, Sampling};
    use crate::prompt::FALLBACK_PROMPT;
    use crate::search::SearchError;

    fn settings(models: &[&str]) -> RuntimeSettings {
        RuntimeSettings {
            models: models.iter().map(|model| model.to_string()).collect(),
            sampling: Sampling { temperature: 0.7, max_tokens: 500, top_p: 1.0 },
            follow_up_sampling: Sampling { temperature: 0.7, max_tokens: 600, top_p: 1.0 },
            history_window: 4,
            catalog_size: 14,
        }
    }

    fn runtime(
        llm: Arc<ScriptedLlm>,
        catalog: Arc<dyn CatalogSource>,
        search: Arc<ScriptedSearch>,
        models: &[&str],
    ) -> AgentRuntime {
        AgentRuntime::new(llm, catalog, search, settings(models))
    }

    fn live_catalog() -> Arc<dyn CatalogSource> {
        Arc::new(InMemoryCatalog::with_entries(demo_entries()))
    }

    #[tokio::test]
    async fn view_product_turn_end_to_end() {
        let llm = Arc::new(ScriptedLlm::new(vec![text("Đây là Drone! [ACTION:VIEW_PRODUCT:2]")]));
        let search = Arc::new(ScriptedSearch::new(Ok(results(3))));
        let runtime = runtime(llm.clone(), live_catalog(), search.clone(), &["model-a"]);

        let result = runtime
            .handle_turn(&ChatRequest::new("Cho xem Drone", Vec::new()), "req-1")
            .await
            .expect("turn");

        assert_eq!(result.text, "Đây là Drone!");
        assert_eq!(
            serde_json::to_value(&result.actions).expect("serialize"),
            json!([{"type": "VIEW_PRODUCT", "payload": "2"}])
        );
        assert_eq!(result.model_used, "model-a");
        assert_eq!(result.usage.total_tokens, Some(42));
        assert!(search.queries().is_empty());

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].messages[0].role, Role::System);
        assert!(calls[0].messages[0].content.contains("Drone = 2"));
        assert_eq!(calls[0].messages[1], ConversationMessage::user("Cho xem Drone"));
    }

    #[tokio::test]
    async fn search_turn_returns_only_the_results_action() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            rate_limited("model-a"),
            text("Để tôi tìm... [ACTION:WEB_SEARCH:ethereum price today]"),
            text("ETH đang ở mức 3000$."),
        ]));
        let search = Arc::new(ScriptedSearch::new(Ok(results(3))));
        let runtime = runtime(llm.clone(), live_catalog(), search, &["model-a", "model-b"]);

        let result = runtime
            .handle_turn(&ChatRequest::new("Giá ETH hôm nay", Vec::new()), "req-2")
            .await
            .expect("turn");

        assert_eq!(result.text, "ETH đang ở mức 3000$.");
        assert_eq!(result.actions, vec![Action::WebSearchResults(results(3))]);
        assert_eq!(result.model_used, "model-b");
        assert_eq!(llm.models_called(), vec!["model-a", "model-b", "model-b"]);
    }

    #[tokio::test]
    async fn history_is_truncated_to_the_trailing_window() {
        let llm = Arc::new(ScriptedLlm::new(vec![text("ok")]));
        let search = Arc::new(ScriptedSearch::new(Err(SearchError::NotConfigured)));
        let runtime = runtime(llm.clone(), live_catalog(), search, &["model-a"]);
        let history: Vec<ConversationMessage> =
            (0..10).map(|i| ConversationMessage::user(format!("m{i}"))).collect();

        runtime.handle_turn(&ChatRequest::new("hi", history), "req-3").await.expect("turn");

        let contents: Vec<String> =
            llm.calls()[0].messages.iter().map(|message| message.content.clone()).collect();
        assert_eq!(contents.len(), 1 + 4 + 1);
        assert_eq!(&contents[1..], &["m6", "m7", "m8", "m9", "hi"]);
    }

    #[tokio::test]
    async fn blank_message_fails_before_any_provider_call() {
        let llm = Arc::new(ScriptedLlm::default());
        let search = Arc::new(ScriptedSearch::new(Ok(Vec::new())));
        let runtime = runtime(llm.clone(), live_catalog(), search, &["model-a"]);

        let error = runtime
            .handle_turn(&ChatRequest::new("  ", Vec::new()), "req-4")
            .await
            .expect_err("invalid input");

        assert!(matches!(error, TurnError::InvalidInput(_)));
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn unavailable_ledger_uses_fallback_prompt_and_still_answers() {
        let llm = Arc::new(ScriptedLlm::new(vec![text("Xin chào!")]));
        let search = Arc::new(ScriptedSearch::new(Ok(Vec::new())));
        let catalog: Arc<dyn CatalogSource> = Arc::new(InMemoryCatalog::failing("offline"));
        let runtime = runtime(llm.clone(), catalog, search, &["model-a"]);

        let result =
            runtime.handle_turn(&ChatRequest::new("hi", Vec::new()), "req-5").await.expect("turn");

        assert_eq!(result.text, "Xin chào!");
        assert!(result.actions.is_empty());
        assert_eq!(llm.calls()[0].messages[0].content, FALLBACK_PROMPT);
    }

    #[tokio::test]
    async fn empty_completion_uses_apology_text() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(Completion::default())]));
        let search = Arc::new(ScriptedSearch::new(Ok(Vec::new())));
        let runtime = runtime(llm, live_catalog(), search, &["model-a"]);

        let result =
            runtime.handle_turn(&ChatRequest::new("hi", Vec::new()), "req-6").await.expect("turn");

        assert_eq!(result.text, NO_REPLY_TEXT);
        assert!(result.actions.is_empty());
    }

    #[tokio::test]
    async fn exhausted_cascade_surfaces_as_retryable_error() {
        let llm =
            Arc::new(ScriptedLlm::new(vec![rate_limited("model-a"), rate_limited("model-b")]));
        let search = Arc::new(ScriptedSearch::new(Ok(Vec::new())));
        let runtime = runtime(llm, live_catalog(), search, &["model-a", "model-b"]);

        let error = runtime
            .handle_turn(&ChatRequest::new("hi", Vec::new()), "req-7")
            .await
            .expect_err("exhausted");

        assert!(error.is_retryable());
    }
}
