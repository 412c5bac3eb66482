use std::sync::Arc;

use dappazon_core::domain::action::Action;
use dappazon_core::domain::conversation::ConversationMessage;
use dappazon_core::errors::TurnError;

use crate::actions::{extract, Extraction};
use crate::conversation::follow_up_messages;
use crate::llm::{LlmClient, Sampling};
use crate::search::{WebSearch, MAX_RESULTS};

/// Reply after the search step: either the extraction untouched, or the
/// summarized follow-up with a single results action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub actions: Vec<Action>,
}

/// What the first completion produced, plus what a follow-up call needs.
pub struct FirstPass<'a> {
    pub primary_messages: &'a [ConversationMessage],
    pub raw_text: &'a str,
    pub extraction: Extraction,
    pub model: &'a str,
}

pub struct SearchAugmenter {
    search: Arc<dyn WebSearch>,
    follow_up_sampling: Sampling,
}

impl SearchAugmenter {
    pub fn new(search: Arc<dyn WebSearch>, follow_up_sampling: Sampling) -> Self {
        Self { search, follow_up_sampling }
    }

    pub async fn apply(
        &self,
        llm: &dyn LlmClient,
        first: FirstPass<'_>,
        correlation_id: &str,
    ) -> Result<Reply, TurnError> {
        let actions = first.extraction.actions();
        let unchanged = Reply { text: first.extraction.clean_text.clone(), actions };

        let Some(query) = unchanged.actions.iter().find_map(Action::search_query) else {
            return Ok(unchanged);
        };

        let mut results = match self.search.search(query).await {
            Ok(results) => results,
            Err(error) => {
                tracing::warn!(
                    event_name = "agent.search.unavailable",
                    correlation_id = %correlation_id,
                    error = %error,
                    "web search unavailable, keeping search action unexecuted"
                );
                return Ok(unchanged);
            }
        };
        results.truncate(MAX_RESULTS);

        if results.is_empty() {
            tracing::info!(
                event_name = "agent.search.unavailable",
                correlation_id = %correlation_id,
                query_len = query.len(),
                "web search returned no results"
            );
            return Ok(unchanged);
        }

        let messages = follow_up_messages(first.primary_messages, first.raw_text, &results);
        let completion = llm
            .complete(first.model, &messages, self.follow_up_sampling)
            .await
            .map_err(|error| TurnError::FollowUp {
                model: first.model.to_string(),
                message: error.to_string(),
            })?;

        let text = match completion.text {
            Some(text) => extract(&text).clean_text,
            None => unchanged.text,
        };

        tracing::info!(
            event_name = "agent.search.augmented",
            correlation_id = %correlation_id,
            result_count = results.len(),
            "search results summarized"
        );

        Ok(Reply { text, actions: vec![Action::WebSearchResults(results)] })
    }
}
