use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use dappazon_core::config::SearchConfig;
use dappazon_core::domain::action::SearchResult;

/// Hard ceiling on results folded into a follow-up prompt.
pub const MAX_RESULTS: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("web search is not configured")]
    NotConfigured,
    #[error("web search transport failed: {0}")]
    Transport(String),
    #[error("web search provider returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("web search response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}

#[derive(Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// Google results through SerpAPI. Without an API key every search reports
/// `NotConfigured`.
#[derive(Clone)]
pub struct SerpApiClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    engine: String,
    language: String,
    max_results: usize,
}

impl SerpApiClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| SearchError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            engine: config.engine.clone(),
            language: config.language.clone(),
            max_results: config.max_results.clamp(1, MAX_RESULTS),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_ref().map(|key| !key.expose_secret().trim().is_empty()).unwrap_or(false)
    }
}

#[async_trait]
impl WebSearch for SerpApiClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let api_key = match &self.api_key {
            Some(key) if !key.expose_secret().trim().is_empty() => key,
            _ => return Err(SearchError::NotConfigured),
        };

        let num = self.max_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("api_key", api_key.expose_secret()),
                ("engine", self.engine.as_str()),
                ("num", num.as_str()),
                ("hl", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|err| SearchError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Upstream { status: status.as_u16(), message });
        }

        let body: SerpApiResponse =
            response.json().await.map_err(|err| SearchError::Decode(err.to_string()))?;
        Ok(into_results(body, self.max_results))
    }
}

fn into_results(body: SerpApiResponse, limit: usize) -> Vec<SearchResult> {
    body.organic_results
        .into_iter()
        .take(limit.min(MAX_RESULTS))
        .map(|result| SearchResult {
            title: result.title.unwrap_or_default(),
            link: result.link.unwrap_or_default(),
            snippet: result.snippet.unwrap_or_default(),
        })
        .collect()
}

/// Numbered plain-text rendering of results for the follow-up prompt.
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(index, result)| {
            format!(
                "{}. {}\n   {}\n   Link: {}",
                index + 1,
                result.title,
                result.snippet,
                result.link
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
