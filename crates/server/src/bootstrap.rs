use std::sync::Arc;

use dappazon_agent::{
    AgentRuntime, ChatCompletionsClient, CompletionError, RuntimeSettings, SearchError,
    SerpApiClient,
};
use dappazon_core::config::{AppConfig, ConfigError};
use dappazon_ledger::{CatalogSource, ContractCatalog, LedgerError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub catalog: Arc<dyn CatalogSource>,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("ledger client setup failed: {0}")]
    Ledger(#[source] LedgerError),
    #[error("completion client setup failed: {0}")]
    Completion(#[source] CompletionError),
    #[error("search client setup failed: {0}")]
    Search(#[source] SearchError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let catalog: Arc<dyn CatalogSource> =
        Arc::new(ContractCatalog::new(&config.ledger).map_err(BootstrapError::Ledger)?);
    let llm =
        Arc::new(ChatCompletionsClient::new(&config.llm).map_err(BootstrapError::Completion)?);
    let search = Arc::new(SerpApiClient::new(&config.search).map_err(BootstrapError::Search)?);

    info!(
        event_name = "system.bootstrap.collaborators_ready",
        correlation_id = "bootstrap",
        rpc_url = %config.ledger.rpc_url,
        model_count = config.llm.models.len(),
        search_enabled = search.is_configured(),
        "ledger, completion and search clients constructed"
    );

    let agent_runtime = Arc::new(AgentRuntime::new(
        llm,
        catalog.clone(),
        search,
        RuntimeSettings::from_config(&config),
    ));

    Ok(Application { config, catalog, agent_runtime })
}

#[cfg(test)]
mod tests {
    use dappazon_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?)
    }

    #[test]
    fn bootstrap_fails_fast_without_completion_api_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_api_key: Some("   ".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("error").to_string();
        assert!(message.contains("llm.api_key"), "unexpected error: {message}");
    }

    #[test]
    fn bootstrap_wires_runtime_with_valid_overrides() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_api_key: Some("gsk-test".to_string()),
                llm_models: Some(vec!["model-a".to_string()]),
                server_port: Some(3999),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("bootstrap should succeed with valid overrides");

        assert_eq!(app.config.server.port, 3999);
        assert_eq!(app.config.llm.models, vec!["model-a".to_string()]);
    }
}
