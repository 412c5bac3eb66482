use std::sync::Arc;

use anyhow::{Context, Result};
use dappazon_agent::{
    AgentRuntime, ChatCompletionsClient, ChatRequest, RuntimeSettings, SerpApiClient,
};
use dappazon_core::config::{AppConfig, LogFormat};
use dappazon_ledger::ContractCatalog;

use super::{block_on, load_config, CommandResult, EXIT_RUNTIME, EXIT_TURN};

pub fn run(message: &str) -> CommandResult {
    let config = match load_config("ask") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    init_logging(&config);

    let runtime = match build_runtime(&config) {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure("ask", "client_setup", format!("{error:#}"), EXIT_RUNTIME)
        }
    };

    let request = ChatRequest::new(message, Vec::new());
    let outcome = match block_on("ask", runtime.handle_turn(&request, "cli-ask")) {
        Ok(outcome) => outcome,
        Err(failure) => return failure,
    };

    match outcome {
        Ok(result) => CommandResult::success(
            "ask",
            format!("answered by `{}`", result.model_used),
            serde_json::to_value(&result).ok(),
        ),
        Err(error) => {
            CommandResult::failure("ask", error.error_class(), error.to_string(), EXIT_TURN)
        }
    }
}

fn build_runtime(config: &AppConfig) -> Result<AgentRuntime> {
    let catalog =
        ContractCatalog::new(&config.ledger).context("failed to build ledger client")?;
    let llm = ChatCompletionsClient::new(&config.llm).context("failed to build completion client")?;
    let search = SerpApiClient::new(&config.search).context("failed to build search client")?;

    Ok(AgentRuntime::new(
        Arc::new(llm),
        Arc::new(catalog),
        Arc::new(search),
        RuntimeSettings::from_config(config),
    ))
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::filter::LevelFilter;

    let level = config.logging.level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
