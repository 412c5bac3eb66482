use std::sync::Arc;

use dappazon_agent::{PromptComposer, PromptSource};
use dappazon_ledger::{CatalogSource, ContractCatalog};

use super::{block_on, load_config, CommandResult, EXIT_LEDGER};

/// Prints the composed prompt as plain text, preceded by a one-line header
/// naming where it came from.
pub fn run() -> CommandResult {
    let config = match load_config("prompt") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let catalog: Arc<dyn CatalogSource> = match ContractCatalog::new(&config.ledger) {
        Ok(catalog) => Arc::new(catalog),
        Err(error) => {
            return CommandResult::failure(
                "prompt",
                "ledger_client",
                error.to_string(),
                EXIT_LEDGER,
            )
        }
    };
    let composer = PromptComposer::new(catalog, config.ledger.item_count);

    match block_on("prompt", composer.compose("cli-prompt")) {
        Ok(prompt) => {
            let source = match prompt.source {
                PromptSource::Live => "live",
                PromptSource::Fallback => "fallback",
            };
            CommandResult { exit_code: 0, output: format!("# source: {source}\n\n{}", prompt.text) }
        }
        Err(failure) => failure,
    }
}
