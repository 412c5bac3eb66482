use dappazon_ledger::{read_snapshot, ContractCatalog, LedgerError};
use serde_json::json;

use super::{block_on, load_config, CommandResult, EXIT_LEDGER};

pub fn run() -> CommandResult {
    let config = match load_config("catalog") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let result = block_on("catalog", async {
        let catalog = ContractCatalog::new(&config.ledger)?;
        read_snapshot(&catalog, config.ledger.item_count).await
    });

    match result {
        Ok(Ok(snapshot)) => CommandResult::success(
            "catalog",
            format!(
                "read {} listed entries across {} categories",
                snapshot.len(),
                snapshot.categories().count()
            ),
            serde_json::to_value(&snapshot).ok().map(|snapshot| json!({ "snapshot": snapshot })),
        ),
        Ok(Err(error)) => CommandResult::failure(
            "catalog",
            ledger_error_class(&error),
            error.to_string(),
            EXIT_LEDGER,
        ),
        Err(failure) => failure,
    }
}

fn ledger_error_class(error: &LedgerError) -> &'static str {
    match error {
        LedgerError::Unavailable(_) => "ledger_unavailable",
        LedgerError::Transport(_) => "ledger_transport",
        LedgerError::Rpc { .. } => "ledger_rpc",
        LedgerError::Decode(_) => "ledger_decode",
    }
}
