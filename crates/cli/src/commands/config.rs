use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use super::{load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let file_path = detect_config_path();
    let file_doc = load_config_file_doc(file_path.as_deref());
    let attribution = Attribution { file_doc: file_doc.as_ref(), file_path: file_path.as_deref() };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(attribution.line(
        "ledger.rpc_url",
        &config.ledger.rpc_url,
        &["DAPPAZON_LEDGER_RPC_URL", "BLOCKCHAIN_RPC_URL"],
    ));
    lines.push(attribution.line(
        "ledger.contract_address",
        &config.ledger.contract_address,
        &["DAPPAZON_LEDGER_CONTRACT_ADDRESS", "CONTRACT_ADDRESS"],
    ));
    lines.push(attribution.line(
        "ledger.item_count",
        &config.ledger.item_count.to_string(),
        &["DAPPAZON_LEDGER_ITEM_COUNT"],
    ));

    lines.push(attribution.line(
        "llm.api_key",
        &redact_secret(config.llm.api_key.as_ref()),
        &["DAPPAZON_LLM_API_KEY", "GROQ_API_KEY"],
    ));
    lines.push(attribution.line("llm.base_url", &config.llm.base_url, &["DAPPAZON_LLM_BASE_URL"]));
    lines.push(attribution.line(
        "llm.models",
        &config.llm.models.join(", "),
        &["DAPPAZON_LLM_MODELS"],
    ));
    lines.push(attribution.line(
        "llm.temperature",
        &config.llm.temperature.to_string(),
        &["DAPPAZON_LLM_TEMPERATURE"],
    ));
    lines.push(attribution.line(
        "llm.max_tokens",
        &config.llm.max_tokens.to_string(),
        &["DAPPAZON_LLM_MAX_TOKENS"],
    ));
    lines.push(attribution.line(
        "llm.follow_up_max_tokens",
        &config.llm.follow_up_max_tokens.to_string(),
        &["DAPPAZON_LLM_FOLLOW_UP_MAX_TOKENS"],
    ));

    lines.push(attribution.line(
        "search.api_key",
        &redact_secret(config.search.api_key.as_ref()),
        &["DAPPAZON_SEARCH_API_KEY", "SERPAPI_KEY"],
    ));
    lines.push(attribution.line(
        "search.max_results",
        &config.search.max_results.to_string(),
        &["DAPPAZON_SEARCH_MAX_RESULTS"],
    ));

    lines.push(attribution.line(
        "chat.history_window",
        &config.chat.history_window.to_string(),
        &["DAPPAZON_CHAT_HISTORY_WINDOW"],
    ));

    lines.push(attribution.line(
        "server.bind_address",
        &config.server.bind_address,
        &["DAPPAZON_SERVER_BIND_ADDRESS"],
    ));
    lines.push(attribution.line(
        "server.port",
        &config.server.port.to_string(),
        &["DAPPAZON_SERVER_PORT", "PORT"],
    ));

    lines.push(attribution.line(
        "logging.level",
        &config.logging.level,
        &["DAPPAZON_LOGGING_LEVEL", "DAPPAZON_LOG_LEVEL"],
    ));
    lines.push(attribution.line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        &["DAPPAZON_LOGGING_FORMAT", "DAPPAZON_LOG_FORMAT"],
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

struct Attribution<'a> {
    file_doc: Option<&'a Value>,
    file_path: Option<&'a Path>,
}

impl Attribution<'_> {
    fn line(&self, key_path: &str, value: &str, env_keys: &[&str]) -> String {
        format!("- {key_path} = {value} (source: {})", self.source(key_path, env_keys))
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.file_doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .file_path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn detect_config_path() -> Option<PathBuf> {
    ["dappazon.toml", "config/dappazon.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('_').or_else(|| trimmed.split_once('-')) {
        if prefix.len() <= 4 {
            return format!("{prefix}-***");
        }
    }

    "<redacted>".to_string()
}
