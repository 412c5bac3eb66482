use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MODELS: [&str; 4] =
    ["llama-3.3-70b-versatile", "llama-3.1-8b-instant", "gemma2-9b-it", "mixtral-8x7b-32768"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub ledger: LedgerConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub chat: ChatConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub item_count: u64,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub follow_up_max_tokens: u32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub engine: String,
    pub language: String,
    pub max_results: usize,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub history_window: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub ledger_rpc_url: Option<String>,
    pub ledger_item_count: Option<u64>,
    pub llm_api_key: Option<String>,
    pub llm_models: Option<Vec<String>>,
    pub search_api_key: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig {
                rpc_url: "http://127.0.0.1:8545".to_string(),
                contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
                item_count: 14,
                timeout_secs: 10,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.groq.com/openai/v1".to_string(),
                models: DEFAULT_MODELS.iter().map(|model| model.to_string()).collect(),
                temperature: 0.7,
                max_tokens: 500,
                follow_up_max_tokens: 600,
                top_p: 1.0,
                timeout_secs: 60,
            },
            search: SearchConfig {
                api_key: None,
                base_url: "https://serpapi.com/search".to_string(),
                engine: "google".to_string(),
                language: "vi".to_string(),
                max_results: 5,
                timeout_secs: 15,
            },
            chat: ChatConfig { history_window: 20 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3001,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dappazon.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn search_enabled(&self) -> bool {
        self.search
            .api_key
            .as_ref()
            .map(|key| !key.expose_secret().trim().is_empty())
            .unwrap_or(false)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(ledger) = patch.ledger {
            if let Some(rpc_url) = ledger.rpc_url {
                self.ledger.rpc_url = rpc_url;
            }
            if let Some(contract_address) = ledger.contract_address {
                self.ledger.contract_address = contract_address;
            }
            if let Some(item_count) = ledger.item_count {
                self.ledger.item_count = item_count;
            }
            if let Some(timeout_secs) = ledger.timeout_secs {
                self.ledger.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(models) = llm.models {
                self.llm.models = models;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(max_tokens) = llm.max_tokens {
                self.llm.max_tokens = max_tokens;
            }
            if let Some(follow_up_max_tokens) = llm.follow_up_max_tokens {
                self.llm.follow_up_max_tokens = follow_up_max_tokens;
            }
            if let Some(top_p) = llm.top_p {
                self.llm.top_p = top_p;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(search) = patch.search {
            if let Some(search_api_key_value) = search.api_key {
                self.search.api_key = Some(secret_value(search_api_key_value));
            }
            if let Some(base_url) = search.base_url {
                self.search.base_url = base_url;
            }
            if let Some(engine) = search.engine {
                self.search.engine = engine;
            }
            if let Some(language) = search.language {
                self.search.language = language;
            }
            if let Some(max_results) = search.max_results {
                self.search.max_results = max_results;
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(history_window) = chat.history_window {
                self.chat.history_window = history_window;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let rpc_url =
            read_env("DAPPAZON_LEDGER_RPC_URL").or_else(|| read_env("BLOCKCHAIN_RPC_URL"));
        if let Some(value) = rpc_url {
            self.ledger.rpc_url = value;
        }
        let contract_address = read_env("DAPPAZON_LEDGER_CONTRACT_ADDRESS")
            .or_else(|| read_env("CONTRACT_ADDRESS"));
        if let Some(value) = contract_address {
            self.ledger.contract_address = value;
        }
        if let Some(value) = read_env("DAPPAZON_LEDGER_ITEM_COUNT") {
            self.ledger.item_count = parse_u64("DAPPAZON_LEDGER_ITEM_COUNT", &value)?;
        }
        if let Some(value) = read_env("DAPPAZON_LEDGER_TIMEOUT_SECS") {
            self.ledger.timeout_secs = parse_u64("DAPPAZON_LEDGER_TIMEOUT_SECS", &value)?;
        }

        let llm_api_key = read_env("DAPPAZON_LLM_API_KEY").or_else(|| read_env("GROQ_API_KEY"));
        if let Some(value) = llm_api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DAPPAZON_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("DAPPAZON_LLM_MODELS") {
            self.llm.models = parse_list(&value);
        }
        if let Some(value) = read_env("DAPPAZON_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("DAPPAZON_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("DAPPAZON_LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_u32("DAPPAZON_LLM_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("DAPPAZON_LLM_FOLLOW_UP_MAX_TOKENS") {
            self.llm.follow_up_max_tokens =
                parse_u32("DAPPAZON_LLM_FOLLOW_UP_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("DAPPAZON_LLM_TOP_P") {
            self.llm.top_p = parse_f32("DAPPAZON_LLM_TOP_P", &value)?;
        }
        if let Some(value) = read_env("DAPPAZON_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("DAPPAZON_LLM_TIMEOUT_SECS", &value)?;
        }

        let search_api_key =
            read_env("DAPPAZON_SEARCH_API_KEY").or_else(|| read_env("SERPAPI_KEY"));
        if let Some(value) = search_api_key {
            self.search.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DAPPAZON_SEARCH_BASE_URL") {
            self.search.base_url = value;
        }
        if let Some(value) = read_env("DAPPAZON_SEARCH_ENGINE") {
            self.search.engine = value;
        }
        if let Some(value) = read_env("DAPPAZON_SEARCH_LANGUAGE") {
            self.search.language = value;
        }
        if let Some(value) = read_env("DAPPAZON_SEARCH_MAX_RESULTS") {
            self.search.max_results = parse_usize("DAPPAZON_SEARCH_MAX_RESULTS", &value)?;
        }
        if let Some(value) = read_env("DAPPAZON_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_u64("DAPPAZON_SEARCH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DAPPAZON_CHAT_HISTORY_WINDOW") {
            self.chat.history_window = parse_usize("DAPPAZON_CHAT_HISTORY_WINDOW", &value)?;
        }

        if let Some(value) = read_env("DAPPAZON_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        let port = read_env("DAPPAZON_SERVER_PORT")
            .map(|value| ("DAPPAZON_SERVER_PORT", value))
            .or_else(|| read_env("PORT").map(|value| ("PORT", value)));
        if let Some((key, value)) = port {
            self.server.port = parse_u16(key, &value)?;
        }
        if let Some(value) = read_env("DAPPAZON_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("DAPPAZON_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("DAPPAZON_LOGGING_LEVEL").or_else(|| read_env("DAPPAZON_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DAPPAZON_LOGGING_FORMAT").or_else(|| read_env("DAPPAZON_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(rpc_url) = overrides.ledger_rpc_url {
            self.ledger.rpc_url = rpc_url;
        }
        if let Some(item_count) = overrides.ledger_item_count {
            self.ledger.item_count = item_count;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(models) = overrides.llm_models {
            self.llm.models = models;
        }
        if let Some(search_api_key) = overrides.search_api_key {
            self.search.api_key = Some(secret_value(search_api_key));
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ledger(&self.ledger)?;
        validate_llm(&self.llm)?;
        validate_search(&self.search)?;
        validate_chat(&self.chat)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("dappazon.toml"), PathBuf::from("config/dappazon.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_ledger(ledger: &LedgerConfig) -> Result<(), ConfigError> {
    if !is_http_url(&ledger.rpc_url) {
        return Err(ConfigError::Validation(
            "ledger.rpc_url must start with http:// or https://".to_string(),
        ));
    }

    let address = ledger.contract_address.trim();
    let hex_digits = address.strip_prefix("0x").unwrap_or_default();
    if hex_digits.len() != 40 || !hex_digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(ConfigError::Validation(
            "ledger.contract_address must be `0x` followed by 40 hex digits".to_string(),
        ));
    }

    if ledger.timeout_secs == 0 || ledger.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "ledger.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    let missing =
        llm.api_key.as_ref().map(|value| value.expose_secret().trim().is_empty()).unwrap_or(true);
    if missing {
        return Err(ConfigError::Validation(
            "llm.api_key is required. Set DAPPAZON_LLM_API_KEY or GROQ_API_KEY".to_string(),
        ));
    }

    if !is_http_url(&llm.base_url) {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.models.is_empty() {
        return Err(ConfigError::Validation(
            "llm.models must list at least one model identifier".to_string(),
        ));
    }
    if llm.models.iter().any(|model| model.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "llm.models must not contain blank model identifiers".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&llm.top_p) || llm.top_p == 0.0 {
        return Err(ConfigError::Validation("llm.top_p must be in range (0.0, 1.0]".to_string()));
    }
    if llm.max_tokens == 0 || llm.follow_up_max_tokens == 0 {
        return Err(ConfigError::Validation(
            "llm.max_tokens and llm.follow_up_max_tokens must be greater than zero".to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if !is_http_url(&search.base_url) {
        return Err(ConfigError::Validation(
            "search.base_url must start with http:// or https://".to_string(),
        ));
    }

    if search.max_results == 0 || search.max_results > 5 {
        return Err(ConfigError::Validation(
            "search.max_results must be in range 1..=5".to_string(),
        ));
    }

    if search.timeout_secs == 0 || search.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "search.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_chat(chat: &ChatConfig) -> Result<(), ConfigError> {
    if chat.history_window == 0 {
        return Err(ConfigError::Validation(
            "chat.history_window must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_list(value: &str) -> Vec<String> {
    value.split(',').map(|item| item.trim().to_string()).filter(|item| !item.is_empty()).collect()
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    ledger: Option<LedgerPatch>,
    llm: Option<LlmPatch>,
    search: Option<SearchPatch>,
    chat: Option<ChatPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LedgerPatch {
    rpc_url: Option<String>,
    contract_address: Option<String>,
    item_count: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    models: Option<Vec<String>>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    follow_up_max_tokens: Option<u32>,
    top_p: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    engine: Option<String>,
    language: Option<String>,
    max_results: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    history_window: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
