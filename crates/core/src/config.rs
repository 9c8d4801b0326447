use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub freshchat: FreshchatConfig,
    pub mattermost: MattermostConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct FreshchatConfig {
    pub api_url: String,
    pub token: SecretString,
    /// PEM encoded RSA key used to verify `X-Freshchat-Signature`.
    pub public_key: String,
    pub app_id: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MattermostConfig {
    pub api_url: String,
    pub bot_token: SecretString,
    pub slash_token: SecretString,
    pub channel_id: String,
    /// Trigger word of the slash command, without the leading `/`.
    pub command_trigger: String,
    pub timeout_secs: u64,
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
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub freshchat_api_url: Option<String>,
    pub freshchat_token: Option<String>,
    pub freshchat_public_key: Option<String>,
    pub freshchat_app_id: Option<String>,
    pub mattermost_api_url: Option<String>,
    pub mattermost_bot_token: Option<String>,
    pub mattermost_slash_token: Option<String>,
    pub mattermost_channel_id: Option<String>,
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
            freshchat: FreshchatConfig {
                api_url: String::new(),
                token: String::new().into(),
                public_key: String::new(),
                app_id: None,
                timeout_secs: 30,
            },
            mattermost: MattermostConfig {
                api_url: String::new(),
                bot_token: String::new().into(),
                slash_token: String::new().into(),
                channel_id: String::new(),
                command_trigger: "freshchat".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("parley.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(freshchat) = patch.freshchat {
            if let Some(api_url) = freshchat.api_url {
                self.freshchat.api_url = api_url;
            }
            if let Some(freshchat_token_value) = freshchat.token {
                self.freshchat.token = secret_value(freshchat_token_value);
            }
            if let Some(public_key) = freshchat.public_key {
                self.freshchat.public_key = public_key;
            }
            if let Some(app_id) = freshchat.app_id {
                self.freshchat.app_id = Some(app_id);
            }
            if let Some(timeout_secs) = freshchat.timeout_secs {
                self.freshchat.timeout_secs = timeout_secs;
            }
        }

        if let Some(mattermost) = patch.mattermost {
            if let Some(api_url) = mattermost.api_url {
                self.mattermost.api_url = api_url;
            }
            if let Some(bot_token_value) = mattermost.bot_token {
                self.mattermost.bot_token = secret_value(bot_token_value);
            }
            if let Some(slash_token_value) = mattermost.slash_token {
                self.mattermost.slash_token = secret_value(slash_token_value);
            }
            if let Some(channel_id) = mattermost.channel_id {
                self.mattermost.channel_id = channel_id;
            }
            if let Some(command_trigger) = mattermost.command_trigger {
                self.mattermost.command_trigger = command_trigger;
            }
            if let Some(timeout_secs) = mattermost.timeout_secs {
                self.mattermost.timeout_secs = timeout_secs;
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
        if let Some(value) = read_env_any(&["PARLEY_FRESHCHAT_API_URL", "FRESHCHAT_API_URL"]) {
            self.freshchat.api_url = value;
        }
        if let Some(value) = read_env_any(&["PARLEY_FRESHCHAT_TOKEN", "FRESHCHAT_TOKEN"]) {
            self.freshchat.token = secret_value(value);
        }
        if let Some(value) =
            read_env_any(&["PARLEY_FRESHCHAT_PUBLIC_KEY", "FRESHCHAT_PUBLIC_KEY"])
        {
            self.freshchat.public_key = value;
        }
        if let Some(value) = read_env_any(&["PARLEY_FRESHCHAT_APP_ID", "FRESHCHAT_APP_ID"]) {
            self.freshchat.app_id = Some(value);
        }
        if let Some(value) = read_env("PARLEY_FRESHCHAT_TIMEOUT_SECS") {
            self.freshchat.timeout_secs = parse_u64("PARLEY_FRESHCHAT_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_any(&["PARLEY_MATTERMOST_API_URL", "MATTERMOST_API_URL"]) {
            self.mattermost.api_url = value;
        }
        if let Some(value) =
            read_env_any(&["PARLEY_MATTERMOST_BOT_TOKEN", "MATTERMOST_BOT_TOKEN"])
        {
            self.mattermost.bot_token = secret_value(value);
        }
        if let Some(value) =
            read_env_any(&["PARLEY_MATTERMOST_SLASH_TOKEN", "MATTERMOST_SLASH_TOKEN"])
        {
            self.mattermost.slash_token = secret_value(value);
        }
        if let Some(value) =
            read_env_any(&["PARLEY_MATTERMOST_CHANNEL_ID", "MATTERMOST_CHANNEL_ID"])
        {
            self.mattermost.channel_id = value;
        }
        if let Some(value) = read_env("PARLEY_MATTERMOST_COMMAND_TRIGGER") {
            self.mattermost.command_trigger = value;
        }
        if let Some(value) = read_env("PARLEY_MATTERMOST_TIMEOUT_SECS") {
            self.mattermost.timeout_secs = parse_u64("PARLEY_MATTERMOST_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PARLEY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PARLEY_SERVER_PORT") {
            self.server.port = parse_u16("PARLEY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PARLEY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("PARLEY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env_any(&["PARLEY_LOGGING_LEVEL", "PARLEY_LOG_LEVEL"]) {
            self.logging.level = value;
        }
        if let Some(value) = read_env_any(&["PARLEY_LOGGING_FORMAT", "PARLEY_LOG_FORMAT"]) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }

        if let Some(api_url) = overrides.freshchat_api_url {
            self.freshchat.api_url = api_url;
        }
        if let Some(token) = overrides.freshchat_token {
            self.freshchat.token = secret_value(token);
        }
        if let Some(public_key) = overrides.freshchat_public_key {
            self.freshchat.public_key = public_key;
        }
        if let Some(app_id) = overrides.freshchat_app_id {
            self.freshchat.app_id = Some(app_id);
        }

        if let Some(api_url) = overrides.mattermost_api_url {
            self.mattermost.api_url = api_url;
        }
        if let Some(bot_token) = overrides.mattermost_bot_token {
            self.mattermost.bot_token = secret_value(bot_token);
        }
        if let Some(slash_token) = overrides.mattermost_slash_token {
            self.mattermost.slash_token = secret_value(slash_token);
        }
        if let Some(channel_id) = overrides.mattermost_channel_id {
            self.mattermost.channel_id = channel_id;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_freshchat(&self.freshchat)?;
        validate_mattermost(&self.mattermost)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("parley.toml"), PathBuf::from("config/parley.toml")]
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

fn validate_freshchat(freshchat: &FreshchatConfig) -> Result<(), ConfigError> {
    validate_api_url("freshchat.api_url", &freshchat.api_url)?;

    if freshchat.token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "freshchat.token is required. Generate it under Freshchat > Admin > Configure > API Tokens"
                .to_string(),
        ));
    }

    let public_key = freshchat.public_key.trim();
    if public_key.is_empty() {
        return Err(ConfigError::Validation(
            "freshchat.public_key is required to verify webhook signatures".to_string(),
        ));
    }
    if !public_key.contains("PUBLIC KEY-----") {
        return Err(ConfigError::Validation(
            "freshchat.public_key must be a PEM encoded RSA public key".to_string(),
        ));
    }

    validate_timeout("freshchat.timeout_secs", freshchat.timeout_secs)
}

fn validate_mattermost(mattermost: &MattermostConfig) -> Result<(), ConfigError> {
    validate_api_url("mattermost.api_url", &mattermost.api_url)?;

    if mattermost.bot_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "mattermost.bot_token is required. Create a bot account under Integrations > Bot Accounts"
                .to_string(),
        ));
    }
    if mattermost.slash_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "mattermost.slash_token is required. Copy it from Integrations > Slash Commands"
                .to_string(),
        ));
    }
    if mattermost.channel_id.trim().is_empty() {
        return Err(ConfigError::Validation("mattermost.channel_id is required".to_string()));
    }

    let trigger = mattermost.command_trigger.trim();
    if trigger.is_empty() || trigger.starts_with('/') || trigger.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "mattermost.command_trigger must be a single word without a leading `/`".to_string(),
        ));
    }

    validate_timeout("mattermost.timeout_secs", mattermost.timeout_secs)
}

fn validate_api_url(key: &str, url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ConfigError::Validation(format!("{key} is required")));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_timeout(key: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=300")));
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

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// First non-empty value among `keys`, in order.
fn read_env_any(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| read_env(key))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
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

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    freshchat: Option<FreshchatPatch>,
    mattermost: Option<MattermostPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct FreshchatPatch {
    api_url: Option<String>,
    token: Option<String>,
    public_key: Option<String>,
    app_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MattermostPatch {
    api_url: Option<String>,
    bot_token: Option<String>,
    slash_token: Option<String>,
    channel_id: Option<String>,
    command_trigger: Option<String>,
    timeout_secs: Option<u64>,
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
