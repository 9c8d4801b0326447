use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use parley_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

/// One rendered setting: dotted key, display value, env names in lookup order.
struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => CommandResult::with_output(0, render(&config)),
        Err(error) => {
            CommandResult::failure("config", "config_validation", error.to_string(), EXIT_CONFIG)
        }
    }
}

pub fn render(config: &AppConfig) -> String {
    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }
    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let freshchat = &config.freshchat;
    let mattermost = &config.mattermost;
    vec![
        Field {
            key: "freshchat.api_url",
            value: freshchat.api_url.clone(),
            env_keys: &["PARLEY_FRESHCHAT_API_URL", "FRESHCHAT_API_URL"],
        },
        Field {
            key: "freshchat.token",
            value: redact_secret(&freshchat.token),
            env_keys: &["PARLEY_FRESHCHAT_TOKEN", "FRESHCHAT_TOKEN"],
        },
        Field {
            key: "freshchat.public_key",
            value: describe_public_key(&freshchat.public_key),
            env_keys: &["PARLEY_FRESHCHAT_PUBLIC_KEY", "FRESHCHAT_PUBLIC_KEY"],
        },
        Field {
            key: "freshchat.app_id",
            value: freshchat.app_id.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["PARLEY_FRESHCHAT_APP_ID", "FRESHCHAT_APP_ID"],
        },
        Field {
            key: "freshchat.timeout_secs",
            value: freshchat.timeout_secs.to_string(),
            env_keys: &["PARLEY_FRESHCHAT_TIMEOUT_SECS"],
        },
        Field {
            key: "mattermost.api_url",
            value: mattermost.api_url.clone(),
            env_keys: &["PARLEY_MATTERMOST_API_URL", "MATTERMOST_API_URL"],
        },
        Field {
            key: "mattermost.bot_token",
            value: redact_secret(&mattermost.bot_token),
            env_keys: &["PARLEY_MATTERMOST_BOT_TOKEN", "MATTERMOST_BOT_TOKEN"],
        },
        Field {
            key: "mattermost.slash_token",
            value: redact_secret(&mattermost.slash_token),
            env_keys: &["PARLEY_MATTERMOST_SLASH_TOKEN", "MATTERMOST_SLASH_TOKEN"],
        },
        Field {
            key: "mattermost.channel_id",
            value: mattermost.channel_id.clone(),
            env_keys: &["PARLEY_MATTERMOST_CHANNEL_ID", "MATTERMOST_CHANNEL_ID"],
        },
        Field {
            key: "mattermost.command_trigger",
            value: mattermost.command_trigger.clone(),
            env_keys: &["PARLEY_MATTERMOST_COMMAND_TRIGGER"],
        },
        Field {
            key: "mattermost.timeout_secs",
            value: mattermost.timeout_secs.to_string(),
            env_keys: &["PARLEY_MATTERMOST_TIMEOUT_SECS"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["PARLEY_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["PARLEY_SERVER_PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["PARLEY_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["PARLEY_LOGGING_LEVEL", "PARLEY_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["PARLEY_LOGGING_FORMAT", "PARLEY_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    ["parley.toml", "config/parley.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys
        .iter()
        .find(|env_key| env::var(env_key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
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

fn redact_secret(secret: &SecretString) -> String {
    redact_token(secret.expose_secret())
}

/// Keeps at most the first four characters of long tokens.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if trimmed.chars().count() >= 12 {
        let prefix: String = trimmed.chars().take(4).collect();
        return format!("{prefix}***");
    }

    "<redacted>".to_string()
}

fn describe_public_key(pem: &str) -> String {
    let label = pem
        .lines()
        .find_map(|line| line.trim().strip_prefix("-----BEGIN ")?.strip_suffix("-----"))
        .unwrap_or("unrecognized");
    format!("<{label}, {} bytes>", pem.len())
}
