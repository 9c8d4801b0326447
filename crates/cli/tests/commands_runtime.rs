use std::env;
use std::sync::{Mutex, OnceLock};

use parley_cli::commands::{config, doctor, mapping};
use rsa::pkcs1::{EncodeRsaPublicKey, LineEnding};
use rsa::RsaPrivateKey;
use serde_json::Value;

const ENV_KEYS: &[&str] = &[
    "PARLEY_FRESHCHAT_API_URL",
    "PARLEY_FRESHCHAT_TOKEN",
    "PARLEY_FRESHCHAT_PUBLIC_KEY",
    "PARLEY_FRESHCHAT_APP_ID",
    "PARLEY_FRESHCHAT_TIMEOUT_SECS",
    "PARLEY_MATTERMOST_API_URL",
    "PARLEY_MATTERMOST_BOT_TOKEN",
    "PARLEY_MATTERMOST_SLASH_TOKEN",
    "PARLEY_MATTERMOST_CHANNEL_ID",
    "PARLEY_MATTERMOST_COMMAND_TRIGGER",
    "PARLEY_MATTERMOST_TIMEOUT_SECS",
    "PARLEY_SERVER_BIND_ADDRESS",
    "PARLEY_SERVER_PORT",
    "PARLEY_SERVER_GRACEFUL_SHUTDOWN_SECS",
    "PARLEY_LOGGING_LEVEL",
    "PARLEY_LOGGING_FORMAT",
    "PARLEY_LOG_LEVEL",
    "PARLEY_LOG_FORMAT",
    "FRESHCHAT_API_URL",
    "FRESHCHAT_TOKEN",
    "FRESHCHAT_PUBLIC_KEY",
    "FRESHCHAT_APP_ID",
    "MATTERMOST_API_URL",
    "MATTERMOST_BOT_TOKEN",
    "MATTERMOST_SLASH_TOKEN",
    "MATTERMOST_CHANNEL_ID",
];

const NO_ENV: &[(&str, &str)] = &[];

#[test]
fn config_returns_failure_without_required_env() {
    with_env(NO_ENV, || {
        let result = config::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_attributes_sources_and_redacts_secrets() {
    let pem = public_key_pem();
    with_env(&valid_env(&pem), || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let output = &result.output;
        assert!(output.contains(
            "- mattermost.bot_token = <redacted> (source: env (MATTERMOST_BOT_TOKEN))"
        ));
        assert!(output
            .contains("- freshchat.token = eyJh*** (source: env (PARLEY_FRESHCHAT_TOKEN))"));
        assert!(output.contains("- mattermost.command_trigger = freshchat (source: default)"));
        assert!(output.contains("- server.port = 8080 (source: default)"));
        assert!(!output.contains("slash-secret"));
        assert!(!output.contains("mm-bot"));
    });
}

#[test]
fn doctor_passes_with_valid_env_and_signing_key() {
    let pem = public_key_pem();
    with_env(&valid_env(&pem), || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][1]["name"], "signing_key");
        assert_eq!(payload["checks"][1]["status"], "pass");
    });
}

#[test]
fn doctor_flags_an_unparseable_signing_key() {
    let garbage = "-----BEGIN RSA PUBLIC KEY-----\nAAAA\n-----END RSA PUBLIC KEY-----";
    with_env(&valid_env(garbage), || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "pass");
        assert_eq!(payload["checks"][1]["status"], "fail");
    });
}

#[test]
fn doctor_skips_key_check_when_config_fails() {
    with_env(NO_ENV, || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation:"));
        assert!(result.output.contains("- [skip] signing_key:"));
    });
}

#[test]
fn mapping_reports_config_failure_as_json() {
    with_env(NO_ENV, || {
        let result = mapping::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "mapping");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn mapping_against_unreachable_platforms_is_empty() {
    let pem = public_key_pem();
    let mut vars = valid_env(&pem);
    vars.push(("PARLEY_FRESHCHAT_TIMEOUT_SECS", "2".to_string()));
    vars.push(("PARLEY_MATTERMOST_TIMEOUT_SECS", "2".to_string()));
    with_env(&vars, || {
        let result = mapping::run();
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "empty_mapping");
    });
}

fn valid_env(public_key: &str) -> Vec<(&'static str, String)> {
    vec![
        // Nothing listens on the discard port.
        ("PARLEY_FRESHCHAT_API_URL", "http://127.0.0.1:9/v2".to_string()),
        ("PARLEY_FRESHCHAT_TOKEN", "eyJhbGciOiJSUzI1NiJ9.fresh".to_string()),
        ("PARLEY_FRESHCHAT_PUBLIC_KEY", public_key.to_string()),
        ("MATTERMOST_API_URL", "http://127.0.0.1:9/api/v4".to_string()),
        ("MATTERMOST_BOT_TOKEN", "mm-bot".to_string()),
        ("PARLEY_MATTERMOST_SLASH_TOKEN", "slash-secret".to_string()),
        ("PARLEY_MATTERMOST_CHANNEL_ID", "support".to_string()),
    ]
}

fn public_key_pem() -> String {
    RsaPrivateKey::new(&mut rand::thread_rng(), 1024)
        .expect("generate key")
        .to_public_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("encode key")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env<V: AsRef<str>>(vars: &[(&str, V)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let previous_values: Vec<(&str, Option<String>)> =
        ENV_KEYS.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in ENV_KEYS {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value.as_ref());
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
