use parley_core::config::{AppConfig, LoadOptions};
use parley_core::{identity, IdentityMapping};
use parley_freshchat::HttpFreshchatClient;
use parley_mattermost::HttpMattermostClient;
use serde::Serialize;

use crate::commands::{
    CommandResult, EXIT_CHECK_FAILED, EXIT_CLIENT_SETUP, EXIT_CONFIG, EXIT_EMPTY_MAPPING,
};

const COMMAND: &str = "mapping";

#[derive(Debug, Serialize)]
struct MappingEntry<'a> {
    mattermost_username: &'a str,
    freshchat_agent_id: &'a str,
}

#[derive(Debug, Serialize)]
struct MappingReport<'a> {
    command: &'static str,
    status: &'static str,
    mapped_users: usize,
    entries: Vec<MappingEntry<'a>>,
}

/// Builds the mapping the server would build at startup, against the live APIs.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let freshchat = match HttpFreshchatClient::new(&config.freshchat) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "client_setup",
                error.to_string(),
                EXIT_CLIENT_SETUP,
            )
        }
    };
    let mattermost = match HttpMattermostClient::new(&config.mattermost) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "client_setup",
                error.to_string(),
                EXIT_CLIENT_SETUP,
            )
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_CLIENT_SETUP,
            )
        }
    };
    let mapping = runtime.block_on(identity::build(&freshchat, &mattermost));

    render(&mapping)
}

/// Entries are sorted by username. An empty mapping is reported as a failure
/// because the server would refuse every reply.
pub fn render(mapping: &IdentityMapping) -> CommandResult {
    if mapping.is_empty() {
        return CommandResult::failure(
            COMMAND,
            "empty_mapping",
            "no mattermost user shares an email with a freshchat agent; check both rosters and tokens",
            EXIT_EMPTY_MAPPING,
        );
    }

    let entries = mapping
        .entries()
        .into_iter()
        .map(|(mattermost_username, freshchat_agent_id)| MappingEntry {
            mattermost_username,
            freshchat_agent_id,
        })
        .collect();
    let report =
        MappingReport { command: COMMAND, status: "ok", mapped_users: mapping.len(), entries };

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult::with_output(0, output),
        Err(error) => {
            CommandResult::failure(COMMAND, "serialization", error.to_string(), EXIT_CHECK_FAILED)
        }
    }
}
