use std::sync::Arc;

use parley_core::config::{AppConfig, ConfigError};
use parley_core::{identity, PublicKeyError, SignatureVerifier};
use parley_freshchat::HttpFreshchatClient;
use parley_mattermost::HttpMattermostClient;
use thiserror::Error;
use tracing::info;

use crate::app::{AppState, RelaySettings};

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    PublicKey(#[from] PublicKeyError),
    #[error("freshchat client setup failed: {0}")]
    Freshchat(#[source] parley_freshchat::ClientError),
    #[error("mattermost client setup failed: {0}")]
    Mattermost(#[source] parley_mattermost::ClientError),
}

/// Builds the clients and verifier, then fetches both rosters once to build
/// the identity mapping. Roster failures degrade the mapping, not startup.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let verifier = SignatureVerifier::from_pem(&config.freshchat.public_key)?;
    let freshchat =
        HttpFreshchatClient::new(&config.freshchat).map_err(BootstrapError::Freshchat)?;
    let mattermost =
        HttpMattermostClient::new(&config.mattermost).map_err(BootstrapError::Mattermost)?;

    let mapping = identity::build(&freshchat, &mattermost).await;
    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        mapped_users = mapping.len(),
        "clients ready and identity mapping built"
    );

    let settings = RelaySettings {
        channel_id: config.mattermost.channel_id.clone(),
        slash_token: config.mattermost.slash_token.clone(),
        command_trigger: config.mattermost.command_trigger.clone(),
        app_id: config.freshchat.app_id.clone(),
    };
    let state = AppState {
        freshchat: Arc::new(freshchat),
        mattermost: Arc::new(mattermost),
        verifier: Arc::new(verifier),
        mapping: Arc::new(mapping),
        settings: Arc::new(settings),
    };

    Ok(Application { config, state })
}
