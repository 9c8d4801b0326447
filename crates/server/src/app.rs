use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use parley_core::{FreshchatApi, IdentityMapping, MattermostApi, RelayError, SignatureVerifier};
use secrecy::SecretString;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::{health, relay};

/// Values both relays read on every request.
#[derive(Debug)]
pub struct RelaySettings {
    pub channel_id: String,
    pub slash_token: SecretString,
    pub command_trigger: String,
    pub app_id: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub freshchat: Arc<dyn FreshchatApi>,
    pub mattermost: Arc<dyn MattermostApi>,
    pub verifier: Arc<SignatureVerifier>,
    pub mapping: Arc<IdentityMapping>,
    pub settings: Arc<RelaySettings>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/freshchat", post(relay::inbound::freshchat_webhook))
        .route("/mattermost", post(relay::outbound::slash_command))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A relay failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub route: &'static str,
    pub correlation_id: String,
    pub error: RelayError,
}

impl ApiError {
    pub fn new(route: &'static str, correlation_id: &str, error: RelayError) -> Self {
        Self { route, correlation_id: correlation_id.to_owned(), error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.error.is_request_fault() {
            warn!(
                event_name = "relay.request.rejected",
                correlation_id = %self.correlation_id,
                route = self.route,
                status = status.as_u16(),
                error = %self.error,
                "request rejected"
            );
        } else {
            error!(
                event_name = "relay.request.failed",
                correlation_id = %self.correlation_id,
                route = self.route,
                status = status.as_u16(),
                error = %self.error,
                "request failed"
            );
        }

        (status, self.error.user_message()).into_response()
    }
}
