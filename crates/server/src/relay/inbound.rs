use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use parley_core::{NewPost, RelayError};
use parley_freshchat::{
    compose_post_message, parse_message_event, resolve_actor_label, SIGNATURE_HEADER,
};
use tracing::info;

use crate::app::{ApiError, AppState};

const ROUTE: &str = "/freshchat";

/// `POST /freshchat`: a signed Freshchat `message_create` webhook.
pub async fn freshchat_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = super::correlation_id();
    match relay(&state, &headers, &body, &correlation_id).await {
        Ok(()) => (StatusCode::CREATED, "ok").into_response(),
        Err(error) => ApiError::new(ROUTE, &correlation_id, error).into_response(),
    }
}

async fn relay(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    correlation_id: &str,
) -> Result<(), RelayError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .ok_or(RelayError::AuthenticationMissing("x-freshchat-signature header"))?;
    let signature = signature
        .to_str()
        .map_err(|_| RelayError::AuthenticationInvalid("x-freshchat-signature header"))?;
    if !state.verifier.verify(body, signature) {
        return Err(RelayError::AuthenticationInvalid("x-freshchat-signature header"));
    }

    let event = parse_message_event(body)?;
    let label = resolve_actor_label(state.freshchat.as_ref(), &event).await?;
    let message = compose_post_message(&label, &event, &state.settings.command_trigger);

    state
        .mattermost
        .create_post(&NewPost { channel_id: state.settings.channel_id.clone(), message })
        .await?;

    info!(
        event_name = "relay.inbound.posted",
        correlation_id,
        conversation_id = %event.conversation_id,
        actor_id = %event.actor_id,
        parts = event.message_parts.len(),
        "freshchat message relayed to mattermost"
    );
    Ok(())
}
