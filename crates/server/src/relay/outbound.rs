use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};
use parley_core::{OutboundMessage, RelayError};
use parley_mattermost::{parse_reply_command, usage, SlashCommandPayload};
use secrecy::ExposeSecret;
use tracing::info;

use crate::app::{ApiError, AppState};

const ROUTE: &str = "/mattermost";

/// `POST /mattermost`: the slash command a support agent types to reply.
///
/// Success is always 200; Mattermost shows any other 2xx as a failure.
pub async fn slash_command(
    State(state): State<AppState>,
    payload: Result<Form<SlashCommandPayload>, FormRejection>,
) -> Response {
    let correlation_id = super::correlation_id();
    let result = match payload {
        Ok(Form(payload)) => relay(&state, payload, &correlation_id).await,
        Err(rejection) => Err(RelayError::MalformedPayload(rejection.body_text())),
    };
    match result {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(error) => ApiError::new(ROUTE, &correlation_id, error).into_response(),
    }
}

async fn relay(
    state: &AppState,
    payload: SlashCommandPayload,
    correlation_id: &str,
) -> Result<(), RelayError> {
    let token = payload.token.ok_or(RelayError::AuthenticationMissing("token form field"))?;
    if token != state.settings.slash_token.expose_secret() {
        return Err(RelayError::AuthenticationInvalid("token form field"));
    }

    let user_name = payload
        .user_name
        .ok_or_else(|| RelayError::MalformedPayload("user_name form field is missing".to_owned()))?;
    let text = payload
        .text
        .ok_or_else(|| RelayError::MalformedPayload("text form field is missing".to_owned()))?;

    let command = parse_reply_command(&text, &user_name)
        .map_err(|_| RelayError::Syntax(usage(&state.settings.command_trigger)))?;

    let Some(agent_id) = state.mapping.agent_for(&command.user_name) else {
        return Err(RelayError::LookupMiss { user_name: command.user_name });
    };

    let message =
        OutboundMessage::from_agent(agent_id, command.body, state.settings.app_id.clone());
    state.freshchat.create_message(&command.conversation_id, &message).await?;

    info!(
        event_name = "relay.outbound.sent",
        correlation_id,
        conversation_id = %command.conversation_id,
        user_name = %command.user_name,
        impersonated = command.user_name != user_name,
        "mattermost reply relayed to freshchat"
    );
    Ok(())
}
