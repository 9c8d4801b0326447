use parley_core::{InboundMessageEvent, RelayError};
use serde::Deserialize;

/// Header carrying the base64 RSA signature of the raw body.
pub const SIGNATURE_HEADER: &str = "x-freshchat-signature";

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    message: InboundMessageEvent,
}

/// Extracts `data.message` from a verified webhook body.
pub fn parse_message_event(body: &[u8]) -> Result<InboundMessageEvent, RelayError> {
    serde_json::from_slice::<WebhookEnvelope>(body)
        .map(|envelope| envelope.data.message)
        .map_err(|error| RelayError::MalformedPayload(error.to_string()))
}
