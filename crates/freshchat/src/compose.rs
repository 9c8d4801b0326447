use parley_core::{ActorType, FreshchatApi, InboundMessageEvent, UpstreamError};

/// Looks up who wrote the message and renders the `... posted:` header line.
pub async fn resolve_actor_label(
    api: &dyn FreshchatApi,
    event: &InboundMessageEvent,
) -> Result<String, UpstreamError> {
    match event.actor_type {
        ActorType::User => Ok(api.get_user(&event.actor_id).await?.posted_label()),
        ActorType::Agent => Ok(api.get_agent(&event.actor_id).await?.posted_label()),
    }
}

pub fn reply_instructions(command_trigger: &str, conversation_id: &str) -> String {
    format!("To respond, enter /{command_trigger} {conversation_id} [!!as:<user>] <text>.")
}

/// Header line, one line per text part in order, then the reply instructions.
pub fn compose_post_message(
    actor_label: &str,
    event: &InboundMessageEvent,
    command_trigger: &str,
) -> String {
    let mut message = format!("{actor_label}\n");
    for content in event.message_parts.iter().filter_map(|part| part.text_content()) {
        message.push_str(content);
        message.push('\n');
    }
    message.push_str(&reply_instructions(command_trigger, &event.conversation_id));
    message
}
