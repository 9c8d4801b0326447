use serde::{Deserialize, Serialize};

/// Who authored an inbound Freshchat message. Anything other than `"user"` is an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ActorType {
    User,
    Agent,
}

impl From<String> for ActorType {
    fn from(value: String) -> Self {
        if value == "user" {
            Self::User
        } else {
            Self::Agent
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub content: Option<String>,
}

/// One element of `message_parts`. Only text parts are relayed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

impl MessagePart {
    pub fn text(content: impl Into<String>) -> Self {
        Self { text: Some(TextContent { content: Some(content.into()) }) }
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text.as_ref().and_then(|text| text.content.as_deref())
    }
}

/// The `data.message` object of a Freshchat `message_create` webhook.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InboundMessageEvent {
    pub conversation_id: String,
    pub actor_type: ActorType,
    pub actor_id: String,
    #[serde(default)]
    pub message_parts: Vec<MessagePart>,
}

/// A parsed slash command, ready to be relayed to Freshchat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundCommand {
    pub conversation_id: String,
    pub body: String,
    pub user_name: String,
}

/// Body of `POST /conversations/{id}/messages`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub message_parts: Vec<MessagePart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    pub message_type: &'static str,
    pub actor_type: &'static str,
    pub actor_id: String,
}

impl OutboundMessage {
    pub fn from_agent(
        actor_id: impl Into<String>,
        content: impl Into<String>,
        app_id: Option<String>,
    ) -> Self {
        Self {
            message_parts: vec![MessagePart::text(content)],
            app_id,
            message_type: "normal",
            actor_type: "agent",
            actor_id: actor_id.into(),
        }
    }
}

/// Body of Mattermost `POST /posts`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub channel_id: String,
    pub message: String,
}
