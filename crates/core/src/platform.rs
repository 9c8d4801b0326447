//! Seams to the two collaborator platforms.
//!
//! The HTTP implementations live in `parley-freshchat` and `parley-mattermost`;
//! the relays and the identity mapper only see these traits.

use async_trait::async_trait;

use crate::domain::identity::{AgentIdentity, ChatUser, TeamChatUser};
use crate::domain::message::{NewPost, OutboundMessage};
use crate::errors::UpstreamError;

/// One page of `GET /agents`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentPage {
    pub agents: Vec<AgentIdentity>,
    /// `pagination.total_items` as reported by Freshchat.
    pub total_items: Option<usize>,
}

#[async_trait]
pub trait FreshchatApi: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<ChatUser, UpstreamError>;

    async fn get_agent(&self, agent_id: &str) -> Result<AgentIdentity, UpstreamError>;

    async fn list_agents(&self, items_per_page: Option<usize>)
        -> Result<AgentPage, UpstreamError>;

    async fn create_message(
        &self,
        conversation_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), UpstreamError>;
}

#[async_trait]
pub trait MattermostApi: Send + Sync {
    async fn list_users(&self) -> Result<Vec<TeamChatUser>, UpstreamError>;

    /// Succeeds only when Mattermost answers `201 Created`.
    async fn create_post(&self, post: &NewPost) -> Result<(), UpstreamError>;
}
