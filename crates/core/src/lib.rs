//! Core of the Freshchat ⇄ Mattermost relay: configuration, error taxonomy,
//! domain records, platform seams, the identity mapping and webhook
//! signature verification.

pub mod config;
pub mod domain;
pub mod errors;
pub mod identity;
pub mod platform;
pub mod signature;

pub use domain::identity::{AgentIdentity, ChatUser, TeamChatUser};
pub use domain::message::{
    ActorType, InboundMessageEvent, MessagePart, NewPost, OutboundCommand, OutboundMessage,
};
pub use errors::{RelayError, UpstreamError};
pub use identity::IdentityMapping;
pub use platform::{AgentPage, FreshchatApi, MattermostApi};
pub use signature::{PublicKeyError, SignatureVerifier};
