//! Freshchat side of the relay.
//!
//! - **Client** (`client`) - bearer-authenticated REST client implementing `FreshchatApi`
//! - **Webhook** (`webhook`) - typed parsing of signed `message_create` deliveries
//! - **Compose** (`compose`) - renders an inbound event as a Mattermost post

pub mod client;
pub mod compose;
pub mod webhook;

pub use client::{ClientError, HttpFreshchatClient};
pub use compose::{compose_post_message, resolve_actor_label, reply_instructions};
pub use webhook::{parse_message_event, SIGNATURE_HEADER};
