//! Mattermost side of the relay.
//!
//! - **Slash Commands** (`commands`) - `/freshchat <conversation id> [!!as:<user>] <text>`
//! - **Client** (`client`) - bot-token REST client implementing `MattermostApi`
//!
//! # Getting Started
//!
//! 1. Create a bot account and copy its access token (`mattermost.bot_token`)
//! 2. Add the bot to the support channel (`mattermost.channel_id`)
//! 3. Add a slash command pointing at `POST /mattermost` and copy its token
//!    (`mattermost.slash_token`)

pub mod client;
pub mod commands;

pub use client::{ClientError, HttpMattermostClient};
pub use commands::{parse_reply_command, usage, CommandParseError, Directive, SlashCommandPayload};
