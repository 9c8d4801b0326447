use parley_core::OutboundCommand;
use serde::Deserialize;
use thiserror::Error;

/// Form fields Mattermost posts for a slash command. Everything is optional
/// on the wire; the relay decides which absences are fatal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub trigger_id: Option<String>,
}

/// A `!!`-prefixed token. Only `!!as:` has an effect; the rest of the
/// namespace is reserved and simply dropped from the message body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    As(String),
    Reserved(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("expected a conversation id followed by a message")]
    MissingMessage,
}

pub fn usage(command_trigger: &str) -> String {
    format!("Bad command syntax. Usage: /{command_trigger} <conversation id> [!!as:<user>] <text>")
}

/// `<conversation id> <word>...`, where any word may be a `!!` directive.
/// Words are split on single spaces and rejoined with single spaces.
pub fn parse_reply_command(
    text: &str,
    fallback_user_name: &str,
) -> Result<OutboundCommand, CommandParseError> {
    let mut tokens = text.trim().split(' ').filter(|token| !token.is_empty());
    let conversation_id = tokens.next().ok_or(CommandParseError::MissingMessage)?;

    let mut words = Vec::new();
    let mut user_override = None::<String>;
    let mut token_count = 1;
    for token in tokens {
        token_count += 1;
        match parse_directive(token) {
            Some(Directive::As(name)) => {
                if user_override.is_none() {
                    user_override = Some(name);
                }
            }
            Some(Directive::Reserved(_)) => {}
            None => words.push(token),
        }
    }

    if token_count < 2 {
        return Err(CommandParseError::MissingMessage);
    }

    Ok(OutboundCommand {
        conversation_id: conversation_id.to_owned(),
        body: words.join(" "),
        user_name: user_override.unwrap_or_else(|| fallback_user_name.to_owned()),
    })
}

fn parse_directive(token: &str) -> Option<Directive> {
    let directive = token.strip_prefix("!!")?;
    match directive.strip_prefix("as:") {
        Some(name) if !name.is_empty() => Some(Directive::As(name.to_owned())),
        _ => Some(Directive::Reserved(directive.to_owned())),
    }
}
