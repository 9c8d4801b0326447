use serde::{Deserialize, Serialize};

/// A Freshchat agent as returned by `GET /agents` and `GET /agents/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl AgentIdentity {
    /// `"<first> <last> posted:"`; absent names render empty.
    pub fn posted_label(&self) -> String {
        format!(
            "{} {} posted:",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
    }
}

/// A Freshchat end user (the customer side of a conversation).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ChatUser {
    /// `"Client <first> <last> <email> posted:"`, each present field followed by a space.
    pub fn posted_label(&self) -> String {
        let mut label = String::from("Client ");
        for field in [&self.first_name, &self.last_name, &self.email].into_iter().flatten() {
            label.push_str(field);
            label.push(' ');
        }
        label.push_str("posted:");
        label
    }
}

/// A Mattermost account as returned by `GET /users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChatUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}
