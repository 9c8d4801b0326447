//! Mattermost username → Freshchat agent id mapping, joined on email.

use std::collections::HashMap;

use tracing::{error, info, warn};

use crate::domain::identity::{AgentIdentity, TeamChatUser};
use crate::platform::{FreshchatApi, MattermostApi};

/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityMapping {
    agents_by_username: HashMap<String, String>,
}

impl IdentityMapping {
    /// Joins on exact email equality. Empty emails never match. When one
    /// username matches several agents the last agent in roster order wins.
    pub fn from_rosters(users: &[TeamChatUser], agents: &[AgentIdentity]) -> Self {
        let mut usernames_by_email: HashMap<&str, Vec<&str>> = HashMap::new();
        for user in users {
            if let Some(email) = user.email.as_deref().filter(|email| !email.is_empty()) {
                usernames_by_email.entry(email).or_default().push(user.username.as_str());
            }
        }

        let mut agents_by_username = HashMap::new();
        for agent in agents {
            let Some(email) = agent.email.as_deref().filter(|email| !email.is_empty()) else {
                continue;
            };
            for username in usernames_by_email.get(email).into_iter().flatten() {
                agents_by_username.insert((*username).to_owned(), agent.id.clone());
            }
        }

        Self { agents_by_username }
    }

    pub fn agent_for(&self, username: &str) -> Option<&str> {
        self.agents_by_username.get(username).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.agents_by_username.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents_by_username.is_empty()
    }

    /// Sorted by username.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .agents_by_username
            .iter()
            .map(|(username, agent_id)| (username.as_str(), agent_id.as_str()))
            .collect();
        entries.sort_unstable();
        entries
    }
}

impl FromIterator<(String, String)> for IdentityMapping {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self { agents_by_username: iter.into_iter().collect() }
    }
}

/// Builds the mapping from live rosters. Roster failures are logged and
/// degrade to a partial (possibly empty) mapping instead of aborting startup.
pub async fn build(freshchat: &dyn FreshchatApi, mattermost: &dyn MattermostApi) -> IdentityMapping {
    let users = match mattermost.list_users().await {
        Ok(users) => users,
        Err(error) => {
            error!(
                event_name = "system.identity.mattermost_users_failed",
                correlation_id = "bootstrap",
                status = ?error.status(),
                error = %error,
                "when retrieving mattermost users"
            );
            Vec::new()
        }
    };

    let agents = fetch_agent_roster(freshchat).await;
    let mapping = IdentityMapping::from_rosters(&users, &agents);

    let unmatched = users.iter().filter(|user| mapping.agent_for(&user.username).is_none()).count();
    info!(
        event_name = "system.identity.built",
        correlation_id = "bootstrap",
        mapped = mapping.len(),
        mattermost_users = users.len(),
        freshchat_agents = agents.len(),
        unmatched_users = unmatched,
        "identity mapping built"
    );

    mapping
}

/// Re-fetches with an explicit page size when the first page is short of the
/// reported total.
async fn fetch_agent_roster(freshchat: &dyn FreshchatApi) -> Vec<AgentIdentity> {
    let first = match freshchat.list_agents(None).await {
        Ok(page) => page,
        Err(error) => {
            error!(
                event_name = "system.identity.freshchat_agents_failed",
                correlation_id = "bootstrap",
                status = ?error.status(),
                error = %error,
                "when retrieving freshchat agents"
            );
            return Vec::new();
        }
    };

    let Some(total) = first.total_items.filter(|total| *total != first.agents.len()) else {
        return first.agents;
    };

    match freshchat.list_agents(Some(total)).await {
        Ok(page) => page.agents,
        Err(error) => {
            warn!(
                event_name = "system.identity.freshchat_agents_paginated_failed",
                correlation_id = "bootstrap",
                status = ?error.status(),
                error = %error,
                requested = total,
                received = first.agents.len(),
                "when retrieving freshchat agents with pagination, keeping first page"
            );
            first.agents
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{build, IdentityMapping};
    use crate::domain::identity::{AgentIdentity, ChatUser, TeamChatUser};
    use crate::domain::message::{NewPost, OutboundMessage};
    use crate::errors::UpstreamError;
    use crate::platform::{AgentPage, FreshchatApi, MattermostApi};

    fn user(username: &str, email: Option<&str>) -> TeamChatUser {
        TeamChatUser {
            id: format!("id-{username}"),
            username: username.to_owned(),
            email: email.map(str::to_owned),
        }
    }

    fn agent(id: &str, email: Option<&str>) -> AgentIdentity {
        AgentIdentity {
            id: id.to_owned(),
            email: email.map(str::to_owned),
            first_name: None,
            last_name: None,
        }
    }

    #[test]
    fn joins_users_and_agents_on_email() {
        let mapping = IdentityMapping::from_rosters(
            &[user("bob", Some("b@x.com")), user("carol", Some("c@x.com"))],
            &[agent("A1", Some("b@x.com"))],
        );

        assert_eq!(mapping.agent_for("bob"), Some("A1"));
        assert_eq!(mapping.agent_for("carol"), None);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn email_match_is_case_sensitive() {
        let mapping = IdentityMapping::from_rosters(
            &[user("bob", Some("Bob@x.com"))],
            &[agent("A1", Some("bob@x.com"))],
        );

        assert!(mapping.is_empty());
    }

    #[test]
    fn empty_and_missing_emails_never_join() {
        let mapping = IdentityMapping::from_rosters(
            &[user("bot", Some("")), user("ghost", None)],
            &[agent("A1", Some("")), agent("A2", None)],
        );

        assert!(mapping.is_empty());
    }

    #[test]
    fn users_sharing_an_email_each_map_to_the_agent() {
        let mapping = IdentityMapping::from_rosters(
            &[user("bob", Some("b@x.com")), user("bob-alt", Some("b@x.com"))],
            &[agent("A1", Some("b@x.com"))],
        );

        assert_eq!(mapping.entries(), vec![("bob", "A1"), ("bob-alt", "A1")]);
    }

    #[test]
    fn last_agent_in_roster_order_wins_for_duplicate_emails() {
        let mapping = IdentityMapping::from_rosters(
            &[user("bob", Some("b@x.com"))],
            &[agent("A1", Some("b@x.com")), agent("A2", Some("b@x.com"))],
        );

        assert_eq!(mapping.agent_for("bob"), Some("A2"));
    }

    struct RosterFixture {
        users: Result<Vec<TeamChatUser>, UpstreamError>,
        first_page: Result<AgentPage, UpstreamError>,
        full_page: Result<AgentPage, UpstreamError>,
        page_requests: Mutex<Vec<Option<usize>>>,
    }

    impl RosterFixture {
        fn new(users: Vec<TeamChatUser>, first_page: AgentPage) -> Self {
            Self {
                users: Ok(users),
                first_page: Ok(first_page),
                full_page: Ok(AgentPage::default()),
                page_requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Option<usize>> {
            self.page_requests.lock().expect("lock").clone()
        }
    }

    fn unavailable(platform: &'static str) -> UpstreamError {
        UpstreamError::Status { platform, status: 503, body: "unavailable".to_owned() }
    }

    #[async_trait]
    impl FreshchatApi for RosterFixture {
        async fn get_user(&self, _user_id: &str) -> Result<ChatUser, UpstreamError> {
            unimplemented!("not used by the identity mapper")
        }

        async fn get_agent(&self, _agent_id: &str) -> Result<AgentIdentity, UpstreamError> {
            unimplemented!("not used by the identity mapper")
        }

        async fn list_agents(
            &self,
            items_per_page: Option<usize>,
        ) -> Result<AgentPage, UpstreamError> {
            self.page_requests.lock().expect("lock").push(items_per_page);
            match items_per_page {
                None => self.first_page.clone(),
                Some(_) => self.full_page.clone(),
            }
        }

        async fn create_message(
            &self,
            _conversation_id: &str,
            _message: &OutboundMessage,
        ) -> Result<(), UpstreamError> {
            unimplemented!("not used by the identity mapper")
        }
    }

    #[async_trait]
    impl MattermostApi for RosterFixture {
        async fn list_users(&self) -> Result<Vec<TeamChatUser>, UpstreamError> {
            self.users.clone()
        }

        async fn create_post(&self, _post: &NewPost) -> Result<(), UpstreamError> {
            unimplemented!("not used by the identity mapper")
        }
    }

    #[tokio::test]
    async fn build_uses_single_page_when_total_matches() {
        let fixture = RosterFixture::new(
            vec![user("bob", Some("b@x.com"))],
            AgentPage { agents: vec![agent("A1", Some("b@x.com"))], total_items: Some(1) },
        );

        let mapping = build(&fixture, &fixture).await;

        assert_eq!(mapping.agent_for("bob"), Some("A1"));
        assert_eq!(fixture.requests(), vec![None]);
    }

    #[tokio::test]
    async fn build_refetches_with_total_as_page_size() {
        let mut fixture = RosterFixture::new(
            vec![user("bob", Some("b@x.com")), user("dan", Some("d@x.com"))],
            AgentPage { agents: vec![agent("A1", Some("b@x.com"))], total_items: Some(2) },
        );
        fixture.full_page = Ok(AgentPage {
            agents: vec![agent("A1", Some("b@x.com")), agent("A2", Some("d@x.com"))],
            total_items: Some(2),
        });

        let mapping = build(&fixture, &fixture).await;

        assert_eq!(fixture.requests(), vec![None, Some(2)]);
        assert_eq!(mapping.entries(), vec![("bob", "A1"), ("dan", "A2")]);
    }

    #[tokio::test]
    async fn build_keeps_first_page_when_refetch_fails() {
        let mut fixture = RosterFixture::new(
            vec![user("bob", Some("b@x.com"))],
            AgentPage { agents: vec![agent("A1", Some("b@x.com"))], total_items: Some(40) },
        );
        fixture.full_page = Err(unavailable("freshchat"));

        let mapping = build(&fixture, &fixture).await;

        assert_eq!(mapping.agent_for("bob"), Some("A1"));
    }

    #[tokio::test]
    async fn build_degrades_to_empty_mapping_when_rosters_fail() {
        let mut fixture = RosterFixture::new(Vec::new(), AgentPage::default());
        fixture.users = Err(unavailable("mattermost"));
        fixture.first_page = Err(unavailable("freshchat"));

        let mapping = build(&fixture, &fixture).await;

        assert!(mapping.is_empty());
    }
}
