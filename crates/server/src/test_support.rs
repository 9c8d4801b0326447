//! Recording platform fakes and a throwaway signing key for handler tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, OnceLock,
};

use async_trait::async_trait;
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use parley_core::{
    AgentIdentity, AgentPage, ChatUser, FreshchatApi, IdentityMapping, MattermostApi, NewPost,
    OutboundMessage, SignatureVerifier, TeamChatUser, UpstreamError,
};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};

use crate::app::{router, AppState, RelaySettings};

pub const SLASH_TOKEN: &str = "slash-secret";

fn signing_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("generate key"))
}

pub fn sign(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    STANDARD.encode(signing_key().sign(Pkcs1v15Sign::new::<Sha256>(), &digest).expect("sign"))
}

#[derive(Default)]
pub struct FakeFreshchat {
    lookups: Mutex<Vec<String>>,
    sent: Mutex<Vec<(String, OutboundMessage)>>,
    reject: AtomicBool,
}

impl FakeFreshchat {
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().expect("lock").clone()
    }

    pub fn sent(&self) -> Vec<(String, OutboundMessage)> {
        self.sent.lock().expect("lock").clone()
    }

    pub fn reject_messages(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }
}

fn not_found(platform: &'static str) -> UpstreamError {
    UpstreamError::Status { platform, status: 404, body: "not found".to_owned() }
}

#[async_trait]
impl FreshchatApi for FakeFreshchat {
    async fn get_user(&self, user_id: &str) -> Result<ChatUser, UpstreamError> {
        self.lookups.lock().expect("lock").push(format!("user:{user_id}"));
        if user_id == "missing" {
            return Err(not_found("freshchat"));
        }
        Ok(ChatUser {
            id: Some(user_id.to_owned()),
            first_name: Some("Ann".to_owned()),
            last_name: None,
            email: Some("ann@example.com".to_owned()),
        })
    }

    async fn get_agent(&self, agent_id: &str) -> Result<AgentIdentity, UpstreamError> {
        self.lookups.lock().expect("lock").push(format!("agent:{agent_id}"));
        Ok(AgentIdentity {
            id: agent_id.to_owned(),
            email: None,
            first_name: Some("Bea".to_owned()),
            last_name: Some("Agent".to_owned()),
        })
    }

    async fn list_agents(&self, _: Option<usize>) -> Result<AgentPage, UpstreamError> {
        Ok(AgentPage::default())
    }

    async fn create_message(
        &self,
        conversation_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), UpstreamError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(UpstreamError::Status {
                platform: "freshchat",
                status: 400,
                body: "conversation closed".to_owned(),
            });
        }
        self.sent.lock().expect("lock").push((conversation_id.to_owned(), message.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMattermost {
    posts: Mutex<Vec<NewPost>>,
    reject: AtomicBool,
}

impl FakeMattermost {
    pub fn posts(&self) -> Vec<NewPost> {
        self.posts.lock().expect("lock").clone()
    }

    pub fn reject_posts(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MattermostApi for FakeMattermost {
    async fn list_users(&self) -> Result<Vec<TeamChatUser>, UpstreamError> {
        Ok(Vec::new())
    }

    async fn create_post(&self, post: &NewPost) -> Result<(), UpstreamError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(UpstreamError::Status {
                platform: "mattermost",
                status: 200,
                body: "{}".to_owned(),
            });
        }
        self.posts.lock().expect("lock").push(post.clone());
        Ok(())
    }
}

pub struct Harness {
    pub freshchat: Arc<FakeFreshchat>,
    pub mattermost: Arc<FakeMattermost>,
    pub mapping: IdentityMapping,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            freshchat: Arc::default(),
            mattermost: Arc::default(),
            mapping: [("bob".to_owned(), "A-bob".to_owned())].into_iter().collect(),
        }
    }
}

impl Harness {
    pub fn state(&self) -> AppState {
        AppState {
            freshchat: self.freshchat.clone(),
            mattermost: self.mattermost.clone(),
            verifier: Arc::new(SignatureVerifier::new(signing_key().to_public_key())),
            mapping: Arc::new(self.mapping.clone()),
            settings: Arc::new(RelaySettings {
                channel_id: "support-channel".to_owned(),
                slash_token: SLASH_TOKEN.to_owned().into(),
                command_trigger: "freshchat".to_owned(),
                app_id: Some("app-1".to_owned()),
            }),
        }
    }

    pub fn router(&self) -> Router {
        router(self.state())
    }
}
