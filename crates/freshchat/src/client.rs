use std::time::Duration;

use async_trait::async_trait;
use parley_core::config::FreshchatConfig;
use parley_core::{
    AgentIdentity, AgentPage, ChatUser, FreshchatApi, OutboundMessage, UpstreamError,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

const PLATFORM: &str = "freshchat";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("freshchat.api_url `{url}` is not a valid base url: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("could not build freshchat http client: {0}")]
    Build(#[source] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct HttpFreshchatClient {
    client: Client,
    base_url: Url,
    token: SecretString,
}

#[derive(Debug, Deserialize)]
struct AgentsResponse {
    #[serde(default)]
    agents: Vec<AgentIdentity>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    total_items: Option<usize>,
}

impl From<AgentsResponse> for AgentPage {
    fn from(response: AgentsResponse) -> Self {
        Self {
            agents: response.agents,
            total_items: response.pagination.and_then(|pagination| pagination.total_items),
        }
    }
}

impl HttpFreshchatClient {
    pub fn new(config: &FreshchatConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::Build)?;
        Self::with_client(client, &config.api_url, config.token.clone())
    }

    pub fn with_client(
        client: Client,
        api_url: &str,
        token: SecretString,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(api_url.trim()).map_err(|error| ClientError::InvalidBaseUrl {
            url: api_url.to_owned(),
            message: error.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: api_url.to_owned(),
                message: "url cannot carry a path".to_owned(),
            });
        }
        Ok(Self { client, base_url, token })
    }

    /// Appends percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, UpstreamError> {
        self.authorized(request).send().await.map_err(|error| UpstreamError::Transport {
            platform: PLATFORM,
            message: error.to_string(),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, UpstreamError> {
        let url = self.endpoint(segments);
        debug!(url = %url, "freshchat GET");
        let response = self.send(self.client.get(url)).await?;
        decode_success(response).await
    }
}

async fn read_body(response: Response) -> Result<(StatusCode, String), UpstreamError> {
    let status = response.status();
    let body = response.text().await.map_err(|error| UpstreamError::Transport {
        platform: PLATFORM,
        message: error.to_string(),
    })?;
    Ok((status, body))
}

async fn decode_success<T: DeserializeOwned>(response: Response) -> Result<T, UpstreamError> {
    let (status, body) = read_body(response).await?;
    if !status.is_success() {
        return Err(UpstreamError::Status { platform: PLATFORM, status: status.as_u16(), body });
    }
    serde_json::from_str(&body)
        .map_err(|error| UpstreamError::Decode { platform: PLATFORM, message: error.to_string() })
}

#[async_trait]
impl FreshchatApi for HttpFreshchatClient {
    async fn get_user(&self, user_id: &str) -> Result<ChatUser, UpstreamError> {
        self.fetch(&["users", user_id]).await
    }

    async fn get_agent(&self, agent_id: &str) -> Result<AgentIdentity, UpstreamError> {
        self.fetch(&["agents", agent_id]).await
    }

    /// A non-200 answer is logged and its body is still used if it decodes.
    async fn list_agents(
        &self,
        items_per_page: Option<usize>,
    ) -> Result<AgentPage, UpstreamError> {
        let mut request = self.client.get(self.endpoint(&["agents"]));
        if let Some(items_per_page) = items_per_page {
            request = request.query(&[("items_per_page", items_per_page)]);
        }

        let (status, body) = read_body(self.send(request).await?).await?;
        if status != StatusCode::OK {
            error!(
                event_name = "freshchat.agents.unexpected_status",
                status = status.as_u16(),
                paginated = items_per_page.is_some(),
                body = %body,
                "when retrieving freshchat agents"
            );
        }

        match serde_json::from_str::<AgentsResponse>(&body) {
            Ok(response) => Ok(response.into()),
            Err(_) if !status.is_success() => {
                Err(UpstreamError::Status { platform: PLATFORM, status: status.as_u16(), body })
            }
            Err(error) => {
                Err(UpstreamError::Decode { platform: PLATFORM, message: error.to_string() })
            }
        }
    }

    async fn create_message(
        &self,
        conversation_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), UpstreamError> {
        let url = self.endpoint(&["conversations", conversation_id, "messages"]);
        let response = self.send(self.client.post(url).json(message)).await?;
        let (status, body) = read_body(response).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(UpstreamError::Status { platform: PLATFORM, status: status.as_u16(), body })
        }
    }
}
