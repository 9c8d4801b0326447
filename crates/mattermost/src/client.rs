use std::time::Duration;

use async_trait::async_trait;
use parley_core::config::MattermostConfig;
use parley_core::{MattermostApi, NewPost, TeamChatUser, UpstreamError};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;

const PLATFORM: &str = "mattermost";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("mattermost.api_url `{url}` is not a valid base url: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("could not build mattermost http client: {0}")]
    Build(#[source] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct HttpMattermostClient {
    client: Client,
    base_url: Url,
    bot_token: SecretString,
}

impl HttpMattermostClient {
    pub fn new(config: &MattermostConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::Build)?;
        Self::with_client(client, &config.api_url, config.bot_token.clone())
    }

    pub fn with_client(
        client: Client,
        api_url: &str,
        bot_token: SecretString,
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
        Ok(Self { client, base_url, bot_token })
    }

    fn endpoint(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(segment);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String), UpstreamError> {
        let response: Response = request
            .bearer_auth(self.bot_token.expose_secret())
            .send()
            .await
            .map_err(|error| transport(error.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|error| transport(error.to_string()))?;
        Ok((status, body))
    }
}

fn transport(message: String) -> UpstreamError {
    UpstreamError::Transport { platform: PLATFORM, message }
}

#[async_trait]
impl MattermostApi for HttpMattermostClient {
    /// Single page; the roster is assumed to fit in one response.
    async fn list_users(&self) -> Result<Vec<TeamChatUser>, UpstreamError> {
        let url = self.endpoint("users");
        debug!(url = %url, "mattermost GET");
        let (status, body) = self.send(self.client.get(url)).await?;
        if !status.is_success() {
            return Err(UpstreamError::Status { platform: PLATFORM, status: status.as_u16(), body });
        }
        serde_json::from_str(&body)
            .map_err(|error| UpstreamError::Decode { platform: PLATFORM, message: error.to_string() })
    }

    async fn create_post(&self, post: &NewPost) -> Result<(), UpstreamError> {
        let (status, body) = self.send(self.client.post(self.endpoint("posts")).json(post)).await?;
        if status == StatusCode::CREATED {
            Ok(())
        } else {
            Err(UpstreamError::Status { platform: PLATFORM, status: status.as_u16(), body })
        }
    }
}
