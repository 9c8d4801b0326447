use thiserror::Error;

/// Failure talking to either platform's REST API.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("{platform} request failed: {message}")]
    Transport { platform: &'static str, message: String },
    #[error("{platform} returned {status}: {body}")]
    Status { platform: &'static str, status: u16, body: String },
    #[error("{platform} response could not be decoded: {message}")]
    Decode { platform: &'static str, message: String },
}

impl UpstreamError {
    pub fn platform(&self) -> &'static str {
        match self {
            Self::Transport { platform, .. }
            | Self::Status { platform, .. }
            | Self::Decode { platform, .. } => platform,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("authentication missing: {0}")]
    AuthenticationMissing(&'static str),
    #[error("authentication invalid: {0}")]
    AuthenticationInvalid(&'static str),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("bad command syntax: {0}")]
    Syntax(String),
    #[error("no freshchat agent mapped to `{user_name}`")]
    LookupMiss { user_name: String },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl RelayError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AuthenticationMissing(_) => 401,
            Self::AuthenticationInvalid(_) => 403,
            Self::MalformedPayload(_) | Self::Syntax(_) => 400,
            Self::LookupMiss { .. } | Self::Upstream(_) => 500,
        }
    }

    /// Body returned to the caller. Diagnostic detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationMissing(_) | Self::AuthenticationInvalid(_) | Self::Upstream(_) => {
                "err".to_owned()
            }
            Self::MalformedPayload(_) => "Malformed request payload.".to_owned(),
            Self::Syntax(message) => message.clone(),
            Self::LookupMiss { .. } => "No Freshchat user found!".to_owned(),
        }
    }

    /// Request-level faults are the caller's problem; the rest are ours to log.
    pub fn is_request_fault(&self) -> bool {
        self.status_code() < 500
    }
}
