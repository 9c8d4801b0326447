use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::app::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub identity_mapping: HealthCheck,
    pub checked_at: String,
}

/// An empty mapping means no agent can reply, so the relay reports degraded.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let identity_mapping = mapping_check(state.mapping.len());
    let ready = identity_mapping.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "parley-server relay routes mounted".to_string(),
        },
        identity_mapping,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn mapping_check(mapped_users: usize) -> HealthCheck {
    if mapped_users == 0 {
        HealthCheck {
            status: "degraded",
            detail: "no mattermost user is mapped to a freshchat agent".to_string(),
        }
    } else {
        HealthCheck { status: "ready", detail: format!("{mapped_users} users mapped") }
    }
}
