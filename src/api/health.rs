// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health report with per-store status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// "ok" or "degraded".
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Login challenge store: "ok" or "unavailable".
    pub challenge_store: String,
    /// Workspace role store: "ok" or "unavailable".
    pub role_store: String,
    /// Challenges currently held, when the store answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outstanding_challenges: Option<usize>,
}

/// Liveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn component_status<T, E: std::fmt::Display>(component: &str, result: &Result<T, E>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(e) => {
            tracing::warn!(component, error = %e, "health check failed");
            "unavailable".to_string()
        }
    }
}

async fn check_stores(state: &AppState) -> (StatusCode, Json<ReadyResponse>) {
    let challenges = state.login.outstanding().await;
    let roles = state.access.stats().await;

    let checks = HealthChecks {
        challenge_store: component_status("challenge_store", &challenges),
        role_store: component_status("role_store", &roles),
        outstanding_challenges: challenges.ok(),
    };
    let ready = roles.is_ok() && checks.outstanding_challenges.is_some();

    let (status, label) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        status,
        Json(ReadyResponse {
            status: label.to_string(),
            checks,
        }),
    )
}

/// Full health report. 503 if either store fails to answer.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Both stores answered", body = ReadyResponse),
        (status = 503, description = "A store failed", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    check_stores(&state).await
}

/// Liveness probe. Never touches the stores.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe for load balancers.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to take traffic", body = ReadyResponse),
        (status = 503, description = "Not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    check_stores(&state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn fresh_state_is_ready() {
        let state = AppState::in_memory(Config::with_jwt_key(vec![1u8; 32]));
        state.login.issue_challenge().await.unwrap();

        let (status, Json(report)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "ok");
        assert_eq!(report.checks.role_store, "ok");
        assert_eq!(report.checks.outstanding_challenges, Some(1));
    }

    #[tokio::test]
    async fn liveness_reports_version() {
        let Json(live) = liveness().await;
        assert_eq!(live.status, "ok");
        assert!(!live.version.is_empty());
    }
}
