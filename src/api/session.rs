// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints.

use axum::{extract::State, Json};

use crate::{
    auth::{Auth, AuthenticatedPubkey, IssuedSession, SessionAuth},
    error::ApiError,
    state::AppState,
};

/// Re-mint the caller's session with a fresh expiry.
///
/// Requires a valid `x-jwt`; signed query tokens are not accepted here.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    tag = "Session",
    security(("session" = [])),
    responses(
        (status = 200, description = "New session", body = IssuedSession),
        (status = 401, description = "Missing, invalid or expired session"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    SessionAuth(jwt, _): SessionAuth,
) -> Result<Json<IssuedSession>, ApiError> {
    Ok(Json(state.sessions.refresh(&jwt)?))
}

/// The caller's identity.
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    tag = "Session",
    security(("session" = []), ("token" = [])),
    responses(
        (status = 200, description = "Authenticated identity", body = AuthenticatedPubkey),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn me(Auth(caller): Auth) -> Json<AuthenticatedPubkey> {
    Json(caller)
}
