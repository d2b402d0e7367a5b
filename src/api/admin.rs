// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! These endpoints require the caller to be on the `ADMINS` allowlist and
//! provide:
//! - System statistics
//! - Minting of server-signed resource identifiers

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{Pubkey, SuperAdmin},
    error::ApiError,
    state::AppState,
};

/// System statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatsResponse {
    /// Registered workspaces.
    pub workspaces: usize,
    /// Workspace memberships.
    pub members: usize,
    /// Role assignment rows (owners hold roles implicitly and are not counted).
    pub role_assignments: usize,
    /// Login challenges currently held.
    pub outstanding_challenges: usize,
    /// Number of configured admins.
    pub admins: usize,
    /// Current timestamp.
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MintedResourceId {
    pub resource_id: String,
    pub creator: Pubkey,
}

/// System statistics.
#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    tag = "Admin",
    security(("session" = []), ("token" = [])),
    responses(
        (status = 200, description = "System statistics", body = SystemStatsResponse),
        (status = 403, description = "Not an admin"),
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    SuperAdmin(_admin): SuperAdmin,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let store = state.access.stats().await?;
    let outstanding_challenges = state.login.outstanding().await?;

    Ok(Json(SystemStatsResponse {
        workspaces: store.workspaces,
        members: store.members,
        role_assignments: store.role_assignments,
        outstanding_challenges,
        admins: state.config.admins.len(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Mint a resource id signed by the server key.
#[utoipa::path(
    post,
    path = "/v1/admin/resource-ids",
    tag = "Admin",
    security(("session" = []), ("token" = [])),
    responses(
        (status = 201, description = "Resource id minted", body = MintedResourceId),
        (status = 403, description = "Not an admin"),
        (status = 503, description = "No server signing key configured"),
    )
)]
pub async fn mint_resource_id(
    State(state): State<AppState>,
    SuperAdmin(admin): SuperAdmin,
) -> Result<(StatusCode, Json<MintedResourceId>), ApiError> {
    let signer = state
        .signer
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("No server signing key configured"))?;

    let resource_id = signer.mint_resource_id()?;
    tracing::info!(admin = %admin.pubkey, "server resource id minted");

    Ok((
        StatusCode::CREATED,
        Json(MintedResourceId {
            resource_id,
            creator: signer.pubkey(),
        }),
    ))
}
