// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable resource identifiers.
//!
//! A resource id is a signed token minted by its creator. Anyone can recover
//! the creator from it at any time; freshness is never applied.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{auth::Pubkey, error::ApiError, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct ResourceCreatorResponse {
    pub resource_id: String,
    pub creator: Pubkey,
    /// When the id was minted, as signed by the creator
    pub created_at: Option<DateTime<Utc>>,
}

/// Recover the creator of a resource id.
#[utoipa::path(
    get,
    path = "/v1/resources/{id}/creator",
    tag = "Resources",
    params(("id" = String, Path, description = "Base64url resource id")),
    responses(
        (status = 200, description = "Creator pubkey", body = ResourceCreatorResponse),
        (status = 401, description = "Malformed id or invalid signature"),
    )
)]
pub async fn creator(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResourceCreatorResponse>, ApiError> {
    let verified = state.verifier.verify_resource_id(&id)?;
    Ok(Json(ResourceCreatorResponse {
        resource_id: id,
        creator: verified.pubkey,
        created_at: DateTime::from_timestamp(i64::from(verified.timestamp), 0),
    }))
}
