// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Workspace membership and role endpoints.
//!
//! Every endpoint requires authentication; the acting pubkey is always the
//! authenticated caller.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    access::{AccessError, RoleAssignment, Workspace},
    auth::{Auth, Pubkey, Role},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateWorkspaceRequest {
    /// Workspace uuid; generated when omitted
    #[serde(default)]
    pub uuid: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub pubkey: Pubkey,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddRolesRequest {
    /// Role wire names, e.g. `"ADD BOUNTY"`
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserRolesResponse {
    pub workspace_uuid: Uuid,
    pub pubkey: Pubkey,
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AccessQuery {
    /// Role wire name
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessResponse {
    pub workspace_uuid: Uuid,
    pub pubkey: Pubkey,
    pub role: Role,
    pub allowed: bool,
}

fn parse_pubkey(raw: &str) -> Result<Pubkey, ApiError> {
    Pubkey::parse(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Register a workspace owned by the caller.
#[utoipa::path(
    post,
    path = "/v1/workspaces",
    tag = "Workspaces",
    security(("session" = []), ("token" = [])),
    request_body = CreateWorkspaceRequest,
    responses(
        (status = 201, description = "Workspace registered", body = Workspace),
        (status = 409, description = "Workspace already exists"),
    )
)]
pub async fn create_workspace(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Json(body): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<Workspace>), ApiError> {
    let uuid = body.uuid.unwrap_or_else(Uuid::new_v4);
    let workspace = state.access.register_workspace(&caller.pubkey, uuid).await?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

/// Add a member. Requires `ADD USER`.
#[utoipa::path(
    post,
    path = "/v1/workspaces/{uuid}/users",
    tag = "Workspaces",
    security(("session" = []), ("token" = [])),
    params(("uuid" = Uuid, Path, description = "Workspace uuid")),
    request_body = AddMemberRequest,
    responses(
        (status = 204, description = "Member added"),
        (status = 403, description = "Caller lacks ADD USER"),
        (status = 404, description = "Workspace not found"),
    )
)]
pub async fn add_member(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(uuid): Path<Uuid>,
    Json(body): Json<AddMemberRequest>,
) -> Result<StatusCode, ApiError> {
    state.access.add_member(&caller.pubkey, uuid, &body.pubkey).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a member and all of their roles. Requires `DELETE USER`.
#[utoipa::path(
    delete,
    path = "/v1/workspaces/{uuid}/users/{pubkey}",
    tag = "Workspaces",
    security(("session" = []), ("token" = [])),
    params(
        ("uuid" = Uuid, Path, description = "Workspace uuid"),
        ("pubkey" = String, Path, description = "Member pubkey")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Caller lacks DELETE USER, or target is the owner"),
    )
)]
pub async fn remove_member(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path((uuid, pubkey)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
    let target = parse_pubkey(&pubkey)?;
    state.access.remove_member(&caller.pubkey, uuid, &target).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Effective roles of a pubkey in the workspace.
///
/// Visible to the pubkey itself and to the workspace's owner and members.
#[utoipa::path(
    get,
    path = "/v1/workspaces/{uuid}/users/{pubkey}/roles",
    tag = "Workspaces",
    security(("session" = []), ("token" = [])),
    params(
        ("uuid" = Uuid, Path, description = "Workspace uuid"),
        ("pubkey" = String, Path, description = "Member pubkey")
    ),
    responses(
        (status = 200, description = "Roles held", body = UserRolesResponse),
        (status = 403, description = "Caller is not in the workspace"),
        (status = 404, description = "Workspace not found"),
    )
)]
pub async fn user_roles(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path((uuid, pubkey)): Path<(Uuid, String)>,
) -> Result<Json<UserRolesResponse>, ApiError> {
    let pubkey = parse_pubkey(&pubkey)?;
    let roles = state
        .access
        .visible_roles(&caller.pubkey, uuid, &pubkey)
        .await?;
    Ok(Json(UserRolesResponse {
        workspace_uuid: uuid,
        pubkey,
        roles,
    }))
}

/// Grant roles to a member. The batch is all-or-nothing.
#[utoipa::path(
    post,
    path = "/v1/workspaces/{uuid}/users/{pubkey}/roles",
    tag = "Workspaces",
    security(("session" = []), ("token" = [])),
    params(
        ("uuid" = Uuid, Path, description = "Workspace uuid"),
        ("pubkey" = String, Path, description = "Target member pubkey")
    ),
    request_body = AddRolesRequest,
    responses(
        (status = 201, description = "Roles granted", body = [RoleAssignment]),
        (status = 400, description = "Unknown role or target not a member"),
        (status = 403, description = "Self-grant, missing ADD ROLES, or role not held"),
    )
)]
pub async fn add_roles(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path((uuid, pubkey)): Path<(Uuid, String)>,
    Json(body): Json<AddRolesRequest>,
) -> Result<(StatusCode, Json<Vec<RoleAssignment>>), ApiError> {
    let target = parse_pubkey(&pubkey)?;
    let granted = state
        .access
        .add_roles(&caller.pubkey, &target, uuid, &body.roles)
        .await?;
    Ok((StatusCode::CREATED, Json(granted)))
}

/// Whether the caller holds a role in the workspace.
#[utoipa::path(
    get,
    path = "/v1/workspaces/{uuid}/access",
    tag = "Workspaces",
    security(("session" = []), ("token" = [])),
    params(("uuid" = Uuid, Path, description = "Workspace uuid"), AccessQuery),
    responses(
        (status = 200, description = "Access decision", body = AccessResponse),
        (status = 400, description = "Unknown role"),
    )
)]
pub async fn check_access(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(uuid): Path<Uuid>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<AccessResponse>, ApiError> {
    let role: Role = query
        .role
        .parse()
        .map_err(|_| AccessError::UnknownRole(query.role.clone()))?;
    let allowed = state.access.has_access(&caller.pubkey, uuid, role).await?;
    Ok(Json(AccessResponse {
        workspace_uuid: uuid,
        pubkey: caller.pubkey,
        role,
        allowed,
    }))
}
