// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::store::StoreError;
use crate::auth::Role;

/// Authorization decision failures.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Cannot grant roles to yourself")]
    SelfGrant,

    #[error("Missing required role: {0}")]
    InsufficientPermission(Role),

    #[error("Cannot grant a role you do not hold: {0}")]
    RoleNotHeld(Role),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Target is not a member of this workspace")]
    NotAMember,

    #[error("Caller is not a member of this workspace")]
    NotWorkspaceMember,

    #[error("Workspace not found")]
    WorkspaceNotFound,

    #[error("Workspace already exists")]
    WorkspaceExists,

    #[error("The workspace owner cannot be removed")]
    OwnerImmutable,

    #[error("role store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct AccessErrorBody {
    error: String,
    error_code: &'static str,
}

impl AccessError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::SelfGrant => "self_grant",
            AccessError::InsufficientPermission(_) => "insufficient_permissions",
            AccessError::RoleNotHeld(_) => "role_not_held",
            AccessError::UnknownRole(_) => "unknown_role",
            AccessError::NotAMember => "not_a_member",
            AccessError::NotWorkspaceMember => "not_workspace_member",
            AccessError::WorkspaceNotFound => "workspace_not_found",
            AccessError::WorkspaceExists => "workspace_exists",
            AccessError::OwnerImmutable => "owner_immutable",
            AccessError::Store(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AccessError::SelfGrant
            | AccessError::InsufficientPermission(_)
            | AccessError::RoleNotHeld(_)
            | AccessError::NotWorkspaceMember
            | AccessError::OwnerImmutable => StatusCode::FORBIDDEN,
            AccessError::UnknownRole(_) | AccessError::NotAMember => StatusCode::BAD_REQUEST,
            AccessError::WorkspaceNotFound => StatusCode::NOT_FOUND,
            AccessError::WorkspaceExists => StatusCode::CONFLICT,
            AccessError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            AccessError::Store(e) => {
                tracing::error!(error = %e, "role store failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(AccessErrorBody {
            error,
            error_code: self.error_code(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn store_failures_hide_details() {
        let err = AccessError::Store(StoreError::Io(std::io::Error::other("disk on fire")));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error_code"], "internal_error");
        assert!(!body["error"].as_str().unwrap().contains("disk"));
    }

    #[test]
    fn grant_violations_are_forbidden() {
        assert_eq!(AccessError::SelfGrant.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AccessError::RoleNotHeld(Role::PayBounty).to_string(),
            "Cannot grant a role you do not hold: PAY BOUNTY"
        );
    }
}
