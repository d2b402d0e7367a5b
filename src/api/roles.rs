// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::auth::Role;

/// The role registry.
#[utoipa::path(
    get,
    path = "/v1/roles",
    tag = "Roles",
    responses(
        (status = 200, description = "Every assignable role", body = [Role])
    )
)]
pub async fn list_roles() -> Json<Vec<Role>> {
    Json(Role::ALL.to_vec())
}
