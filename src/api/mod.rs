// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    access::{RoleAssignment, Workspace},
    auth::{
        extractor::SESSION_HEADER, AuthMethod, AuthenticatedPubkey, IssuedSession, Pubkey, Role,
    },
    login::{ChallengeStatus, IssuedChallenge},
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod lnauth;
pub mod resources;
pub mod roles;
pub mod session;
pub mod workspaces;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/lnauth", get(lnauth::issue_challenge))
        .route("/lnauth/callback", get(lnauth::lnurl_callback))
        .route("/lnauth/{k1}/signature", post(lnauth::submit_signature))
        .route("/lnauth/poll/{k1}", get(lnauth::poll))
        .route("/auth/refresh", post(session::refresh))
        .route("/auth/me", get(session::me))
        .route("/roles", get(roles::list_roles))
        .route("/resources/{id}/creator", get(resources::creator))
        .route("/workspaces", post(workspaces::create_workspace))
        .route("/workspaces/{uuid}/users", post(workspaces::add_member))
        .route(
            "/workspaces/{uuid}/users/{pubkey}",
            delete(workspaces::remove_member),
        )
        .route(
            "/workspaces/{uuid}/users/{pubkey}/roles",
            get(workspaces::user_roles).post(workspaces::add_roles),
        )
        .route("/workspaces/{uuid}/access", get(workspaces::check_access))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/resource-ids", post(admin::mint_resource_id));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Session header and signed query token schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    SESSION_HEADER,
                    "Session JWT obtained from a login poll or refresh",
                ))),
            );
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::with_description(
                    "token",
                    "Base64url signed timestamp token: 4-byte big-endian unix time followed by a 65-byte compact signature",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        lnauth::issue_challenge,
        lnauth::lnurl_callback,
        lnauth::submit_signature,
        lnauth::poll,
        session::refresh,
        session::me,
        roles::list_roles,
        resources::creator,
        workspaces::create_workspace,
        workspaces::add_member,
        workspaces::remove_member,
        workspaces::user_roles,
        workspaces::add_roles,
        workspaces::check_access,
        admin::stats,
        admin::mint_resource_id
    ),
    components(
        schemas(
            Pubkey,
            Role,
            AuthMethod,
            AuthenticatedPubkey,
            IssuedSession,
            IssuedChallenge,
            ChallengeStatus,
            Workspace,
            RoleAssignment,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            lnauth::SignatureProofRequest,
            lnauth::SignatureProofResponse,
            lnauth::PollResponse,
            resources::ResourceCreatorResponse,
            workspaces::CreateWorkspaceRequest,
            workspaces::AddMemberRequest,
            workspaces::AddRolesRequest,
            workspaces::UserRolesResponse,
            workspaces::AccessResponse,
            admin::SystemStatsResponse,
            admin::MintedResourceId
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Login", description = "LNURL-auth challenge login"),
        (name = "Session", description = "Session inspection and refresh"),
        (name = "Roles", description = "Role registry"),
        (name = "Resources", description = "Signed resource identifiers"),
        (name = "Workspaces", description = "Workspace membership and role grants"),
        (name = "Admin", description = "Operator endpoints")
    )
)]
struct ApiDoc;
