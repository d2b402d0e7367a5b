// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(caller): Auth) -> impl IntoResponse {
//!     // caller.pubkey is the recovered identity
//! }
//! ```
//!
//! Credentials are looked up in order:
//!
//! 1. a session JWT in the `x-jwt` header,
//! 2. a signed timestamp token in the `token` query parameter.
//!
//! A present but invalid session is rejected outright; it does not fall
//! through to the query token.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use super::{AuthError, AuthenticatedPubkey};
use crate::state::AppState;

/// Header carrying the session JWT.
pub const SESSION_HEADER: &str = "x-jwt";

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extractor for authenticated callers.
pub struct Auth(pub AuthenticatedPubkey);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(SESSION_HEADER) {
            let jwt = value.to_str().map_err(|_| AuthError::InvalidSession)?;
            let session = state.sessions.verify(jwt)?;
            return Ok(Auth(AuthenticatedPubkey::from_session(
                session.pubkey,
                session.expires_at,
            )));
        }

        let token = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token);
        if let Some(token) = token {
            let verified = state.verifier.verify_auth_token(&token)?;
            return Ok(Auth(AuthenticatedPubkey::from_signed_token(verified.pubkey)));
        }

        Err(AuthError::MissingCredentials)
    }
}

/// Extractor that requires a session JWT specifically.
///
/// Used where a signed token would be the wrong credential, e.g. refresh.
pub struct SessionAuth(pub String, pub AuthenticatedPubkey);

impl FromRequestParts<AppState> for SessionAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jwt = parts
            .headers
            .get(SESSION_HEADER)
            .ok_or(AuthError::MissingCredentials)?
            .to_str()
            .map_err(|_| AuthError::InvalidSession)?
            .to_string();
        let session = state.sessions.verify(&jwt)?;

        Ok(SessionAuth(
            jwt,
            AuthenticatedPubkey::from_session(session.pubkey, session.expires_at),
        ))
    }
}

/// Extractor that requires the caller to be on the `ADMINS` allowlist.
pub struct SuperAdmin(pub AuthenticatedPubkey);

impl FromRequestParts<AppState> for SuperAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(caller) = Auth::from_request_parts(parts, state).await?;

        if !state.config.is_admin(&caller.pubkey) {
            tracing::warn!(pubkey = %caller.pubkey, "non-admin attempted admin endpoint");
            return Err(AuthError::NotAdmin);
        }

        Ok(SuperAdmin(caller))
    }
}
