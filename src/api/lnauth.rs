// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LNURL-auth login endpoints.
//!
//! The browser calls `GET /v1/lnauth`, shows the LNURL, and polls
//! `/v1/lnauth/poll/{k1}`. The wallet answers through either the LUD-04
//! callback or the compact-signature endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{AuthError, Pubkey},
    error::ApiError,
    login::{lnurl::LnurlResponse, ChallengeStatus, IssuedChallenge},
    state::AppState,
};

/// LUD-04 callback parameters.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LnurlCallbackParams {
    /// Hex challenge
    pub k1: String,
    /// Hex DER signature over the raw k1 bytes
    pub sig: String,
    /// Hex compressed linking key
    pub key: String,
}

/// Compact recoverable signature over the raw k1 bytes.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignatureProofRequest {
    /// Hex-encoded 65-byte compact signature
    pub signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignatureProofResponse {
    pub k1: String,
    pub pubkey: Pubkey,
}

/// Poll result; a verified challenge comes back with a session exactly once.
#[derive(Debug, Serialize, ToSchema)]
pub struct PollResponse {
    pub k1: String,
    pub status: ChallengeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<Pubkey>,
    /// Session JWT for the `x-jwt` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Issue a login challenge.
#[utoipa::path(
    get,
    path = "/v1/lnauth",
    tag = "Login",
    responses(
        (status = 200, description = "New challenge", body = IssuedChallenge),
        (status = 503, description = "Challenge store is full")
    )
)]
pub async fn issue_challenge(State(state): State<AppState>) -> Result<Json<IssuedChallenge>, ApiError> {
    Ok(Json(state.login.issue_challenge().await?))
}

/// Wallet callback (LUD-04).
///
/// Always answers 200 with an LNURL status body, as wallets expect.
#[utoipa::path(
    get,
    path = "/v1/lnauth/callback",
    tag = "Login",
    params(LnurlCallbackParams),
    responses(
        (status = 200, description = "`{\"status\":\"OK\"}` or `{\"status\":\"ERROR\",\"reason\":...}`")
    )
)]
pub async fn lnurl_callback(
    State(state): State<AppState>,
    Query(params): Query<LnurlCallbackParams>,
) -> Json<LnurlResponse> {
    match state
        .login
        .verify_lnurl_callback(&params.k1, &params.sig, &params.key)
        .await
    {
        Ok(_) => Json(LnurlResponse::Ok),
        Err(e) => {
            tracing::debug!(k1 = %params.k1, error = %e, "lnurl callback rejected");
            Json(LnurlResponse::error(e.to_string()))
        }
    }
}

/// Submit a compact recoverable signature for a challenge.
#[utoipa::path(
    post,
    path = "/v1/lnauth/{k1}/signature",
    tag = "Login",
    params(("k1" = String, Path, description = "Hex challenge")),
    request_body = SignatureProofRequest,
    responses(
        (status = 200, description = "Challenge verified", body = SignatureProofResponse),
        (status = 401, description = "Invalid signature"),
        (status = 404, description = "Challenge not found or expired")
    )
)]
pub async fn submit_signature(
    State(state): State<AppState>,
    Path(k1): Path<String>,
    Json(body): Json<SignatureProofRequest>,
) -> Result<Json<SignatureProofResponse>, ApiError> {
    let signature = hex::decode(body.signature.trim()).map_err(|_| AuthError::InvalidSignature)?;
    let pubkey = state.login.submit_signed_proof(&k1, &signature).await?;
    Ok(Json(SignatureProofResponse { k1, pubkey }))
}

/// Poll a challenge. The first poll after verification mints the session.
#[utoipa::path(
    get,
    path = "/v1/lnauth/poll/{k1}",
    tag = "Login",
    params(("k1" = String, Path, description = "Hex challenge")),
    responses(
        (status = 200, description = "Challenge status", body = PollResponse),
        (status = 404, description = "Challenge not found, expired or already redeemed")
    )
)]
pub async fn poll(
    State(state): State<AppState>,
    Path(k1): Path<String>,
) -> Result<Json<PollResponse>, ApiError> {
    let polled = state.login.poll(&k1).await?;
    if polled.status == ChallengeStatus::Pending {
        return Ok(Json(PollResponse {
            k1: polled.k1,
            status: polled.status,
            pubkey: None,
            jwt: None,
            expires_at: None,
        }));
    }

    let pubkey = state.login.redeem(&k1).await?;
    let session = state.sessions.issue(&pubkey)?;
    tracing::info!(pubkey = %pubkey, "session issued via login");

    Ok(Json(PollResponse {
        k1,
        status: ChallengeStatus::Verified,
        pubkey: Some(pubkey),
        jwt: Some(session.jwt),
        expires_at: Some(session.expires_at),
    }))
}
