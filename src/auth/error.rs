// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every variant except `ChallengeStoreFull` is a definitive rejection.
//! Variants that would let a caller probe internal state share one
//! user-visible code (expired vs. unknown challenges, expired vs. forged
//! sessions).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Neither an `x-jwt` header nor a `token` query parameter was supplied
    MissingCredentials,
    /// Token is not valid base64url or is shorter than the timestamp prefix
    MalformedToken,
    /// Signature bytes are malformed or key recovery failed
    InvalidSignature,
    /// Signature is valid but was produced by someone other than the expected signer
    UnexpectedSigner,
    /// Signed token timestamp is outside the accepted freshness window
    StaleToken,
    /// Login challenge is unknown, already redeemed, or expired
    ChallengeNotFound,
    /// Session JWT has expired
    SessionExpired,
    /// Session JWT is malformed or its signature does not verify
    InvalidSession,
    /// Caller is not on the admin allowlist
    NotAdmin,
    /// Every challenge slot holds a live challenge; retry after the TTL
    ChallengeStoreFull,
    /// Internal error
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::UnexpectedSigner => "unexpected_signer",
            AuthError::StaleToken => "stale_token",
            AuthError::ChallengeNotFound => "challenge_not_found",
            AuthError::SessionExpired | AuthError::InvalidSession => "invalid_session",
            AuthError::NotAdmin => "insufficient_permissions",
            AuthError::ChallengeStoreFull => "challenge_store_full",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::StaleToken
            | AuthError::SessionExpired
            | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
            AuthError::UnexpectedSigner | AuthError::NotAdmin => StatusCode::FORBIDDEN,
            AuthError::ChallengeNotFound => StatusCode::NOT_FOUND,
            AuthError::ChallengeStoreFull => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => {
                write!(f, "Authentication required (x-jwt header or token parameter)")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Signature is invalid"),
            AuthError::UnexpectedSigner => write!(f, "Signature was not made by the expected key"),
            AuthError::StaleToken => write!(f, "Token timestamp is outside the accepted window"),
            AuthError::ChallengeNotFound => write!(f, "Challenge not found or expired"),
            AuthError::SessionExpired | AuthError::InvalidSession => {
                write!(f, "Session is invalid or expired")
            }
            AuthError::NotAdmin => write!(f, "Insufficient permissions for this operation"),
            AuthError::ChallengeStoreFull => write!(f, "Too many outstanding login challenges"),
            AuthError::Internal(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let AuthError::Internal(ref msg) = self {
            tracing::error!(error = %msg, "internal authentication error");
        }
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
