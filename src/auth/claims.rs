// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped identity produced by the auth extractors.

use serde::Serialize;
use utoipa::ToSchema;

use super::Pubkey;

/// How the caller proved control of their key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Session JWT from the `x-jwt` header
    Session,
    /// Signed timestamp token from the `token` query parameter
    SignedToken,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthenticatedPubkey {
    /// Recovered compressed pubkey (hex)
    pub pubkey: Pubkey,
    pub method: AuthMethod,
    /// Session expiry (unix seconds); absent for signed tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl AuthenticatedPubkey {
    pub fn from_session(pubkey: Pubkey, expires_at: i64) -> Self {
        Self {
            pubkey,
            method: AuthMethod::Session,
            expires_at: Some(expires_at),
        }
    }

    pub fn from_signed_token(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            method: AuthMethod::SignedToken,
            expires_at: None,
        }
    }
}
