// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session JWT issuance and verification.
//!
//! Sessions are stateless HS256 JWTs bound to a recovered pubkey. There is
//! no revocation list: a session is valid iff its signature verifies under
//! the process key and it has not expired. Rotating `JWT_KEY` therefore
//! invalidates every outstanding session.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuthError, Pubkey};

/// Claims carried by a session JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Hex-encoded compressed pubkey the session was issued to
    pub pubkey: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// A freshly minted session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedSession {
    /// Session JWT, sent back in the `x-jwt` header
    pub jwt: String,
    /// Expiration (unix seconds)
    pub expires_at: i64,
}

/// A session that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    pub pubkey: Pubkey,
    pub expires_at: i64,
}

/// Mints and verifies session JWTs with a process-wide HMAC key.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("ttl", &self.ttl)
            .field("key", &"***SECRET***")
            .finish()
    }
}

impl SessionIssuer {
    /// Create an issuer from the HMAC secret and session lifetime.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a session for `pubkey` starting now.
    pub fn issue(&self, pubkey: &Pubkey) -> Result<IssuedSession, AuthError> {
        self.issue_at(pubkey, Utc::now().timestamp())
    }

    /// Issue a session as if minted at `now` (unix seconds).
    pub fn issue_at(&self, pubkey: &Pubkey, now: i64) -> Result<IssuedSession, AuthError> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| AuthError::Internal("session expiry out of range".to_string()))?;
        let claims = SessionClaims {
            pubkey: pubkey.to_string(),
            iat: now,
            exp,
        };

        let jwt = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to encode session: {e}")))?;

        Ok(IssuedSession {
            jwt,
            expires_at: claims.exp,
        })
    }

    /// Verify a session JWT and return the pubkey it is bound to.
    ///
    /// # Errors
    /// `AuthError::SessionExpired` past `exp`, `AuthError::InvalidSession`
    /// for anything else (bad signature, bad claims, wrong algorithm).
    pub fn verify(&self, jwt: &str) -> Result<VerifiedSession, AuthError> {
        let data = decode::<SessionClaims>(jwt, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::SessionExpired,
                _ => AuthError::InvalidSession,
            },
        )?;

        let pubkey = Pubkey::parse(&data.claims.pubkey).map_err(|_| AuthError::InvalidSession)?;
        Ok(VerifiedSession {
            pubkey,
            expires_at: data.claims.exp,
        })
    }

    /// Re-mint a still-valid session with a fresh expiry.
    ///
    /// This is an explicit re-authentication: the old token is untouched and
    /// remains valid until its own expiry.
    pub fn refresh(&self, jwt: &str) -> Result<IssuedSession, AuthError> {
        let session = self.verify(jwt)?;
        self.issue(&session.pubkey)
    }
}
