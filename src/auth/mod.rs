// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Pubkey-based request authentication. There are no passwords and no
//! per-user secrets: a caller proves identity by signing with their
//! secp256k1 key, and the server recovers the public key from the signature.
//!
//! ## Auth Flow
//!
//! 1. Client signs a 4-byte timestamp (or a login challenge) with its key
//! 2. Client sends either:
//!    - `?token=<base64url(timestamp ‖ signature)>`, or
//!    - `x-jwt: <session>` obtained through the login flow
//! 3. Server:
//!    - decodes the token and recovers the compressed pubkey
//!    - applies the configured freshness window to auth tokens
//!    - or verifies the session JWT (HS256, zero leeway)
//!
//! ## Security
//!
//! - The recovered pubkey is the only identity; nothing is stored per user
//! - Durable resource identifiers are verified without freshness
//! - Expired and forged sessions are indistinguishable to callers
//! - Signatures and JWTs are never logged

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod recovery;
pub mod roles;
pub mod session;
pub mod verifier;

pub use claims::{AuthMethod, AuthenticatedPubkey};
pub use error::AuthError;
pub use extractor::{Auth, SessionAuth, SuperAdmin};
pub use recovery::{InvalidPubkey, Pubkey, Signer, SignerKeyError};
pub use roles::{Role, UnknownRoleName};
pub use session::{IssuedSession, SessionIssuer};
pub use verifier::{Freshness, TokenVerifier, VerifiedToken};
