// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed-token verification.
//!
//! Turns an opaque token into a recovered [`Pubkey`]. Freshness is never
//! implicit: every entry point either takes a [`Freshness`] or documents
//! which one it applies.
//!
//! - Auth tokens (the `token` query parameter) use the configured window.
//! - Resource identifiers embed their creator's proof and are verified with
//!   [`Freshness::Unchecked`]; a captured identifier stays valid forever.

use std::time::Duration;

use super::{codec, recovery, AuthError, Pubkey};

/// Tolerated clock skew for timestamps in the future.
pub const FUTURE_SKEW: Duration = Duration::from_secs(60);

/// Replay policy applied to a token's signed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Accept any timestamp. Used for durable identifiers only.
    Unchecked,
    /// Reject tokens older than the window (or further than
    /// [`FUTURE_SKEW`] in the future).
    Within(Duration),
}

/// A successfully verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub pubkey: Pubkey,
    /// Signed unix timestamp (seconds).
    pub timestamp: u32,
}

/// Verifies signed tokens against the configured auth-token freshness.
#[derive(Debug, Clone, Copy)]
pub struct TokenVerifier {
    auth_freshness: Freshness,
}

impl TokenVerifier {
    pub fn new(auth_freshness: Freshness) -> Self {
        Self { auth_freshness }
    }

    /// The freshness applied by [`TokenVerifier::verify_auth_token`].
    pub fn auth_freshness(&self) -> Freshness {
        self.auth_freshness
    }

    /// Recover the pubkey that signed `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<Pubkey, AuthError> {
        recovery::recover(message, signature)
    }

    /// Recover the signer and require it to be `expected`.
    ///
    /// # Errors
    /// `AuthError::UnexpectedSigner` if the signature is valid but recovers
    /// a different key.
    pub fn verify_expected(
        &self,
        message: &[u8],
        signature: &[u8],
        expected: &Pubkey,
    ) -> Result<(), AuthError> {
        let signer = self.verify(message, signature)?;
        if &signer != expected {
            return Err(AuthError::UnexpectedSigner);
        }
        Ok(())
    }

    /// Verify a request-authentication token using the configured freshness.
    pub fn verify_auth_token(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.verify_token(token, self.auth_freshness)
    }

    /// Verify a durable resource identifier. Freshness is never applied.
    pub fn verify_resource_id(&self, resource_id: &str) -> Result<VerifiedToken, AuthError> {
        self.verify_token(resource_id, Freshness::Unchecked)
    }

    /// Verify a token against an explicit freshness policy at the current time.
    pub fn verify_token(&self, token: &str, freshness: Freshness) -> Result<VerifiedToken, AuthError> {
        self.verify_token_at(token, freshness, chrono::Utc::now().timestamp())
    }

    /// Verify a token as of `now` (unix seconds).
    pub fn verify_token_at(
        &self,
        token: &str,
        freshness: Freshness,
        now: i64,
    ) -> Result<VerifiedToken, AuthError> {
        let raw = codec::decode(token)?;
        let pubkey = self.verify(&raw.timestamp_bytes, &raw.signature)?;
        let timestamp = raw.timestamp();

        if let Freshness::Within(window) = freshness {
            let age = now - i64::from(timestamp);
            let window = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
            let skew = i64::try_from(FUTURE_SKEW.as_secs()).unwrap_or(i64::MAX);
            if age > window || -age > skew {
                tracing::debug!(%pubkey, age, "rejecting token outside freshness window");
                return Err(AuthError::StaleToken);
            }
        }

        Ok(VerifiedToken { pubkey, timestamp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Signer;

    const T: u32 = 1_700_000_000;
    const WINDOW: Duration = Duration::from_secs(300);

    fn signer() -> Signer {
        Signer::from_hex("3333333333333333333333333333333333333333333333333333333333333333").unwrap()
    }

    #[test]
    fn token_recovers_signer_and_timestamp() {
        let signer = signer();
        let token = signer.sign_token(T).unwrap();
        let verifier = TokenVerifier::new(Freshness::Unchecked);

        let verified = verifier.verify_token_at(&token, Freshness::Unchecked, T as i64).unwrap();
        assert_eq!(verified.pubkey, signer.pubkey());
        assert_eq!(verified.timestamp, T);
    }

    #[test]
    fn replay_is_accepted_only_when_unchecked() {
        let signer = signer();
        let token = signer.sign_token(T).unwrap();
        let verifier = TokenVerifier::new(Freshness::Within(WINDOW));
        let later = T as i64 + 301;

        // first use inside the window
        assert!(verifier.verify_token_at(&token, Freshness::Within(WINDOW), T as i64 + 5).is_ok());
        // identical token replayed after the window
        assert_eq!(
            verifier.verify_token_at(&token, Freshness::Within(WINDOW), later),
            Err(AuthError::StaleToken)
        );
        assert_eq!(
            verifier
                .verify_token_at(&token, Freshness::Unchecked, later)
                .unwrap()
                .pubkey,
            signer.pubkey()
        );
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let token = signer().sign_token(T).unwrap();
        let verifier = TokenVerifier::new(Freshness::Within(WINDOW));
        assert!(verifier
            .verify_token_at(&token, Freshness::Within(WINDOW), T as i64 + 300)
            .is_ok());
    }

    #[test]
    fn huge_window_accepts_old_tokens() {
        let token = signer().sign_token(T).unwrap();
        let verifier = TokenVerifier::new(Freshness::Unchecked);
        let window = Freshness::Within(Duration::from_secs(u64::MAX));

        assert!(verifier.verify_token_at(&token, window, T as i64 + 86_400).is_ok());
    }

    #[test]
    fn rejects_timestamps_from_the_future() {
        let token = signer().sign_token(T).unwrap();
        let verifier = TokenVerifier::new(Freshness::Within(WINDOW));

        assert!(verifier
            .verify_token_at(&token, Freshness::Within(WINDOW), T as i64 - 60)
            .is_ok());
        assert_eq!(
            verifier.verify_token_at(&token, Freshness::Within(WINDOW), T as i64 - 61),
            Err(AuthError::StaleToken)
        );
    }

    #[test]
    fn resource_ids_never_expire() {
        let signer = signer();
        let resource_id = signer.sign_token(1).unwrap();
        let verifier = TokenVerifier::new(Freshness::Within(WINDOW));

        let verified = verifier.verify_resource_id(&resource_id).unwrap();
        assert_eq!(verified.pubkey, signer.pubkey());
        // the same token is stale as an auth token
        assert_eq!(verifier.verify_auth_token(&resource_id), Err(AuthError::StaleToken));
    }

    #[test]
    fn minted_resource_id_recovers_signer() {
        let signer = signer();
        let id = signer.mint_resource_id().unwrap();
        let verifier = TokenVerifier::new(Freshness::Unchecked);
        assert_eq!(verifier.verify_resource_id(&id).unwrap().pubkey, signer.pubkey());
    }

    #[test]
    fn malformed_token_is_not_a_signature_error() {
        let verifier = TokenVerifier::new(Freshness::Unchecked);
        assert_eq!(verifier.verify_resource_id("***"), Err(AuthError::MalformedToken));
        // valid base64url, valid length, garbage signature
        let garbage = crate::auth::codec::encode(&T.to_be_bytes(), &[1u8; 10]);
        assert_eq!(verifier.verify_resource_id(&garbage), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn signature_over_other_timestamp_recovers_other_key() {
        let signer = signer();
        let sig = signer.sign_compact(&T.to_be_bytes()).unwrap();
        let forged = crate::auth::codec::encode(&(T + 1).to_be_bytes(), &sig);

        let verifier = TokenVerifier::new(Freshness::Unchecked);
        assert_ne!(
            verifier.verify_resource_id(&forged).map(|v| v.pubkey),
            Ok(signer.pubkey())
        );
    }

    #[test]
    fn verify_expected_distinguishes_signers() {
        let verifier = TokenVerifier::new(Freshness::Unchecked);
        let owner = signer();
        let intruder = Signer::generate().unwrap();
        let sig = intruder.sign_compact(b"edit").unwrap();

        assert_eq!(
            verifier.verify_expected(b"edit", &sig, &owner.pubkey()),
            Err(AuthError::UnexpectedSigner)
        );
        assert!(verifier.verify_expected(b"edit", &sig, &intruder.pubkey()).is_ok());
    }
}
