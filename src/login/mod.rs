// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Login Flow
//!
//! LNURL-auth style challenge/response:
//!
//! 1. The browser asks for a challenge and renders the LNURL as a QR code
//! 2. The wallet signs `k1` and calls back (LUD-04 DER signature, or a
//!    compact recoverable signature posted to the signature endpoint)
//! 3. The challenge moves `Pending → Verified` with the pubkey bound
//! 4. The browser polls; the first poll that sees `Verified` redeems the
//!    challenge for exactly one session
//!
//! Expired challenges are indistinguishable from unknown ones.

pub mod lnurl;
pub mod store;
pub mod sweeper;

use std::sync::Arc;
use std::time::Duration;

use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use url::Url;
use utoipa::ToSchema;

use crate::auth::{AuthError, Pubkey, TokenVerifier};

pub use store::{Challenge, ChallengeStatus, ChallengeStore, InMemoryChallengeStore};
pub use sweeper::ChallengeSweeper;

/// Length of the random challenge in bytes.
pub const K1_LEN: usize = 32;

/// A challenge handed to the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedChallenge {
    /// Hex-encoded 32-byte challenge
    pub k1: String,
    /// Bech32 `LNURL1…` string for the wallet
    pub lnurl: String,
    /// Seconds until the challenge expires
    pub expires_in: u64,
}

/// Read-only view of a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PollResult {
    pub k1: String,
    pub status: ChallengeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<Pubkey>,
}

/// Drives challenges through their lifecycle.
pub struct LoginFlow {
    store: Arc<dyn ChallengeStore>,
    verifier: TokenVerifier,
    callback_base: Url,
    challenge_ttl: Duration,
    rng: SystemRandom,
}

impl LoginFlow {
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        verifier: TokenVerifier,
        public_url: &Url,
        challenge_ttl: Duration,
    ) -> Self {
        Self {
            store,
            verifier,
            callback_base: lnurl::callback_base(public_url),
            challenge_ttl,
            rng: SystemRandom::new(),
        }
    }

    /// Create and store a fresh `Pending` challenge.
    pub async fn issue_challenge(&self) -> Result<IssuedChallenge, AuthError> {
        let mut bytes = [0u8; K1_LEN];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AuthError::Internal("system RNG unavailable".to_string()))?;
        let k1 = hex::encode(bytes);

        self.store.insert(Challenge::pending(k1.clone())).await?;
        let lnurl = lnurl::encode_lnurl(&lnurl::login_url(&self.callback_base, &k1));

        tracing::debug!(k1 = %k1, "issued login challenge");
        Ok(IssuedChallenge {
            k1,
            lnurl,
            expires_in: self.challenge_ttl.as_secs(),
        })
    }

    /// Bind `pubkey` to challenge `k1`. Last write wins.
    pub async fn submit_proof(&self, k1: &str, pubkey: &Pubkey) -> Result<(), AuthError> {
        if !self.store.mark_verified(k1, pubkey).await? {
            return Err(AuthError::ChallengeNotFound);
        }
        tracing::info!(k1 = %k1, pubkey = %pubkey, "login challenge verified");
        Ok(())
    }

    /// Accept a compact recoverable signature over the raw `k1` bytes.
    pub async fn submit_signed_proof(&self, k1: &str, signature: &[u8]) -> Result<Pubkey, AuthError> {
        let k1_bytes = decode_k1(k1)?;
        let pubkey = self.verifier.verify(&k1_bytes, signature)?;
        self.submit_proof(k1, &pubkey).await?;
        Ok(pubkey)
    }

    /// Accept a LUD-04 wallet callback.
    pub async fn verify_lnurl_callback(
        &self,
        k1: &str,
        sig_hex: &str,
        key_hex: &str,
    ) -> Result<Pubkey, AuthError> {
        let pubkey = lnurl::verify_k1_signature(k1, sig_hex, key_hex)?;
        self.submit_proof(k1, &pubkey).await?;
        Ok(pubkey)
    }

    /// Current state of a challenge. Never mutates it.
    pub async fn poll(&self, k1: &str) -> Result<PollResult, AuthError> {
        let challenge = self
            .store
            .get(k1)
            .await?
            .ok_or(AuthError::ChallengeNotFound)?;

        Ok(PollResult {
            k1: challenge.k1,
            status: challenge.status,
            pubkey: challenge.pubkey,
        })
    }

    /// Consume a verified challenge, returning the bound pubkey once.
    pub async fn redeem(&self, k1: &str) -> Result<Pubkey, AuthError> {
        self.store
            .take_verified(k1)
            .await?
            .ok_or(AuthError::ChallengeNotFound)
    }

    /// Drop expired challenges.
    pub async fn purge_expired(&self) -> Result<usize, AuthError> {
        self.store.purge_expired().await
    }

    /// Number of challenges currently held.
    pub async fn outstanding(&self) -> Result<usize, AuthError> {
        self.store.len().await
    }

    pub fn challenge_ttl(&self) -> Duration {
        self.challenge_ttl
    }
}

fn decode_k1(k1: &str) -> Result<[u8; K1_LEN], AuthError> {
    let bytes = hex::decode(k1).map_err(|_| AuthError::ChallengeNotFound)?;
    bytes.try_into().map_err(|_| AuthError::ChallengeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Freshness, Signer};
    use std::num::NonZeroUsize;

    fn flow(ttl: Duration) -> LoginFlow {
        let store = Arc::new(InMemoryChallengeStore::new(NonZeroUsize::new(100).unwrap(), ttl));
        LoginFlow::new(
            store,
            TokenVerifier::new(Freshness::Unchecked),
            &Url::parse("https://auth.example.com").unwrap(),
            ttl,
        )
    }

    #[tokio::test]
    async fn challenge_lifecycle() {
        let flow = flow(Duration::from_secs(120));
        let issued = flow.issue_challenge().await.unwrap();

        assert_eq!(issued.k1.len(), 64);
        assert!(issued.lnurl.starts_with("LNURL1"));
        assert_eq!(issued.expires_in, 120);

        let polled = flow.poll(&issued.k1).await.unwrap();
        assert_eq!(polled.status, ChallengeStatus::Pending);
        assert_eq!(polled.pubkey, None);

        let pubkey = Signer::generate().unwrap().pubkey();
        flow.submit_proof(&issued.k1, &pubkey).await.unwrap();

        let polled = flow.poll(&issued.k1).await.unwrap();
        assert_eq!(polled.status, ChallengeStatus::Verified);
        assert_eq!(polled.pubkey, Some(pubkey));
    }

    #[tokio::test]
    async fn challenges_are_unique() {
        let flow = flow(Duration::from_secs(120));
        let a = flow.issue_challenge().await.unwrap();
        let b = flow.issue_challenge().await.unwrap();
        assert_ne!(a.k1, b.k1);
        assert_eq!(flow.outstanding().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn expired_challenge_is_not_found() {
        let flow = flow(Duration::from_millis(1));
        let issued = flow.issue_challenge().await.unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let pubkey = Signer::generate().unwrap().pubkey();
        assert_eq!(
            flow.submit_proof(&issued.k1, &pubkey).await,
            Err(AuthError::ChallengeNotFound)
        );
        assert_eq!(flow.poll(&issued.k1).await, Err(AuthError::ChallengeNotFound));
    }

    #[tokio::test]
    async fn unknown_challenge_is_not_found() {
        let flow = flow(Duration::from_secs(120));
        let pubkey = Signer::generate().unwrap().pubkey();
        assert_eq!(
            flow.submit_proof("deadbeef", &pubkey).await,
            Err(AuthError::ChallengeNotFound)
        );
    }

    #[tokio::test]
    async fn signed_proof_binds_recovered_key() {
        let flow = flow(Duration::from_secs(120));
        let issued = flow.issue_challenge().await.unwrap();
        let signer = Signer::generate().unwrap();
        let sig = signer.sign_compact(&hex::decode(&issued.k1).unwrap()).unwrap();

        let pubkey = flow.submit_signed_proof(&issued.k1, &sig).await.unwrap();
        assert_eq!(pubkey, signer.pubkey());
        assert_eq!(flow.poll(&issued.k1).await.unwrap().pubkey, Some(signer.pubkey()));
    }

    #[tokio::test]
    async fn signed_proof_rejects_bad_signature() {
        let flow = flow(Duration::from_secs(120));
        let issued = flow.issue_challenge().await.unwrap();

        assert_eq!(
            flow.submit_signed_proof(&issued.k1, &[0u8; 65]).await,
            Err(AuthError::InvalidSignature)
        );
        assert_eq!(
            flow.poll(&issued.k1).await.unwrap().status,
            ChallengeStatus::Pending
        );
    }

    #[tokio::test]
    async fn lnurl_callback_verifies_challenge() {
        use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey};

        let flow = flow(Duration::from_secs(120));
        let issued = flow.issue_challenge().await.unwrap();
        let key = SigningKey::from_slice(&[0x33; 32]).unwrap();
        let sig: Signature = key.sign_prehash(&hex::decode(&issued.k1).unwrap()).unwrap();
        let key_hex = Pubkey::from_verifying_key(key.verifying_key()).to_string();

        let pubkey = flow
            .verify_lnurl_callback(&issued.k1, &hex::encode(sig.to_der().as_bytes()), &key_hex)
            .await
            .unwrap();
        assert_eq!(pubkey.as_str(), key_hex);
        assert_eq!(
            flow.poll(&issued.k1).await.unwrap().status,
            ChallengeStatus::Verified
        );
    }

    #[tokio::test]
    async fn redeem_succeeds_once() {
        let flow = flow(Duration::from_secs(120));
        let issued = flow.issue_challenge().await.unwrap();
        let pubkey = Signer::generate().unwrap().pubkey();

        // pending challenges cannot be redeemed
        assert_eq!(flow.redeem(&issued.k1).await, Err(AuthError::ChallengeNotFound));

        flow.submit_proof(&issued.k1, &pubkey).await.unwrap();
        assert_eq!(flow.redeem(&issued.k1).await.unwrap(), pubkey);
        assert_eq!(flow.redeem(&issued.k1).await, Err(AuthError::ChallengeNotFound));
    }

    #[tokio::test]
    async fn verified_challenge_expires_too() {
        let flow = flow(Duration::from_millis(20));
        let issued = flow.issue_challenge().await.unwrap();
        let pubkey = Signer::generate().unwrap().pubkey();
        flow.submit_proof(&issued.k1, &pubkey).await.unwrap();
        assert_eq!(
            flow.poll(&issued.k1).await.unwrap().status,
            ChallengeStatus::Verified
        );

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(flow.poll(&issued.k1).await, Err(AuthError::ChallengeNotFound));
        assert_eq!(flow.redeem(&issued.k1).await, Err(AuthError::ChallengeNotFound));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_logins_stay_isolated() {
        let flow = Arc::new(flow(Duration::from_secs(120)));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let flow = flow.clone();
            tasks.push(tokio::spawn(async move {
                let issued = flow.issue_challenge().await.unwrap();
                let pubkey = Signer::generate().unwrap().pubkey();
                assert_eq!(
                    flow.poll(&issued.k1).await.unwrap().status,
                    ChallengeStatus::Pending
                );
                flow.submit_proof(&issued.k1, &pubkey).await.unwrap();
                assert_eq!(flow.poll(&issued.k1).await.unwrap().pubkey, Some(pubkey.clone()));
                assert_eq!(flow.redeem(&issued.k1).await.unwrap(), pubkey);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(flow.outstanding().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_proofs_and_redeems_yield_one_session() {
        let flow = Arc::new(flow(Duration::from_secs(120)));
        let issued = flow.issue_challenge().await.unwrap();
        let signers: Vec<Pubkey> = (0..8).map(|_| Signer::generate().unwrap().pubkey()).collect();

        let mut submits = Vec::new();
        for pubkey in signers.clone() {
            let flow = flow.clone();
            let k1 = issued.k1.clone();
            submits.push(tokio::spawn(async move {
                flow.submit_proof(&k1, &pubkey).await.unwrap();
                flow.poll(&k1).await.unwrap()
            }));
        }
        for submit in submits {
            let polled = submit.await.unwrap();
            assert_eq!(polled.status, ChallengeStatus::Verified);
            assert!(signers.contains(polled.pubkey.as_ref().unwrap()));
        }

        let mut redeems = Vec::new();
        for _ in 0..8 {
            let flow = flow.clone();
            let k1 = issued.k1.clone();
            redeems.push(tokio::spawn(async move { flow.redeem(&k1).await }));
        }
        let mut winners = Vec::new();
        for redeem in redeems {
            if let Ok(pubkey) = redeem.await.unwrap() {
                winners.push(pubkey);
            }
        }
        assert_eq!(winners.len(), 1);
        assert!(signers.contains(&winners[0]));
    }
}
