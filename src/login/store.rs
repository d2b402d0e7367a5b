// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge storage for the login flow.
//!
//! Challenges are short-lived and only need to survive one wallet round
//! trip. The in-memory store is capacity-bounded with a per-entry TTL and
//! never evicts a live challenge to make room. A shared backend can replace
//! it for multi-instance deployments by implementing [`ChallengeStore`].

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AuthError, Pubkey};

/// Lifecycle of a login challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    /// Issued, waiting for the wallet's proof
    Pending,
    /// Proof accepted; `pubkey` is bound
    Verified,
}

/// A login challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// 32 random bytes, lower-case hex
    pub k1: String,
    pub status: ChallengeStatus,
    pub pubkey: Option<Pubkey>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn pending(k1: String) -> Self {
        Self {
            k1,
            status: ChallengeStatus::Pending,
            pubkey: None,
            created_at: Utc::now(),
        }
    }
}

/// Storage backend for login challenges.
///
/// Expired entries must behave exactly like absent ones.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Store a new challenge.
    ///
    /// Fails with [`AuthError::ChallengeStoreFull`] when no room can be
    /// made without dropping a live challenge.
    async fn insert(&self, challenge: Challenge) -> Result<(), AuthError>;

    /// Fetch a live challenge.
    async fn get(&self, k1: &str) -> Result<Option<Challenge>, AuthError>;

    /// Bind `pubkey` and mark the challenge verified.
    ///
    /// Returns `false` if the challenge is absent or expired. Re-verifying
    /// overwrites the bound pubkey.
    async fn mark_verified(&self, k1: &str, pubkey: &Pubkey) -> Result<bool, AuthError>;

    /// Remove a verified challenge and return its pubkey.
    ///
    /// Pending challenges are left in place and yield `None`.
    async fn take_verified(&self, k1: &str) -> Result<Option<Pubkey>, AuthError>;

    /// Drop every expired challenge, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, AuthError>;

    /// Number of stored challenges, including not-yet-purged expired ones.
    async fn len(&self) -> Result<usize, AuthError>;
}

struct Entry {
    challenge: Challenge,
    inserted_at: Instant,
}

/// In-process challenge store.
///
/// When full, expired entries are purged; if every slot is still live the
/// insert is refused.
pub struct InMemoryChallengeStore {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl InMemoryChallengeStore {
    /// Create a store holding at most `capacity` challenges for `ttl` each.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, Entry>>, AuthError> {
        self.entries
            .lock()
            .map_err(|_| AuthError::Internal("challenge store lock poisoned".to_string()))
    }

    fn is_live(&self, entry: &Entry) -> bool {
        entry.inserted_at.elapsed() < self.ttl
    }

    fn drop_expired(&self, entries: &mut LruCache<String, Entry>) -> usize {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !self.is_live(entry))
            .map(|(k1, _)| k1.clone())
            .collect();
        for k1 in &expired {
            entries.pop(k1);
        }
        expired.len()
    }
}

#[async_trait]
impl ChallengeStore for InMemoryChallengeStore {
    async fn insert(&self, challenge: Challenge) -> Result<(), AuthError> {
        let mut entries = self.lock()?;
        if entries.len() >= entries.cap().get() && !entries.contains(&challenge.k1) {
            self.drop_expired(&mut entries);
            if entries.len() >= entries.cap().get() {
                tracing::warn!(capacity = entries.cap().get(), "challenge store full");
                return Err(AuthError::ChallengeStoreFull);
            }
        }
        entries.put(
            challenge.k1.clone(),
            Entry {
                challenge,
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, k1: &str) -> Result<Option<Challenge>, AuthError> {
        let mut entries = self.lock()?;
        let live = entries
            .peek(k1)
            .map(|entry| self.is_live(entry).then(|| entry.challenge.clone()));
        match live {
            Some(Some(challenge)) => Ok(Some(challenge)),
            Some(None) => {
                // Expired; remove it
                entries.pop(k1);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn mark_verified(&self, k1: &str, pubkey: &Pubkey) -> Result<bool, AuthError> {
        let mut entries = self.lock()?;
        let live = entries.peek(k1).map(|e| self.is_live(e));
        match live {
            Some(true) => {
                if let Some(entry) = entries.get_mut(k1) {
                    entry.challenge.status = ChallengeStatus::Verified;
                    entry.challenge.pubkey = Some(pubkey.clone());
                }
                Ok(true)
            }
            Some(false) => {
                entries.pop(k1);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn take_verified(&self, k1: &str) -> Result<Option<Pubkey>, AuthError> {
        let mut entries = self.lock()?;
        let Some(entry) = entries.peek(k1) else {
            return Ok(None);
        };
        if !self.is_live(entry) {
            entries.pop(k1);
            return Ok(None);
        }
        if entry.challenge.status != ChallengeStatus::Verified {
            return Ok(None);
        }
        Ok(entries.pop(k1).and_then(|e| e.challenge.pubkey))
    }

    async fn purge_expired(&self) -> Result<usize, AuthError> {
        let mut entries = self.lock()?;
        Ok(self.drop_expired(&mut entries))
    }

    async fn len(&self) -> Result<usize, AuthError> {
        Ok(self.lock()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Signer;

    fn store(ttl: Duration) -> InMemoryChallengeStore {
        InMemoryChallengeStore::new(NonZeroUsize::new(16).unwrap(), ttl)
    }

    #[tokio::test]
    async fn verify_then_take_once() {
        let store = store(Duration::from_secs(120));
        let pubkey = Signer::generate().unwrap().pubkey();
        store.insert(Challenge::pending("aa".into())).await.unwrap();

        // pending challenges cannot be taken
        assert_eq!(store.take_verified("aa").await.unwrap(), None);
        assert!(store.mark_verified("aa", &pubkey).await.unwrap());

        let challenge = store.get("aa").await.unwrap().unwrap();
        assert_eq!(challenge.status, ChallengeStatus::Verified);
        assert_eq!(challenge.pubkey.as_ref(), Some(&pubkey));

        assert_eq!(store.take_verified("aa").await.unwrap(), Some(pubkey));
        assert_eq!(store.take_verified("aa").await.unwrap(), None);
        assert!(store.get("aa").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reverification_overwrites_pubkey() {
        let store = store(Duration::from_secs(120));
        let first = Signer::generate().unwrap().pubkey();
        let second = Signer::generate().unwrap().pubkey();
        store.insert(Challenge::pending("bb".into())).await.unwrap();

        assert!(store.mark_verified("bb", &first).await.unwrap());
        assert!(store.mark_verified("bb", &second).await.unwrap());
        assert_eq!(store.get("bb").await.unwrap().unwrap().pubkey, Some(second));
    }

    #[tokio::test]
    async fn unknown_challenge_cannot_be_verified() {
        let store = store(Duration::from_secs(120));
        let pubkey = Signer::generate().unwrap().pubkey();
        assert!(!store.mark_verified("missing", &pubkey).await.unwrap());
    }

    #[tokio::test]
    async fn expired_challenges_look_absent() {
        let store = store(Duration::from_millis(1));
        let pubkey = Signer::generate().unwrap().pubkey();
        store.insert(Challenge::pending("cc".into())).await.unwrap();

        // Wait for TTL to expire
        std::thread::sleep(Duration::from_millis(5));

        assert!(store.get("cc").await.unwrap().is_none());
        assert!(!store.mark_verified("cc", &pubkey).await.unwrap());
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let store = store(Duration::from_millis(20));
        store.insert(Challenge::pending("old".into())).await.unwrap();
        std::thread::sleep(Duration::from_millis(30));
        store.insert(Challenge::pending("new".into())).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await.unwrap(), 1);
        assert!(store.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn full_store_refuses_instead_of_evicting() {
        let store = InMemoryChallengeStore::new(NonZeroUsize::new(2).unwrap(), Duration::from_secs(120));
        let pubkey = Signer::generate().unwrap().pubkey();
        store.insert(Challenge::pending("one".into())).await.unwrap();
        store.mark_verified("one", &pubkey).await.unwrap();
        store.insert(Challenge::pending("two".into())).await.unwrap();

        let err = store.insert(Challenge::pending("three".into())).await.unwrap_err();
        assert_eq!(err, AuthError::ChallengeStoreFull);

        assert_eq!(store.len().await.unwrap(), 2);
        let kept = store.get("one").await.unwrap().unwrap();
        assert_eq!(kept.status, ChallengeStatus::Verified);
        assert!(store.get("three").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn full_store_reclaims_expired_slots() {
        let store = InMemoryChallengeStore::new(NonZeroUsize::new(2).unwrap(), Duration::from_millis(20));
        store.insert(Challenge::pending("one".into())).await.unwrap();
        store.insert(Challenge::pending("two".into())).await.unwrap();
        std::thread::sleep(Duration::from_millis(30));

        store.insert(Challenge::pending("three".into())).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        assert!(store.get("three").await.unwrap().is_some());
    }
}
