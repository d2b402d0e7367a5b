// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::access::{AccessControlEngine, InMemoryRoleStore, RoleStore};
use crate::auth::{SessionIssuer, Signer, TokenVerifier};
use crate::config::Config;
use crate::login::{ChallengeStore, InMemoryChallengeStore, LoginFlow};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: TokenVerifier,
    pub sessions: Arc<SessionIssuer>,
    pub login: Arc<LoginFlow>,
    pub access: Arc<AccessControlEngine>,
    /// Server signing key for minting resource ids, if configured
    pub signer: Option<Arc<Signer>>,
}

impl AppState {
    pub fn new(
        config: Config,
        challenges: Arc<dyn ChallengeStore>,
        roles: Arc<dyn RoleStore>,
        signer: Option<Signer>,
    ) -> Self {
        let verifier = TokenVerifier::new(config.token_freshness);
        let sessions = SessionIssuer::new(&config.jwt_key, config.session_ttl);
        let login = LoginFlow::new(challenges, verifier, &config.public_url, config.challenge_ttl);

        Self {
            verifier,
            sessions: Arc::new(sessions),
            login: Arc::new(login),
            access: Arc::new(AccessControlEngine::new(roles)),
            signer: signer.map(Arc::new),
            config: Arc::new(config),
        }
    }

    /// State with in-memory challenge and role stores and no signer.
    pub fn in_memory(config: Config) -> Self {
        let challenges = InMemoryChallengeStore::new(config.challenge_capacity, config.challenge_ttl);
        Self::new(
            config,
            Arc::new(challenges),
            Arc::new(InMemoryRoleStore::new()),
            None,
        )
    }

    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }
}
