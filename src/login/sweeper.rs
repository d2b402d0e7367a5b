// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Challenge Sweeper
//!
//! Background task that periodically purges expired login challenges so
//! abandoned QR codes do not hold capacity until the store fills up.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::LoginFlow;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically removes expired challenges.
pub struct ChallengeSweeper {
    login: Arc<LoginFlow>,
    interval: Duration,
}

impl ChallengeSweeper {
    pub fn new(login: Arc<LoginFlow>, interval: Duration) -> Self {
        Self { login, interval }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Challenge sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Challenge sweeper shutting down");
                return;
            }

            self.sweep_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Challenge sweeper shutting down");
                    return;
                }
            }
        }
    }

    async fn sweep_step(&self) {
        match self.login.purge_expired().await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "Challenge sweeper: purged expired challenges"),
            Err(e) => warn!(error = %e, "Challenge sweeper: purge failed"),
        }
    }
}
