// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;

use tribes_auth::{
    access::{InMemoryRoleStore, RedbRoleStore, RoleStore},
    api::router,
    auth::Signer,
    config::{Config, SignerKeySource},
    logging::{init_tracing, LogFormat},
    login::{
        sweeper::DEFAULT_SWEEP_INTERVAL, ChallengeStore, ChallengeSweeper, InMemoryChallengeStore,
    },
    state::AppState,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(LogFormat::from_env());

    let config = Config::from_env()?;
    tracing::info!(?config, "configuration loaded");

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    let signer = match &config.signer_key {
        Some(SignerKeySource::PemFile(path)) => Some(Signer::from_pem(&std::fs::read(path)?)?),
        Some(SignerKeySource::Hex(key)) => Some(Signer::from_hex(key)?),
        None => None,
    };
    if let Some(signer) = &signer {
        tracing::info!(pubkey = %signer.pubkey(), "server signing key loaded");
    }

    let roles: Arc<dyn RoleStore> = match &config.role_db_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "opening role database");
            Arc::new(RedbRoleStore::open(path)?)
        }
        None => {
            tracing::warn!("ROLE_DB_PATH not set; workspace roles are kept in memory only");
            Arc::new(InMemoryRoleStore::new())
        }
    };
    let challenges: Arc<dyn ChallengeStore> = Arc::new(InMemoryChallengeStore::new(
        config.challenge_capacity,
        config.challenge_ttl,
    ));

    let addr: SocketAddr = config.bind_address().parse()?;
    let tls = config.tls.clone();

    let state = AppState::new(config, challenges, roles, signer);

    let shutdown = CancellationToken::new();
    let sweeper = ChallengeSweeper::new(state.login.clone(), DEFAULT_SWEEP_INTERVAL);
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.clone()));

    let handle: Handle<SocketAddr> = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone(), shutdown.clone()));

    let app = router(state);

    match tls {
        Some(paths) => {
            let tls_config = RustlsConfig::from_pem_file(&paths.cert, &paths.key).await?;
            tracing::info!(%addr, "listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::warn!(%addr, "TLS not configured; listening on plain http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    shutdown.cancel();
    sweeper_task.await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal(handle: Handle<SocketAddr>, shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received, draining connections");
    shutdown.cancel();
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
