// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `PUBLIC_URL` | Externally reachable base URL (LNURL callback) | `http://localhost:{PORT}` |
//! | `JWT_KEY` | HMAC secret for session JWTs (≥ 32 bytes) | Required |
//! | `SESSION_TTL_SECS` | Session lifetime | `604800` |
//! | `CHALLENGE_TTL_SECS` | Login challenge lifetime | `120` |
//! | `CHALLENGE_CAPACITY` | Max outstanding login challenges | `10000` |
//! | `TOKEN_FRESHNESS_SECS` | Signed auth-token window, `0` disables | `300` |
//! | `ADMINS` | Comma-separated admin pubkeys | empty |
//! | `ROLE_DB_PATH` | redb file for RBAC data | in-memory |
//! | `SIGNER_KEY_PEM` | Path to a PEM server signing key | none |
//! | `SIGNER_KEY_HEX` | Hex server signing key | none |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | Enable HTTPS | plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashSet;
use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::auth::{Freshness, Pubkey};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const PUBLIC_URL_ENV: &str = "PUBLIC_URL";

/// HMAC secret for session JWTs. Rotating it invalidates every session.
pub const JWT_KEY_ENV: &str = "JWT_KEY";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const CHALLENGE_TTL_ENV: &str = "CHALLENGE_TTL_SECS";
pub const CHALLENGE_CAPACITY_ENV: &str = "CHALLENGE_CAPACITY";

/// Freshness window for `token` query parameters. `0` accepts any age.
pub const TOKEN_FRESHNESS_ENV: &str = "TOKEN_FRESHNESS_SECS";
pub const ADMINS_ENV: &str = "ADMINS";
pub const ROLE_DB_PATH_ENV: &str = "ROLE_DB_PATH";
pub const SIGNER_KEY_PEM_ENV: &str = "SIGNER_KEY_PEM";
pub const SIGNER_KEY_HEX_ENV: &str = "SIGNER_KEY_HEX";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 3600);
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(120);
pub const DEFAULT_CHALLENGE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(capacity) => capacity,
    None => panic!("challenge capacity must be non-zero"),
};
pub const DEFAULT_TOKEN_FRESHNESS: Duration = Duration::from_secs(300);

/// Shortest accepted HMAC secret.
pub const MIN_JWT_KEY_LEN: usize = 32;

/// Upper bound for every `*_SECS` setting (ten years).
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("JWT_KEY must be at least {MIN_JWT_KEY_LEN} bytes")]
    WeakJwtKey,

    #[error("invalid admin pubkey in ADMINS: {0}")]
    InvalidAdmin(String),

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}

/// Where the optional server signing key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerKeySource {
    PemFile(PathBuf),
    Hex(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Typed runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub public_url: Url,
    pub jwt_key: Vec<u8>,
    pub session_ttl: Duration,
    pub challenge_ttl: Duration,
    pub challenge_capacity: NonZeroUsize,
    pub token_freshness: Freshness,
    pub admins: HashSet<Pubkey>,
    pub role_db_path: Option<PathBuf>,
    pub signer_key: Option<SignerKeySource>,
    pub tls: Option<TlsPaths>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("public_url", &self.public_url.as_str())
            .field("jwt_key", &"***SECRET***")
            .field("session_ttl", &self.session_ttl)
            .field("challenge_ttl", &self.challenge_ttl)
            .field("challenge_capacity", &self.challenge_capacity)
            .field("token_freshness", &self.token_freshness)
            .field("admins", &self.admins.len())
            .field("role_db_path", &self.role_db_path)
            .field("signer_key", &self.signer_key.as_ref().map(|_| "***SECRET***"))
            .field("tls", &self.tls)
            .finish()
    }
}

impl Config {
    /// Defaults for everything except the session key.
    pub fn with_jwt_key(jwt_key: Vec<u8>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            public_url: default_public_url(DEFAULT_PORT),
            jwt_key,
            session_ttl: DEFAULT_SESSION_TTL,
            challenge_ttl: DEFAULT_CHALLENGE_TTL,
            challenge_capacity: DEFAULT_CHALLENGE_CAPACITY,
            token_freshness: Freshness::Within(DEFAULT_TOKEN_FRESHNESS),
            admins: HashSet::new(),
            role_db_path: None,
            signer_key: None,
            tls: None,
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_key = match get(JWT_KEY_ENV) {
            Some(key) => key.into_bytes(),
            None => dev_jwt_key()?,
        };
        if jwt_key.len() < MIN_JWT_KEY_LEN {
            return Err(ConfigError::WeakJwtKey);
        }

        let mut config = Self::with_jwt_key(jwt_key);

        if let Some(host) = get(HOST_ENV) {
            config.host = host;
        }
        if let Some(port) = get(PORT_ENV) {
            config.port = parse_number(PORT_ENV, &port)?;
        }
        config.public_url = match get(PUBLIC_URL_ENV) {
            Some(raw) => parse_public_url(&raw)?,
            None => default_public_url(config.port),
        };

        if let Some(secs) = get(SESSION_TTL_ENV) {
            config.session_ttl = Duration::from_secs(parse_secs(SESSION_TTL_ENV, &secs)?);
        }
        if let Some(secs) = get(CHALLENGE_TTL_ENV) {
            config.challenge_ttl = Duration::from_secs(parse_secs(CHALLENGE_TTL_ENV, &secs)?);
        }
        if let Some(capacity) = get(CHALLENGE_CAPACITY_ENV) {
            let capacity: usize = parse_number(CHALLENGE_CAPACITY_ENV, &capacity)?;
            config.challenge_capacity =
                NonZeroUsize::new(capacity).ok_or_else(|| ConfigError::Invalid {
                    name: CHALLENGE_CAPACITY_ENV,
                    reason: "must be greater than zero".to_string(),
                })?;
        }
        if let Some(secs) = get(TOKEN_FRESHNESS_ENV) {
            config.token_freshness = match parse_secs(TOKEN_FRESHNESS_ENV, &secs)? {
                0 => Freshness::Unchecked,
                secs => Freshness::Within(Duration::from_secs(secs)),
            };
        }

        if let Some(admins) = get(ADMINS_ENV) {
            config.admins = parse_admins(&admins)?;
        }

        config.role_db_path = get(ROLE_DB_PATH_ENV).map(PathBuf::from);

        config.signer_key = match (get(SIGNER_KEY_PEM_ENV), get(SIGNER_KEY_HEX_ENV)) {
            (Some(path), _) => Some(SignerKeySource::PemFile(PathBuf::from(path))),
            (None, Some(hex)) => Some(SignerKeySource::Hex(hex)),
            (None, None) => None,
        };

        config.tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        Ok(config)
    }

    pub fn is_admin(&self, pubkey: &Pubkey) -> bool {
        self.admins.contains(pubkey)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_public_url(port: u16) -> Url {
    let mut url = Url::parse("http://localhost").expect("literal URL parses");
    let _ = url.set_port(Some(port));
    url
}

fn parse_public_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        name: PUBLIC_URL_ENV,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            name: PUBLIC_URL_ENV,
            reason: "must be an http or https URL".to_string(),
        });
    }
    Ok(url)
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_secs(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let secs: u64 = parse_number(name, raw)?;
    if secs > MAX_DURATION_SECS {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("must be at most {MAX_DURATION_SECS} seconds"),
        });
    }
    Ok(secs)
}

/// Parse a comma-separated admin list. Entries are case-insensitive.
pub fn parse_admins(raw: &str) -> Result<HashSet<Pubkey>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Pubkey::parse(&s.to_lowercase()).map_err(|_| ConfigError::InvalidAdmin(s.to_string()))
        })
        .collect()
}

#[cfg(feature = "dev")]
fn dev_jwt_key() -> Result<Vec<u8>, ConfigError> {
    use ring::rand::{SecureRandom, SystemRandom};

    tracing::warn!("JWT_KEY not set; using an ephemeral key (dev feature). Sessions will not survive restarts.");
    let mut key = vec![0u8; MIN_JWT_KEY_LEN];
    SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| ConfigError::Missing(JWT_KEY_ENV))?;
    Ok(key)
}

#[cfg(not(feature = "dev"))]
fn dev_jwt_key() -> Result<Vec<u8>, ConfigError> {
    Err(ConfigError::Missing(JWT_KEY_ENV))
}
