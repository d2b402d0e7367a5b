// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tribes Auth - Pubkey Authentication & Workspace RBAC Service
//!
//! Identities are secp256k1 public keys recovered from compact signatures.
//! Users log in by signing an LNURL-auth challenge and receive a JWT
//! session; workspaces grant them roles.
//!
//! ## Modules
//!
//! - `auth` - Signature codec, pubkey recovery, sessions and extractors
//! - `login` - Challenge store and LNURL-auth login flow
//! - `access` - Workspace role store and access control engine
//! - `api` - HTTP API handlers (Axum)

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod login;
pub mod state;
