// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Control
//!
//! Workspace-scoped role checks.
//!
//! - The workspace owner holds every role without any assignment rows
//! - Everybody else holds exactly the roles granted to them
//! - Roles can only be granted by a member holding `ADD ROLES`, only to
//!   another existing member, and only for roles the granter holds
//!
//! A grant batch is all-or-nothing.

pub mod database;
pub mod error;
pub mod store;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::{Pubkey, Role};

pub use database::RedbRoleStore;
pub use error::AccessError;
pub use store::{
    InMemoryRoleStore, RoleAssignment, RoleStore, StoreError, StoreStats, Workspace,
    WorkspaceMember,
};

/// Answers "may this pubkey do that in this workspace" and applies grants.
pub struct AccessControlEngine {
    store: Arc<dyn RoleStore>,
}

impl AccessControlEngine {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Whether `pubkey` holds `role` in the workspace.
    ///
    /// Unknown workspaces grant nothing.
    pub async fn has_access(&self, pubkey: &Pubkey, workspace_uuid: Uuid, role: Role) -> Result<bool, AccessError> {
        if self.is_owner(pubkey, workspace_uuid).await? {
            return Ok(true);
        }
        let assignments = self.store.roles_for(workspace_uuid, pubkey).await?;
        Ok(assignments.iter().any(|a| a.role == role))
    }

    /// Whether `pubkey` holds every role in `roles`.
    pub async fn has_all(&self, pubkey: &Pubkey, workspace_uuid: Uuid, roles: &[Role]) -> Result<bool, AccessError> {
        let held = self.user_roles(workspace_uuid, pubkey).await?;
        Ok(roles.iter().all(|r| held.contains(r)))
    }

    /// Effective roles of `pubkey`: every role for the owner, else assigned ones.
    pub async fn user_roles(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> Result<Vec<Role>, AccessError> {
        if self.is_owner(pubkey, workspace_uuid).await? {
            return Ok(Role::ALL.to_vec());
        }
        let assignments = self.store.roles_for(workspace_uuid, pubkey).await?;
        Ok(store::distinct_roles(&assignments))
    }

    /// Effective roles of `target`, as requested by `acting`.
    ///
    /// Callers may always see their own roles; anyone else must be the
    /// owner or a member of the workspace.
    pub async fn visible_roles(
        &self,
        acting: &Pubkey,
        workspace_uuid: Uuid,
        target: &Pubkey,
    ) -> Result<Vec<Role>, AccessError> {
        let owner = self.require_workspace(workspace_uuid).await?;
        if acting != target && acting != &owner && !self.store.is_member(workspace_uuid, acting).await? {
            return Err(AccessError::NotWorkspaceMember);
        }
        self.user_roles(workspace_uuid, target).await
    }

    /// Register a new workspace owned by `owner`.
    pub async fn register_workspace(&self, owner: &Pubkey, workspace_uuid: Uuid) -> Result<Workspace, AccessError> {
        let workspace = Workspace {
            uuid: workspace_uuid,
            owner_pubkey: owner.clone(),
            created: Utc::now(),
        };
        if !self.store.create_workspace(workspace.clone()).await? {
            return Err(AccessError::WorkspaceExists);
        }
        tracing::info!(workspace = %workspace_uuid, owner = %owner, "workspace registered");
        Ok(workspace)
    }

    /// Add `target` as a member. Requires `ADD USER`; adding twice is a no-op.
    pub async fn add_member(&self, acting: &Pubkey, workspace_uuid: Uuid, target: &Pubkey) -> Result<(), AccessError> {
        self.require_workspace(workspace_uuid).await?;
        self.require(acting, workspace_uuid, Role::AddUser).await?;

        let added = self
            .store
            .add_member(WorkspaceMember {
                workspace_uuid,
                pubkey: target.clone(),
                added_by: acting.clone(),
                created: Utc::now(),
            })
            .await?;
        if added {
            tracing::info!(workspace = %workspace_uuid, acting = %acting, target = %target, "member added");
        }
        Ok(())
    }

    /// Remove `target` and all of their roles. Requires `DELETE USER`.
    pub async fn remove_member(&self, acting: &Pubkey, workspace_uuid: Uuid, target: &Pubkey) -> Result<(), AccessError> {
        let owner = self.require_workspace(workspace_uuid).await?;
        self.require(acting, workspace_uuid, Role::DeleteUser).await?;
        if &owner == target {
            return Err(AccessError::OwnerImmutable);
        }

        if !self.store.remove_member(workspace_uuid, target).await? {
            return Err(AccessError::NotAMember);
        }
        tracing::info!(workspace = %workspace_uuid, acting = %acting, target = %target, "member removed");
        Ok(())
    }

    /// Grant `role_names` to `target` on behalf of `acting`.
    ///
    /// Checks, in order: self-grant, workspace exists, `acting` holds
    /// `ADD ROLES`, every name is a known role, `acting` holds each role,
    /// `target` is a member. Any failure rejects the whole batch. An empty
    /// batch that passes the checks writes nothing.
    pub async fn add_roles(
        &self,
        acting: &Pubkey,
        target: &Pubkey,
        workspace_uuid: Uuid,
        role_names: &[String],
    ) -> Result<Vec<RoleAssignment>, AccessError> {
        if acting == target {
            tracing::warn!(workspace = %workspace_uuid, pubkey = %acting, "rejected self-grant");
            return Err(AccessError::SelfGrant);
        }
        self.require_workspace(workspace_uuid).await?;
        self.require(acting, workspace_uuid, Role::AddRoles).await?;

        let mut roles = role_names
            .iter()
            .map(|name| name.parse::<Role>().map_err(|_| AccessError::UnknownRole(name.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        roles.sort_unstable();
        roles.dedup();

        let held = self.user_roles(workspace_uuid, acting).await?;
        if let Some(missing) = roles.iter().find(|r| !held.contains(*r)) {
            return Err(AccessError::RoleNotHeld(*missing));
        }

        // Membership is re-checked by the store under the same write as the inserts.
        let granted = self
            .store
            .grant_roles(workspace_uuid, target, &roles, Utc::now())
            .await?
            .ok_or(AccessError::NotAMember)?;

        if !granted.is_empty() {
            tracing::info!(
                workspace = %workspace_uuid,
                acting = %acting,
                target = %target,
                count = granted.len(),
                "roles granted"
            );
        }
        Ok(granted)
    }

    pub async fn workspace(&self, workspace_uuid: Uuid) -> Result<Option<Workspace>, AccessError> {
        Ok(self.store.workspace(workspace_uuid).await?)
    }

    pub async fn stats(&self) -> Result<StoreStats, AccessError> {
        Ok(self.store.stats().await?)
    }

    async fn is_owner(&self, pubkey: &Pubkey, workspace_uuid: Uuid) -> Result<bool, AccessError> {
        let owner = self.store.workspace_owner(workspace_uuid).await?;
        Ok(owner.as_ref() == Some(pubkey))
    }

    async fn require_workspace(&self, workspace_uuid: Uuid) -> Result<Pubkey, AccessError> {
        self.store
            .workspace_owner(workspace_uuid)
            .await?
            .ok_or(AccessError::WorkspaceNotFound)
    }

    async fn require(&self, pubkey: &Pubkey, workspace_uuid: Uuid, role: Role) -> Result<(), AccessError> {
        if !self.has_access(pubkey, workspace_uuid, role).await? {
            return Err(AccessError::InsufficientPermission(role));
        }
        Ok(())
    }
}
