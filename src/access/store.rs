// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RBAC persistence interface and the in-memory implementation.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{Pubkey, Role};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ownership anchor of a workspace. The owner implicitly holds every role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Workspace {
    pub uuid: Uuid,
    pub owner_pubkey: Pubkey,
    pub created: DateTime<Utc>,
}

/// Membership of a pubkey in a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceMember {
    pub workspace_uuid: Uuid,
    pub pubkey: Pubkey,
    /// Pubkey of the member who added this one
    pub added_by: Pubkey,
    pub created: DateTime<Utc>,
}

/// A role granted to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleAssignment {
    pub workspace_uuid: Uuid,
    /// The member holding the role
    pub owner_pubkey: Pubkey,
    pub role: Role,
    pub created: DateTime<Utc>,
}

/// Row counts, for the admin stats endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoreStats {
    pub workspaces: usize,
    pub members: usize,
    pub role_assignments: usize,
}

/// Storage backend for workspaces, members and role assignments.
///
/// Every mutating call is atomic on its own: it either applies completely
/// or not at all.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// The workspace anchor, if registered.
    async fn workspace(&self, workspace_uuid: Uuid) -> StoreResult<Option<Workspace>>;

    /// Owner of the workspace, if registered.
    async fn workspace_owner(&self, workspace_uuid: Uuid) -> StoreResult<Option<Pubkey>> {
        Ok(self.workspace(workspace_uuid).await?.map(|ws| ws.owner_pubkey))
    }

    /// Register a workspace. Returns `false` if the uuid is taken.
    async fn create_workspace(&self, workspace: Workspace) -> StoreResult<bool>;

    async fn is_member(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> StoreResult<bool>;

    /// Add a member. Returns `false` if already a member.
    async fn add_member(&self, member: WorkspaceMember) -> StoreResult<bool>;

    /// Remove a member together with all of their role assignments.
    /// Returns `false` if they were not a member.
    async fn remove_member(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> StoreResult<bool>;

    /// Roles assigned to `pubkey` in the workspace (owner bypass not applied).
    async fn roles_for(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> StoreResult<Vec<RoleAssignment>>;

    /// Grant `roles` to `target` if, at write time, they are a member or the
    /// owner of the workspace. The membership check and the inserts happen
    /// under one lock or transaction, so a concurrent `remove_member` can
    /// never leave rows behind.
    ///
    /// Returns the stored rows (an existing identical grant keeps its row),
    /// or `None` with nothing written when `target` is not a member.
    async fn grant_roles(
        &self,
        workspace_uuid: Uuid,
        target: &Pubkey,
        roles: &[Role],
        created: DateTime<Utc>,
    ) -> StoreResult<Option<Vec<RoleAssignment>>>;

    async fn stats(&self) -> StoreResult<StoreStats>;
}

#[derive(Default)]
struct Tables {
    workspaces: HashMap<Uuid, Workspace>,
    members: HashMap<(Uuid, Pubkey), WorkspaceMember>,
    roles: BTreeMap<(Uuid, Pubkey, Role), RoleAssignment>,
}

/// RBAC data held in process memory. Lost on restart.
#[derive(Default)]
pub struct InMemoryRoleStore {
    tables: RwLock<Tables>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn workspace(&self, workspace_uuid: Uuid) -> StoreResult<Option<Workspace>> {
        Ok(self.tables.read().await.workspaces.get(&workspace_uuid).cloned())
    }

    async fn create_workspace(&self, workspace: Workspace) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.workspaces.contains_key(&workspace.uuid) {
            return Ok(false);
        }
        tables.workspaces.insert(workspace.uuid, workspace);
        Ok(true)
    }

    async fn is_member(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> StoreResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .members
            .contains_key(&(workspace_uuid, pubkey.clone())))
    }

    async fn add_member(&self, member: WorkspaceMember) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let key = (member.workspace_uuid, member.pubkey.clone());
        if tables.members.contains_key(&key) {
            return Ok(false);
        }
        tables.members.insert(key, member);
        Ok(true)
    }

    async fn remove_member(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .members
            .remove(&(workspace_uuid, pubkey.clone()))
            .is_some();
        tables
            .roles
            .retain(|(ws, holder, _), _| !(*ws == workspace_uuid && holder == pubkey));
        Ok(removed)
    }

    async fn roles_for(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> StoreResult<Vec<RoleAssignment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .values()
            .filter(|a| a.workspace_uuid == workspace_uuid && &a.owner_pubkey == pubkey)
            .cloned()
            .collect())
    }

    async fn grant_roles(
        &self,
        workspace_uuid: Uuid,
        target: &Pubkey,
        roles: &[Role],
        created: DateTime<Utc>,
    ) -> StoreResult<Option<Vec<RoleAssignment>>> {
        let mut tables = self.tables.write().await;
        let is_owner = tables
            .workspaces
            .get(&workspace_uuid)
            .is_some_and(|ws| &ws.owner_pubkey == target);
        if !is_owner && !tables.members.contains_key(&(workspace_uuid, target.clone())) {
            return Ok(None);
        }

        let granted = roles
            .iter()
            .map(|&role| {
                tables
                    .roles
                    .entry((workspace_uuid, target.clone(), role))
                    .or_insert_with(|| RoleAssignment {
                        workspace_uuid,
                        owner_pubkey: target.clone(),
                        role,
                        created,
                    })
                    .clone()
            })
            .collect();
        Ok(Some(granted))
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let tables = self.tables.read().await;
        Ok(StoreStats {
            workspaces: tables.workspaces.len(),
            members: tables.members.len(),
            role_assignments: tables.roles.len(),
        })
    }
}

/// Distinct roles in a list of assignments, in registry order.
pub fn distinct_roles(assignments: &[RoleAssignment]) -> Vec<Role> {
    let held: HashSet<Role> = assignments.iter().map(|a| a.role).collect();
    Role::ALL.into_iter().filter(|r| held.contains(r)).collect()
}
