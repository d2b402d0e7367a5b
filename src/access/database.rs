// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded RBAC database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `workspaces`: workspace uuid → serialized Workspace
//! - `members`: composite key (uuid|pubkey) → serialized WorkspaceMember
//! - `role_assignments`: composite key (uuid|pubkey|role) → serialized RoleAssignment
//!
//! Composite keys put every row of one member under a common prefix so
//! lookups and removals are single range scans.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::store::{
    RoleAssignment, RoleStore, StoreResult, StoreStats, Workspace, WorkspaceMember,
};
use crate::auth::{Pubkey, Role};

// =============================================================================
// Table Definitions
// =============================================================================

const WORKSPACES: TableDefinition<&str, &[u8]> = TableDefinition::new("workspaces");

const MEMBERS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("members");

const ROLE_ASSIGNMENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("role_assignments");

// =============================================================================
// Key Helpers
// =============================================================================

/// `uuid|pubkey|`, the prefix shared by a member's rows.
fn make_prefix(workspace_uuid: Uuid, pubkey: &Pubkey) -> Vec<u8> {
    let uuid = workspace_uuid.to_string();
    let mut key = Vec::with_capacity(uuid.len() + 1 + pubkey.as_str().len() + 1);
    key.extend_from_slice(uuid.as_bytes());
    key.push(b'|');
    key.extend_from_slice(pubkey.as_str().as_bytes());
    key.push(b'|');
    key
}

/// Upper bound for a range scan over `make_prefix`.
fn make_prefix_end(workspace_uuid: Uuid, pubkey: &Pubkey) -> Vec<u8> {
    let mut end = make_prefix(workspace_uuid, pubkey);
    end.push(0xFF);
    end
}

fn make_role_key(assignment: &RoleAssignment) -> Vec<u8> {
    let mut key = make_prefix(assignment.workspace_uuid, &assignment.owner_pubkey);
    key.extend_from_slice(assignment.role.as_str().as_bytes());
    key
}

// =============================================================================
// RedbRoleStore
// =============================================================================

/// Durable RBAC store.
pub struct RedbRoleStore {
    db: Database,
}

impl RedbRoleStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WORKSPACES)?;
            let _ = write_txn.open_table(MEMBERS)?;
            let _ = write_txn.open_table(ROLE_ASSIGNMENTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

#[async_trait]
impl RoleStore for RedbRoleStore {
    async fn workspace(&self, workspace_uuid: Uuid) -> StoreResult<Option<Workspace>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WORKSPACES)?;
        match table.get(workspace_uuid.to_string().as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    async fn create_workspace(&self, workspace: Workspace) -> StoreResult<bool> {
        let key = workspace.uuid.to_string();
        let json = serde_json::to_vec(&workspace)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WORKSPACES)?;
            if table.get(key.as_str())?.is_some() {
                return Ok(false);
            }
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    async fn is_member(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> StoreResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMBERS)?;
        let key = make_prefix(workspace_uuid, pubkey);
        Ok(table.get(key.as_slice())?.is_some())
    }

    async fn add_member(&self, member: WorkspaceMember) -> StoreResult<bool> {
        let key = make_prefix(member.workspace_uuid, &member.pubkey);
        let json = serde_json::to_vec(&member)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MEMBERS)?;
            if table.get(key.as_slice())?.is_some() {
                return Ok(false);
            }
            table.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    async fn remove_member(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> StoreResult<bool> {
        let prefix = make_prefix(workspace_uuid, pubkey);
        let prefix_end = make_prefix_end(workspace_uuid, pubkey);

        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut members = write_txn.open_table(MEMBERS)?;
            let removed = members.remove(prefix.as_slice())?.is_some();

            let mut roles = write_txn.open_table(ROLE_ASSIGNMENTS)?;
            let mut keys = Vec::new();
            for entry in roles.range(prefix.as_slice()..prefix_end.as_slice())? {
                let (key, _) = entry?;
                keys.push(key.value().to_vec());
            }
            for key in &keys {
                roles.remove(key.as_slice())?;
            }
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    async fn roles_for(&self, workspace_uuid: Uuid, pubkey: &Pubkey) -> StoreResult<Vec<RoleAssignment>> {
        let prefix = make_prefix(workspace_uuid, pubkey);
        let prefix_end = make_prefix_end(workspace_uuid, pubkey);

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ROLE_ASSIGNMENTS)?;
        let mut results = Vec::new();
        for entry in table.range(prefix.as_slice()..prefix_end.as_slice())? {
            let (_, value) = entry?;
            results.push(serde_json::from_slice(value.value())?);
        }
        Ok(results)
    }

    async fn grant_roles(
        &self,
        workspace_uuid: Uuid,
        target: &Pubkey,
        roles: &[Role],
        created: DateTime<Utc>,
    ) -> StoreResult<Option<Vec<RoleAssignment>>> {
        let member_key = make_prefix(workspace_uuid, target);

        let write_txn = self.db.begin_write()?;
        let granted = {
            let workspaces = write_txn.open_table(WORKSPACES)?;
            let is_owner = match workspaces.get(workspace_uuid.to_string().as_str())? {
                Some(value) => {
                    let workspace: Workspace = serde_json::from_slice(value.value())?;
                    &workspace.owner_pubkey == target
                }
                None => false,
            };
            let members = write_txn.open_table(MEMBERS)?;
            if !is_owner && members.get(member_key.as_slice())?.is_none() {
                return Ok(None);
            }

            let mut table = write_txn.open_table(ROLE_ASSIGNMENTS)?;
            let mut granted = Vec::with_capacity(roles.len());
            for &role in roles {
                let assignment = RoleAssignment {
                    workspace_uuid,
                    owner_pubkey: target.clone(),
                    role,
                    created,
                };
                let key = make_role_key(&assignment);
                let existing = match table.get(key.as_slice())? {
                    Some(value) => Some(serde_json::from_slice::<RoleAssignment>(value.value())?),
                    None => None,
                };
                match existing {
                    Some(stored) => granted.push(stored),
                    None => {
                        let json = serde_json::to_vec(&assignment)?;
                        table.insert(key.as_slice(), json.as_slice())?;
                        granted.push(assignment);
                    }
                }
            }
            granted
        };
        write_txn.commit()?;
        Ok(Some(granted))
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let read_txn = self.db.begin_read()?;
        let workspaces = read_txn.open_table(WORKSPACES)?.iter()?.count();
        let members = read_txn.open_table(MEMBERS)?.iter()?.count();
        let role_assignments = read_txn.open_table(ROLE_ASSIGNMENTS)?.iter()?.count();
        Ok(StoreStats {
            workspaces,
            members,
            role_assignments,
        })
    }
}
