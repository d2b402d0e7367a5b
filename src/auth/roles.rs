// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Workspace roles.
//!
//! The registry is closed and process-wide. Workspace owners implicitly hold
//! every role; everybody else holds exactly the roles granted to them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A name that is not in the role registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRoleName(pub String);

/// A workspace-scoped permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Role {
    #[serde(rename = "ADD BOUNTY")]
    AddBounty,
    #[serde(rename = "UPDATE BOUNTY")]
    UpdateBounty,
    #[serde(rename = "DELETE BOUNTY")]
    DeleteBounty,
    #[serde(rename = "PAY BOUNTY")]
    PayBounty,
    #[serde(rename = "ADD USER")]
    AddUser,
    #[serde(rename = "UPDATE USER")]
    UpdateUser,
    #[serde(rename = "DELETE USER")]
    DeleteUser,
    /// Grant roles to other members
    #[serde(rename = "ADD ROLES")]
    AddRoles,
    #[serde(rename = "ADD BUDGET")]
    AddBudget,
    #[serde(rename = "WITHDRAW BUDGET")]
    WithdrawBudget,
    #[serde(rename = "VIEW REPORT")]
    ViewReport,
    #[serde(rename = "EDIT WORKSPACE")]
    EditWorkspace,
}

impl Role {
    /// Every role in the registry, in display order.
    pub const ALL: [Role; 12] = [
        Role::AddBounty,
        Role::UpdateBounty,
        Role::DeleteBounty,
        Role::PayBounty,
        Role::AddUser,
        Role::UpdateUser,
        Role::DeleteUser,
        Role::AddRoles,
        Role::AddBudget,
        Role::WithdrawBudget,
        Role::ViewReport,
        Role::EditWorkspace,
    ];

    /// Roles needed to create, edit, delete and pay out bounties.
    pub const MANAGE_BOUNTIES: [Role; 4] = [
        Role::AddBounty,
        Role::UpdateBounty,
        Role::DeleteBounty,
        Role::PayBounty,
    ];

    /// The wire name, e.g. `"ADD BOUNTY"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::AddBounty => "ADD BOUNTY",
            Role::UpdateBounty => "UPDATE BOUNTY",
            Role::DeleteBounty => "DELETE BOUNTY",
            Role::PayBounty => "PAY BOUNTY",
            Role::AddUser => "ADD USER",
            Role::UpdateUser => "UPDATE USER",
            Role::DeleteUser => "DELETE USER",
            Role::AddRoles => "ADD ROLES",
            Role::AddBudget => "ADD BUDGET",
            Role::WithdrawBudget => "WITHDRAW BUDGET",
            Role::ViewReport => "VIEW REPORT",
            Role::EditWorkspace => "EDIT WORKSPACE",
        }
    }
}

/// Parses a wire name (case-insensitive, surrounding whitespace ignored).
impl FromStr for Role {
    type Err = UnknownRoleName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownRoleName(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("ADD BOUNTY".parse(), Ok(Role::AddBounty));
        assert_eq!("add roles".parse(), Ok(Role::AddRoles));
        assert_eq!(" VIEW REPORT ".parse(), Ok(Role::ViewReport));
        assert_eq!(
            "ADD_BOUNTY".parse::<Role>(),
            Err(UnknownRoleName("ADD_BOUNTY".to_string()))
        );
        assert!("SUPERUSER".parse::<Role>().is_err());
    }

    #[test]
    fn display_matches_serde_name() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
            assert_eq!(role.to_string().parse(), Ok(role));
        }
    }

    #[test]
    fn registry_has_no_duplicates() {
        let mut names: Vec<_> = Role::ALL.iter().map(Role::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Role::ALL.len());
    }
}
