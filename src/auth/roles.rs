//! Role model and capability sets
//!
//! Three roles with static capabilities. The curation core does not enforce
//! these itself; route handlers consume the capability table when gating
//! requests, and registration consumes the default-role rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User roles, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Viewer,
    Curator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Curator => "curator",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "curator" => Some(Role::Curator),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    /// Static capability set for this role
    pub fn capabilities(&self) -> RoleCapabilities {
        match self {
            Role::Admin => RoleCapabilities {
                can_curate: true,
                can_view_all_records: true,
                can_edit_own_records: true,
                can_edit_all_records: true,
                can_access_admin_panel: true,
                can_manage_users: true,
                description: "Admins have full access to all records, user management, \
                              and administrative settings.",
            },
            Role::Curator => RoleCapabilities {
                can_curate: true,
                can_view_all_records: true,
                can_edit_own_records: true,
                can_edit_all_records: false,
                can_access_admin_panel: false,
                can_manage_users: false,
                description: "Curators can view all records, and curate or edit records \
                              they have created.",
            },
            Role::Viewer => RoleCapabilities {
                can_curate: false,
                can_view_all_records: true,
                can_edit_own_records: false,
                can_edit_all_records: false,
                can_access_admin_panel: false,
                can_manage_users: false,
                description: "Viewers can view all records but cannot curate or edit.",
            },
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static capabilities attached to a role
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCapabilities {
    pub can_curate: bool,
    pub can_view_all_records: bool,
    pub can_edit_own_records: bool,
    pub can_edit_all_records: bool,
    pub can_access_admin_panel: bool,
    pub can_manage_users: bool,
    pub description: &'static str,
}

/// Default role for a newly registered user: the first registered user
/// becomes admin, everyone after that starts as viewer.
pub fn default_role_for_registration(existing_users: u64) -> Role {
    if existing_users == 0 {
        Role::Admin
    } else {
        Role::Viewer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::Curator);
        assert!(Role::Curator > Role::Viewer);
    }

    #[test]
    fn test_capability_table() {
        assert!(Role::Admin.capabilities().can_manage_users);
        assert!(Role::Admin.capabilities().can_edit_all_records);

        let curator = Role::Curator.capabilities();
        assert!(curator.can_curate);
        assert!(curator.can_edit_own_records);
        assert!(!curator.can_edit_all_records);
        assert!(!curator.can_access_admin_panel);

        let viewer = Role::Viewer.capabilities();
        assert!(!viewer.can_curate);
        assert!(viewer.can_view_all_records);
    }

    #[test]
    fn test_first_registered_user_becomes_admin() {
        assert_eq!(default_role_for_registration(0), Role::Admin);
        assert_eq!(default_role_for_registration(1), Role::Viewer);
        assert_eq!(default_role_for_registration(42), Role::Viewer);
    }

    #[test]
    fn test_parse_round_trip() {
        for role in [Role::Admin, Role::Curator, Role::Viewer] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("owner"), None);
    }
}
