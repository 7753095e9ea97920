use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Atomic capability checked against a member's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Permission {
    OrganizationsRead,
    OrganizationsUpdate,
    OrganizationsDelete,

    MembersRead,
    MembersInvite,
    MembersUpdate,
    MembersRemove,

    RolesRead,
    RolesCreate,
    RolesUpdate,
    RolesDelete,

    WorkspacesRead,
    WorkspacesCreate,
    WorkspacesUpdate,
    WorkspacesDelete,
    WorkspacesMembers,

    TeamsRead,
    TeamsCreate,
    TeamsUpdate,
    TeamsDelete,
    TeamsMembers,

    ProjectsRead,
    ProjectsCreate,
    ProjectsUpdate,
    ProjectsDelete,
    ProjectsMembers,
}

impl Permission {
    pub const ALL: [Permission; 26] = [
        Permission::OrganizationsRead,
        Permission::OrganizationsUpdate,
        Permission::OrganizationsDelete,
        Permission::MembersRead,
        Permission::MembersInvite,
        Permission::MembersUpdate,
        Permission::MembersRemove,
        Permission::RolesRead,
        Permission::RolesCreate,
        Permission::RolesUpdate,
        Permission::RolesDelete,
        Permission::WorkspacesRead,
        Permission::WorkspacesCreate,
        Permission::WorkspacesUpdate,
        Permission::WorkspacesDelete,
        Permission::WorkspacesMembers,
        Permission::TeamsRead,
        Permission::TeamsCreate,
        Permission::TeamsUpdate,
        Permission::TeamsDelete,
        Permission::TeamsMembers,
        Permission::ProjectsRead,
        Permission::ProjectsCreate,
        Permission::ProjectsUpdate,
        Permission::ProjectsDelete,
        Permission::ProjectsMembers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::OrganizationsRead => "organizations:read",
            Permission::OrganizationsUpdate => "organizations:update",
            Permission::OrganizationsDelete => "organizations:delete",
            Permission::MembersRead => "members:read",
            Permission::MembersInvite => "members:invite",
            Permission::MembersUpdate => "members:update",
            Permission::MembersRemove => "members:remove",
            Permission::RolesRead => "roles:read",
            Permission::RolesCreate => "roles:create",
            Permission::RolesUpdate => "roles:update",
            Permission::RolesDelete => "roles:delete",
            Permission::WorkspacesRead => "workspaces:read",
            Permission::WorkspacesCreate => "workspaces:create",
            Permission::WorkspacesUpdate => "workspaces:update",
            Permission::WorkspacesDelete => "workspaces:delete",
            Permission::WorkspacesMembers => "workspaces:members",
            Permission::TeamsRead => "teams:read",
            Permission::TeamsCreate => "teams:create",
            Permission::TeamsUpdate => "teams:update",
            Permission::TeamsDelete => "teams:delete",
            Permission::TeamsMembers => "teams:members",
            Permission::ProjectsRead => "projects:read",
            Permission::ProjectsCreate => "projects:create",
            Permission::ProjectsUpdate => "projects:update",
            Permission::ProjectsDelete => "projects:delete",
            Permission::ProjectsMembers => "projects:members",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Permission::OrganizationsRead => "View the organization",
            Permission::OrganizationsUpdate => "Rename or describe the organization",
            Permission::OrganizationsDelete => "Delete the organization and everything in it",
            Permission::MembersRead => "List organization members and invitations",
            Permission::MembersInvite => "Invite users into the organization",
            Permission::MembersUpdate => "Change the role of a member",
            Permission::MembersRemove => "Remove members from the organization",
            Permission::RolesRead => "List roles and their permissions",
            Permission::RolesCreate => "Create organization roles",
            Permission::RolesUpdate => "Edit organization roles",
            Permission::RolesDelete => "Delete organization roles",
            Permission::WorkspacesRead => "View workspaces",
            Permission::WorkspacesCreate => "Create workspaces",
            Permission::WorkspacesUpdate => "Edit workspaces",
            Permission::WorkspacesDelete => "Delete workspaces",
            Permission::WorkspacesMembers => "Manage workspace membership",
            Permission::TeamsRead => "View teams",
            Permission::TeamsCreate => "Create teams",
            Permission::TeamsUpdate => "Edit teams",
            Permission::TeamsDelete => "Delete teams",
            Permission::TeamsMembers => "Manage team membership",
            Permission::ProjectsRead => "View projects",
            Permission::ProjectsCreate => "Create projects",
            Permission::ProjectsUpdate => "Edit projects",
            Permission::ProjectsDelete => "Delete projects",
            Permission::ProjectsMembers => "Manage project membership",
        }
    }

    pub fn is_read(&self) -> bool {
        self.as_str().ends_with(":read")
    }

    /// Slugs granted to the system `default` role.
    pub fn read_only() -> Vec<Permission> {
        Self::ALL.iter().copied().filter(Permission::is_read).collect()
    }

    /// Parses every slug, failing on the first unknown one.
    pub fn parse_all<S: AsRef<str>>(slugs: &[S]) -> Result<Vec<Permission>, PermissionParseError> {
        let mut out: Vec<Permission> = Vec::with_capacity(slugs.len());
        for slug in slugs {
            let permission = slug.as_ref().parse()?;
            if !out.contains(&permission) {
                out.push(permission);
            }
        }
        Ok(out)
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim();
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == slug)
            .ok_or_else(|| PermissionParseError(s.to_string()))
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(p: Permission) -> Self {
        p.as_str().to_string()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown permission: {0}")]
pub struct PermissionParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_slug_parses_back() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
        }
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs: Vec<&str> = Permission::ALL.iter().map(|p| p.as_str()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), Permission::ALL.len());
    }

    #[test]
    fn rejects_unknown_slug() {
        let err = "roles:explode".parse::<Permission>().unwrap_err();
        assert_eq!(err.0, "roles:explode");
    }

    #[test]
    fn parse_all_dedups_and_fails_fast() {
        let parsed = Permission::parse_all(&["roles:read", "roles:read", "teams:create"]).unwrap();
        assert_eq!(parsed, vec![Permission::RolesRead, Permission::TeamsCreate]);
        assert!(Permission::parse_all(&["roles:read", "nope"]).is_err());
    }

    #[test]
    fn read_only_set() {
        let read = Permission::read_only();
        assert_eq!(read.len(), 6);
        assert!(read.iter().all(Permission::is_read));
    }

    #[test]
    fn serializes_as_slug() {
        let v = serde_json::to_value(Permission::MembersInvite).unwrap();
        assert_eq!(v, serde_json::json!("members:invite"));
        let p: Permission = serde_json::from_value(serde_json::json!("projects:members")).unwrap();
        assert_eq!(p, Permission::ProjectsMembers);
    }
}
