use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::permission::{Permission, PermissionParseError};

/// Fixed id of the system `admin` role (every permission).
pub const ADMIN_ROLE_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);
/// Fixed id of the system `default` role (read-only permissions).
pub const DEFAULT_ROLE_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0002);

pub const ADMIN_ROLE_NAME: &str = "admin";
pub const DEFAULT_ROLE_NAME: &str = "default";

pub fn is_system_role_name(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    name == ADMIN_ROLE_NAME || name == DEFAULT_ROLE_NAME
}

/// Ordered, duplicate-free set of permissions granted by a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(Vec<Permission>);

impl PermissionSet {
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Self {
        let mut out: Vec<Permission> = Vec::new();
        for p in permissions {
            if !out.contains(&p) {
                out.push(p);
            }
        }
        Self(out)
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn slugs(&self) -> Vec<String> {
        self.0.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl TryFrom<Vec<String>> for PermissionSet {
    type Error = PermissionParseError;

    fn try_from(slugs: Vec<String>) -> Result<Self, Self::Error> {
        Ok(Self::new(Permission::parse_all(&slugs)?))
    }
}

/// Roles come from the `roles_with_permissions` view, which folds the
/// `role_permissions` rows into a text array.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    /// `None` for system roles shared by every organization.
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    #[sqlx(try_from = "Vec<String>")]
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(
        organization_id: Uuid,
        name: impl Into<String>,
        description: Option<String>,
        permissions: PermissionSet,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: Some(organization_id),
            name: name.into(),
            description,
            is_system: false,
            permissions,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn system_admin() -> Self {
        Self::system(ADMIN_ROLE_ID, ADMIN_ROLE_NAME, "Full access to the organization", Permission::ALL.to_vec())
    }

    pub fn system_default() -> Self {
        Self::system(DEFAULT_ROLE_ID, DEFAULT_ROLE_NAME, "Read-only access to the organization", Permission::read_only())
    }

    fn system(id: Uuid, name: &str, description: &str, permissions: Vec<Permission>) -> Self {
        let now = Utc::now();
        Self {
            id,
            organization_id: None,
            name: name.to_string(),
            description: Some(description.to_string()),
            is_system: true,
            permissions: PermissionSet::new(permissions),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.updated_at = Utc::now();
    }

    pub fn set_permissions(&mut self, permissions: PermissionSet) {
        self.permissions = permissions;
        self.updated_at = Utc::now();
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// System roles are visible everywhere; custom roles only in their own organization.
    pub fn is_visible_to(&self, organization_id: Uuid) -> bool {
        match self.organization_id {
            None => self.is_system,
            Some(owner) => owner == organization_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_roles() {
        let admin = Role::system_admin();
        assert!(Permission::ALL.iter().all(|p| admin.has_permission(*p)));
        let default = Role::system_default();
        assert!(default.has_permission(Permission::TeamsRead));
        assert!(!default.has_permission(Permission::TeamsCreate));
        assert!(default.is_visible_to(Uuid::new_v4()));
    }

    #[test]
    fn custom_role_is_scoped() {
        let org = Uuid::new_v4();
        let role = Role::new(org, "editor", None, PermissionSet::new([Permission::ProjectsUpdate]));
        assert!(role.is_visible_to(org));
        assert!(!role.is_visible_to(Uuid::new_v4()));
        assert!(!role.is_system);
    }

    #[test]
    fn permission_set_from_slugs() {
        let set = PermissionSet::try_from(vec![
            "roles:read".to_string(),
            "roles:create".to_string(),
            "roles:read".to_string(),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.slugs(), vec!["roles:read", "roles:create"]);
        assert!(PermissionSet::try_from(vec!["bogus".to_string()]).is_err());
    }

    #[test]
    fn system_names_are_reserved() {
        assert!(is_system_role_name("Admin"));
        assert!(is_system_role_name(" default "));
        assert!(!is_system_role_name("owner"));
    }
}
