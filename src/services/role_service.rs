use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::member_service::visible_role;
use super::validation;
use crate::config;
use crate::database::models::role::{is_system_role_name, PermissionSet, DEFAULT_ROLE_ID};
use crate::database::models::{Permission, Role};
use crate::database::{Database, UnitOfWork};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct RoleService {
    db: Arc<dyn Database>,
    max_roles: usize,
}

impl RoleService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            max_roles: config::config().membership.max_roles_per_organization,
        }
    }

    pub fn with_max_roles(mut self, max_roles: usize) -> Self {
        self.max_roles = max_roles;
        self
    }

    /// System roles first, then the organization's own roles by name.
    pub async fn list(&self, organization_id: Uuid) -> ServiceResult<Vec<Role>> {
        let mut uow = self.db.begin().await?;
        Ok(uow.roles().list_visible(organization_id).await?)
    }

    pub async fn get(&self, organization_id: Uuid, role_id: Uuid) -> ServiceResult<Role> {
        let mut uow = self.db.begin().await?;
        visible_role(uow.as_mut(), organization_id, role_id).await
    }

    pub async fn create(&self, organization_id: Uuid, input: CreateRole) -> ServiceResult<Role> {
        let name = role_name(&input.name)?;
        let description = validation::description(input.description)?;
        let permissions = permission_set(&input.permissions)?;

        let mut uow = self.db.begin().await?;
        uow.organizations()
            .find(organization_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Organization"))?;

        let existing = uow.roles().count_for_organization(organization_id).await?;
        if existing >= self.max_roles as i64 {
            return Err(ServiceError::Conflict(format!(
                "Organization already has the maximum of {} roles",
                self.max_roles
            )));
        }
        ensure_unique_name(uow.as_mut(), organization_id, &name, None).await?;

        let role = Role::new(organization_id, name, description, permissions);
        uow.roles().insert(&role).await?;
        uow.commit().await?;

        info!(organization_id = %organization_id, role_id = %role.id, "created role");
        Ok(role)
    }

    pub async fn update(&self, organization_id: Uuid, role_id: Uuid, input: UpdateRole) -> ServiceResult<Role> {
        let name = input.name.as_deref().map(role_name).transpose()?;
        let description = match input.description {
            Some(d) => Some(validation::description(Some(d))?),
            None => None,
        };
        let permissions = input.permissions.as_deref().map(permission_set).transpose()?;

        let mut uow = self.db.begin().await?;
        let mut role = visible_role(uow.as_mut(), organization_id, role_id).await?;
        if role.is_system {
            return Err(ServiceError::Forbidden("System roles cannot be modified".to_string()));
        }

        if let Some(name) = name {
            ensure_unique_name(uow.as_mut(), organization_id, &name, Some(role.id)).await?;
            role.rename(name);
        }
        if let Some(description) = description {
            role.set_description(description);
        }
        if let Some(permissions) = permissions {
            role.set_permissions(permissions);
        }

        uow.roles().update(&role).await?;
        uow.commit().await?;
        Ok(role)
    }

    /// Members holding the role fall back to the system `default` role.
    pub async fn delete(&self, organization_id: Uuid, role_id: Uuid) -> ServiceResult<()> {
        let mut uow = self.db.begin().await?;
        let role = visible_role(uow.as_mut(), organization_id, role_id).await?;
        if role.is_system {
            return Err(ServiceError::Forbidden("System roles cannot be deleted".to_string()));
        }

        let reassigned = uow.members().reassign_role(role.id, DEFAULT_ROLE_ID).await?;
        uow.roles().delete(role.id).await?;
        uow.commit().await?;

        info!(organization_id = %organization_id, role_id = %role_id, reassigned, "deleted role");
        Ok(())
    }
}

fn role_name(value: &str) -> ServiceResult<String> {
    let name = validation::name("name", value)?;
    if is_system_role_name(&name) {
        return Err(ServiceError::field("name", "is reserved for a system role"));
    }
    Ok(name)
}

fn permission_set(slugs: &[String]) -> ServiceResult<PermissionSet> {
    Permission::parse_all(slugs)
        .map(PermissionSet::new)
        .map_err(|e| ServiceError::field("permissions", e.to_string()))
}

/// Role names are unique per organization, ignoring case.
async fn ensure_unique_name(
    uow: &mut dyn UnitOfWork,
    organization_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> ServiceResult<()> {
    let taken = uow
        .roles()
        .list_visible(organization_id)
        .await?
        .into_iter()
        .any(|r| Some(r.id) != except && r.name.eq_ignore_ascii_case(name));
    if taken {
        return Err(ServiceError::Conflict("A role with this name already exists".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::role::ADMIN_ROLE_ID;
    use crate::testing::Fixture;

    fn role(name: &str, permissions: &[&str]) -> CreateRole {
        CreateRole {
            name: name.to_string(),
            description: None,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn create_validates_name_and_permissions() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let org = fx.organization(&owner, "Acme").await;

        let created = fx
            .services
            .roles
            .create(org.id, role("Editor", &["projects:read", "projects:update", "projects:read"]))
            .await
            .unwrap();
        assert_eq!(created.permissions.len(), 2);
        assert!(!created.is_system);

        let err = fx.services.roles.create(org.id, role("Broken", &["projects:fly"])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
        let err = fx.services.roles.create(org.id, role(" Admin ", &[])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
        let err = fx.services.roles.create(org.id, role("EDITOR", &[])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn role_cap_is_enforced() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let org = fx.organization(&owner, "Acme").await;
        let roles = fx.services.roles.clone().with_max_roles(1);

        roles.create(org.id, role("One", &[])).await.unwrap();
        let err = roles.create(org.id, role("Two", &[])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn system_roles_are_immutable() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let org = fx.organization(&owner, "Acme").await;

        let update = UpdateRole {
            name: Some("Superuser".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            fx.services.roles.update(org.id, ADMIN_ROLE_ID, update).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            fx.services.roles.delete(org.id, DEFAULT_ROLE_ID).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn deleting_a_role_moves_members_to_default() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let bob = fx.user("Bob").await;
        let org = fx.organization(&owner, "Acme").await;
        let editor = fx.services.roles.create(org.id, role("Editor", &["projects:update"])).await.unwrap();
        fx.join(&org, &owner, &bob, Some(editor.id)).await;

        fx.services.roles.delete(org.id, editor.id).await.unwrap();

        let state = fx.db.snapshot();
        assert_eq!(state.member(org.id, bob.id).unwrap().role_id, DEFAULT_ROLE_ID);
        assert!(matches!(
            fx.services.roles.get(org.id, editor.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_replaces_permissions() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let org = fx.organization(&owner, "Acme").await;
        let editor = fx.services.roles.create(org.id, role("Editor", &["projects:update"])).await.unwrap();

        let update = UpdateRole {
            permissions: Some(vec!["teams:read".to_string()]),
            ..Default::default()
        };
        let updated = fx.services.roles.update(org.id, editor.id, update).await.unwrap();
        assert!(updated.has_permission(Permission::TeamsRead));
        assert!(!updated.has_permission(Permission::ProjectsUpdate));
        assert_eq!(updated.name, "Editor");
    }

    #[tokio::test]
    async fn list_shows_system_roles_first_and_hides_foreign_roles() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let acme = fx.organization(&owner, "Acme").await;
        let globex = fx.organization(&owner, "Globex").await;
        fx.services.roles.create(acme.id, role("Editor", &[])).await.unwrap();
        let foreign = fx.services.roles.create(globex.id, role("Auditor", &[])).await.unwrap();

        let roles = fx.services.roles.list(acme.id).await.unwrap();
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["admin", "default", "Editor"]);
        assert!(matches!(
            fx.services.roles.get(acme.id, foreign.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
