use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::database::models::role::PermissionSet;
use crate::database::models::{OrganizationUser, Permission, Role};
use crate::database::{Database, UnitOfWork};

/// Role-based authorization inside one organization.
#[derive(Clone)]
pub struct AccessService {
    db: Arc<dyn Database>,
}

impl AccessService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Succeeds only for an active member whose role grants `permission`.
    pub async fn user_must_have_permission(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        permission: Permission,
    ) -> ServiceResult<OrganizationUser> {
        let mut uow = self.db.begin().await?;
        let (membership, role) = active_role(uow.as_mut(), organization_id, user_id).await?;

        if !role.has_permission(permission) {
            warn!(
                organization_id = %organization_id,
                user_id = %user_id,
                role = %role.name,
                permission = %permission,
                "permission denied"
            );
            return Err(ServiceError::Forbidden(format!("Missing permission: {}", permission)));
        }
        Ok(membership)
    }

    pub async fn effective_permissions(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<PermissionSet> {
        let mut uow = self.db.begin().await?;
        let (_, role) = active_role(uow.as_mut(), organization_id, user_id).await?;
        Ok(role.permissions)
    }
}

pub(crate) async fn active_role(
    uow: &mut dyn UnitOfWork,
    organization_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<(OrganizationUser, Role)> {
    let membership = match uow.members().find(organization_id, user_id).await? {
        Some(m) if m.is_active() => m,
        _ => {
            warn!(organization_id = %organization_id, user_id = %user_id, "access by non-member");
            return Err(ServiceError::Forbidden(
                "Not an active member of this organization".to_string(),
            ));
        }
    };
    let role = uow
        .roles()
        .find(membership.role_id)
        .await?
        .ok_or_else(|| ServiceError::Forbidden("Membership role no longer exists".to_string()))?;
    Ok((membership, role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn default_role_reads_but_cannot_write() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let bob = fx.user("Bob").await;
        let org = fx.organization(&owner, "Acme").await;
        fx.join(&org, &owner, &bob, None).await;

        let access = &fx.services.access;
        access.user_must_have_permission(org.id, bob.id, Permission::TeamsRead).await.unwrap();
        let err = access.user_must_have_permission(org.id, bob.id, Permission::RolesCreate).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(ref m) if m.contains("roles:create")));

        let effective = access.effective_permissions(org.id, bob.id).await.unwrap();
        assert!(effective.iter().all(|p| p.is_read()));
    }

    #[tokio::test]
    async fn admin_holds_every_permission() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let org = fx.organization(&owner, "Acme").await;

        for permission in Permission::ALL {
            fx.services
                .access
                .user_must_have_permission(org.id, owner.id, permission)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn outsiders_are_forbidden() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let mallory = fx.user("Mallory").await;
        let org = fx.organization(&owner, "Acme").await;

        let err = fx
            .services
            .access
            .user_must_have_permission(org.id, mallory.id, Permission::OrganizationsRead)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(fx.services.access.effective_permissions(Uuid::new_v4(), owner.id).await.is_err());
    }
}
