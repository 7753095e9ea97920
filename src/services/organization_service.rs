use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::validation;
use crate::database::models::organization::slugify;
use crate::database::models::role::ADMIN_ROLE_ID;
use crate::database::models::{MembershipStatus, Organization, OrganizationUser};
use crate::database::Database;
use crate::types::{ListParams, Paged};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    /// A blank description clears it.
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct OrganizationService {
    db: Arc<dyn Database>,
}

impl OrganizationService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Creates the organization with `creator` as its first active admin.
    pub async fn create(&self, creator: Uuid, input: CreateOrganization) -> ServiceResult<Organization> {
        let name = validation::name("name", &input.name)?;
        let description = validation::description(input.description)?;
        let organization = Organization::new(name, description);

        let mut uow = self.db.begin().await?;
        uow.users().find(creator).await?.ok_or_else(|| ServiceError::not_found("User"))?;
        if uow.organizations().find_by_slug(&organization.slug).await?.is_some() {
            return Err(ServiceError::Conflict(
                "An organization with this name already exists".to_string(),
            ));
        }
        uow.organizations().insert(&organization).await?;
        let founder = OrganizationUser::founder(organization.id, creator, ADMIN_ROLE_ID);
        uow.members().insert(&founder).await?;
        uow.commit().await?;

        info!(organization_id = %organization.id, slug = %organization.slug, creator = %creator, "created organization");
        Ok(organization)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Organization> {
        let mut uow = self.db.begin().await?;
        uow.organizations()
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Organization"))
    }

    /// Organizations where the user holds an active membership.
    pub async fn list_for_user(&self, user_id: Uuid, params: &ListParams) -> ServiceResult<Paged<Organization>> {
        let mut uow = self.db.begin().await?;
        let memberships = uow.members().list_for_user(user_id, Some(MembershipStatus::Active)).await?;
        let ids: Vec<Uuid> = memberships.iter().map(|m| m.organization_id).collect();
        let (items, total) = uow.organizations().list_by_ids(&ids, params).await?;
        Ok(Paged::new(items, total, params))
    }

    pub async fn update(&self, id: Uuid, input: UpdateOrganization) -> ServiceResult<Organization> {
        let name = input.name.as_deref().map(|n| validation::name("name", n)).transpose()?;
        let description = match input.description {
            Some(d) => Some(validation::description(Some(d))?),
            None => None,
        };

        let mut uow = self.db.begin().await?;
        let mut organization = uow
            .organizations()
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Organization"))?;

        if let Some(name) = name {
            let slug = slugify(&name);
            if slug != organization.slug {
                if let Some(other) = uow.organizations().find_by_slug(&slug).await? {
                    if other.id != id {
                        return Err(ServiceError::Conflict(
                            "An organization with this name already exists".to_string(),
                        ));
                    }
                }
            }
            organization.set_name(name);
        }
        if let Some(description) = description {
            organization.set_description(description);
        }

        uow.organizations().update(&organization).await?;
        uow.commit().await?;
        Ok(organization)
    }

    /// Deletes the organization with all its roles, memberships and groups.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let mut uow = self.db.begin().await?;
        uow.organizations().delete(id).await?;
        uow.commit().await?;
        info!(organization_id = %id, "deleted organization");
        Ok(())
    }
}
