use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::member_service::{ensure_not_last_admin, lock_member};
use super::validation;
use crate::auth;
use crate::database::models::{user::normalize_email, MembershipStatus, User};
use crate::database::Database;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<dyn Database>,
}

impl UserService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn register(&self, input: RegisterUser) -> ServiceResult<User> {
        let email = validation::email(&input.email)?;
        let name = validation::name("name", &input.name)?;
        validation::password(&input.password)?;
        let password_hash = hash(&input.password)?;

        let mut uow = self.db.begin().await?;
        if uow.users().find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email is already registered".to_string()));
        }
        let user = User::new(&email, name, password_hash);
        uow.users().insert(&user).await?;
        uow.commit().await?;

        info!(user_id = %user.id, "registered user");
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<User> {
        let email = normalize_email(email);
        let mut uow = self.db.begin().await?;
        let user = uow.users().find_by_email(&email).await?;

        match user {
            Some(user) if auth::verify_password(password, &user.password_hash) => Ok(user),
            _ => Err(ServiceError::Unauthorized("Invalid email or password".to_string())),
        }
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<User> {
        let mut uow = self.db.begin().await?;
        uow.users().find(id).await?.ok_or_else(|| ServiceError::not_found("User"))
    }

    pub async fn update_profile(&self, id: Uuid, input: UpdateProfile) -> ServiceResult<User> {
        let name = input.name.as_deref().map(|n| validation::name("name", n)).transpose()?;
        let password_hash = match input.password.as_deref() {
            Some(password) => {
                validation::password(password)?;
                Some(hash(password)?)
            }
            None => None,
        };

        let mut uow = self.db.begin().await?;
        let mut user = uow.users().find(id).await?.ok_or_else(|| ServiceError::not_found("User"))?;
        if let Some(name) = name {
            user.set_name(name);
        }
        if let Some(password_hash) = password_hash {
            user.set_password_hash(password_hash);
        }
        uow.users().update(&user).await?;
        uow.commit().await?;
        Ok(user)
    }

    /// Deletes the account and every membership it holds. Refused while the
    /// user is the last active admin of an organization.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let mut uow = self.db.begin().await?;
        uow.users().find(id).await?.ok_or_else(|| ServiceError::not_found("User"))?;

        // Organization locks are always taken in id order
        let mut organization_ids: Vec<Uuid> = uow
            .members()
            .list_for_user(id, Some(MembershipStatus::Active))
            .await?
            .into_iter()
            .map(|m| m.organization_id)
            .collect();
        organization_ids.sort();
        for organization_id in organization_ids {
            let membership = lock_member(uow.as_mut(), organization_id, id).await?;
            ensure_not_last_admin(uow.as_mut(), &membership).await?;
        }

        let mut groups = uow.workspaces().remove_user_everywhere(id).await?;
        groups += uow.teams().remove_user_everywhere(id).await?;
        groups += uow.projects().remove_user_everywhere(id).await?;
        let organizations = uow.members().delete_for_user(id).await?;
        uow.users().delete(id).await?;
        uow.commit().await?;

        info!(user_id = %id, organizations, groups, "deleted user and memberships");
        Ok(())
    }
}

fn hash(password: &str) -> ServiceResult<String> {
    auth::hash_password(password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ServiceError::Internal("Failed to hash password".to_string())
    })
}
