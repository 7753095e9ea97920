use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::access_service::active_role;
use super::error::{ServiceError, ServiceResult};
use super::validation;
use crate::config;
use crate::database::models::role::{ADMIN_ROLE_ID, DEFAULT_ROLE_ID};
use crate::database::models::{MembershipStatus, Organization, OrganizationUser, Role};
use crate::database::{Database, UnitOfWork};
use crate::types::{ListParams, Paged};

#[derive(Debug, Clone, Deserialize)]
pub struct InviteMember {
    pub email: String,
    /// Defaults to the system `default` role.
    pub role_id: Option<Uuid>,
}

/// Membership joined with the member's public profile.
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub membership: OrganizationUser,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingInvitation {
    pub organization: Organization,
    pub role_id: Uuid,
    pub invited_by: Option<Uuid>,
    pub invited_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MemberService {
    db: Arc<dyn Database>,
    invitation_ttl: Duration,
}

impl MemberService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        let hours = config::config().membership.invitation_ttl_hours;
        Self {
            db,
            invitation_ttl: Duration::hours(hours),
        }
    }

    pub fn with_invitation_ttl(mut self, ttl: Duration) -> Self {
        self.invitation_ttl = ttl;
        self
    }

    /// Invites a registered user. A refused or expired invitation is reopened.
    /// The inviter may only hand out permissions their own role grants.
    pub async fn invite(
        &self,
        organization_id: Uuid,
        inviter: Uuid,
        input: InviteMember,
    ) -> ServiceResult<OrganizationUser> {
        let email = validation::email(&input.email)?;
        let role_id = input.role_id.unwrap_or(DEFAULT_ROLE_ID);

        let mut uow = self.db.begin().await?;
        uow.organizations()
            .find(organization_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Organization"))?;
        let user = uow
            .users()
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;
        let role = visible_role(uow.as_mut(), organization_id, role_id).await?;
        ensure_can_grant(uow.as_mut(), organization_id, inviter, &role).await?;

        let now = Utc::now();
        let existing = uow.members().find(organization_id, user.id).await?;
        let membership = match existing {
            Some(existing) if existing.status == MembershipStatus::Active => {
                return Err(ServiceError::Conflict(
                    "User is already a member of this organization".to_string(),
                ));
            }
            Some(existing)
                if existing.status == MembershipStatus::Invited
                    && !existing.is_expired(now, self.invitation_ttl) =>
            {
                return Err(ServiceError::Conflict("User already has a pending invitation".to_string()));
            }
            Some(mut previous) => {
                previous.reinvite(role_id, inviter, now, self.invitation_ttl)?;
                uow.members().update(&previous).await?;
                previous
            }
            None => {
                let invited = OrganizationUser::invite(organization_id, user.id, role_id, inviter);
                uow.members().insert(&invited).await?;
                invited
            }
        };
        uow.commit().await?;

        info!(
            organization_id = %organization_id,
            user_id = %membership.user_id,
            role_id = %role_id,
            inviter = %inviter,
            "invited member"
        );
        Ok(membership)
    }

    pub async fn accept(&self, organization_id: Uuid, user_id: Uuid) -> ServiceResult<OrganizationUser> {
        let mut uow = self.db.begin().await?;
        let mut membership = find_invitation(uow.as_mut(), organization_id, user_id).await?;
        membership.accept(Utc::now(), self.invitation_ttl)?;
        uow.members().update(&membership).await?;
        uow.commit().await?;

        info!(organization_id = %organization_id, user_id = %user_id, "accepted invitation");
        Ok(membership)
    }

    pub async fn refuse(&self, organization_id: Uuid, user_id: Uuid) -> ServiceResult<OrganizationUser> {
        let mut uow = self.db.begin().await?;
        let mut membership = find_invitation(uow.as_mut(), organization_id, user_id).await?;
        membership.refuse()?;
        uow.members().update(&membership).await?;
        uow.commit().await?;

        info!(organization_id = %organization_id, user_id = %user_id, "refused invitation");
        Ok(membership)
    }

    /// Open, unexpired invitations addressed to the user.
    pub async fn pending_for_user(&self, user_id: Uuid) -> ServiceResult<Vec<PendingInvitation>> {
        let now = Utc::now();
        let mut uow = self.db.begin().await?;
        let invitations = uow.members().list_for_user(user_id, Some(MembershipStatus::Invited)).await?;

        let mut pending = Vec::with_capacity(invitations.len());
        for invitation in invitations {
            if invitation.is_expired(now, self.invitation_ttl) {
                continue;
            }
            if let Some(organization) = uow.organizations().find(invitation.organization_id).await? {
                pending.push(PendingInvitation {
                    organization,
                    role_id: invitation.role_id,
                    invited_by: invitation.invited_by,
                    invited_at: invitation.invited_at,
                    expires_at: invitation.invited_at + self.invitation_ttl,
                });
            }
        }
        Ok(pending)
    }

    pub async fn list(
        &self,
        organization_id: Uuid,
        status: Option<MembershipStatus>,
        params: &ListParams,
    ) -> ServiceResult<Paged<MemberView>> {
        let mut uow = self.db.begin().await?;
        let (memberships, total) = uow.members().list(organization_id, status, params).await?;

        let ids: Vec<Uuid> = memberships.iter().map(|m| m.user_id).collect();
        let users: HashMap<Uuid, _> = uow
            .users()
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let items = memberships
            .into_iter()
            .filter_map(|membership| {
                let user = users.get(&membership.user_id)?;
                Some(MemberView {
                    email: user.email.clone(),
                    name: user.name.clone(),
                    membership,
                })
            })
            .collect();
        Ok(Paged::new(items, total, params))
    }

    pub async fn get(&self, organization_id: Uuid, user_id: Uuid) -> ServiceResult<OrganizationUser> {
        let mut uow = self.db.begin().await?;
        find_member(uow.as_mut(), organization_id, user_id).await
    }

    /// `actor` may only assign a role whose permissions their own role grants.
    pub async fn change_role(
        &self,
        organization_id: Uuid,
        actor: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> ServiceResult<OrganizationUser> {
        let mut uow = self.db.begin().await?;
        let role = visible_role(uow.as_mut(), organization_id, role_id).await?;
        ensure_can_grant(uow.as_mut(), organization_id, actor, &role).await?;
        let mut membership = lock_member(uow.as_mut(), organization_id, user_id).await?;
        if membership.role_id == role_id {
            return Ok(membership);
        }
        ensure_not_last_admin(uow.as_mut(), &membership).await?;

        let previous = membership.role_id;
        membership.set_role(role_id);
        uow.members().update(&membership).await?;
        uow.commit().await?;

        info!(organization_id = %organization_id, user_id = %user_id, from = %previous, to = %role_id, "changed member role");
        Ok(membership)
    }

    /// Removes the membership and the user's workspace, team and project
    /// memberships inside this organization.
    pub async fn remove(&self, organization_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let mut uow = self.db.begin().await?;
        let membership = lock_member(uow.as_mut(), organization_id, user_id).await?;
        ensure_not_last_admin(uow.as_mut(), &membership).await?;

        let mut groups = uow.workspaces().remove_user_in_organization(organization_id, user_id).await?;
        groups += uow.teams().remove_user_in_organization(organization_id, user_id).await?;
        groups += uow.projects().remove_user_in_organization(organization_id, user_id).await?;
        uow.members().delete(membership.id).await?;
        uow.commit().await?;

        info!(organization_id = %organization_id, user_id = %user_id, groups, "removed member");
        Ok(())
    }
}

async fn find_member(
    uow: &mut dyn UnitOfWork,
    organization_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<OrganizationUser> {
    uow.members()
        .find(organization_id, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Member"))
}

/// Membership read after taking the organization's lock, so concurrent
/// role changes and removals in one organization run one after another.
pub(crate) async fn lock_member(
    uow: &mut dyn UnitOfWork,
    organization_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<OrganizationUser> {
    if !uow.organizations().lock(organization_id).await? {
        return Err(ServiceError::not_found("Organization"));
    }
    find_member(uow, organization_id, user_id).await
}

async fn find_invitation(
    uow: &mut dyn UnitOfWork,
    organization_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<OrganizationUser> {
    uow.members()
        .find(organization_id, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invitation"))
}

/// Role by id, as long as the organization can assign it.
pub(crate) async fn visible_role(
    uow: &mut dyn UnitOfWork,
    organization_id: Uuid,
    role_id: Uuid,
) -> ServiceResult<Role> {
    match uow.roles().find(role_id).await? {
        Some(role) if role.is_visible_to(organization_id) => Ok(role),
        _ => Err(ServiceError::not_found("Role")),
    }
}

/// The actor's own role must hold every permission of `role`.
async fn ensure_can_grant(
    uow: &mut dyn UnitOfWork,
    organization_id: Uuid,
    actor: Uuid,
    role: &Role,
) -> ServiceResult<()> {
    let (_, actor_role) = active_role(uow, organization_id, actor).await?;
    match role.permissions.iter().find(|p| !actor_role.has_permission(**p)) {
        Some(missing) => {
            warn!(
                organization_id = %organization_id,
                actor = %actor,
                role = %role.name,
                permission = %missing,
                "refused to grant a role beyond the actor's own"
            );
            Err(ServiceError::Forbidden(format!(
                "Cannot grant a role with permission {}",
                missing
            )))
        }
        None => Ok(()),
    }
}

/// Every organization keeps at least one active admin.
pub(crate) async fn ensure_not_last_admin(
    uow: &mut dyn UnitOfWork,
    membership: &OrganizationUser,
) -> ServiceResult<()> {
    if !membership.is_active() || membership.role_id != ADMIN_ROLE_ID {
        return Ok(());
    }
    let admins = uow
        .members()
        .count_active_with_role(membership.organization_id, ADMIN_ROLE_ID)
        .await?;
    if admins <= 1 {
        warn!(
            organization_id = %membership.organization_id,
            user_id = %membership.user_id,
            "refused to drop the last admin"
        );
        return Err(ServiceError::Conflict(
            "The organization must keep at least one admin".to_string(),
        ));
    }
    Ok(())
}
