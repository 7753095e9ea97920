//! Storage seams. Every service operation runs inside one [`UnitOfWork`],
//! which maps to a single database transaction: reads and writes made through
//! its repositories become visible to others only after [`UnitOfWork::commit`].
//! Dropping a unit of work without committing rolls it back.

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Group, GroupMember, MembershipStatus, Organization, OrganizationUser, Project, Role, Team, User,
    Workspace,
};
use crate::types::ListParams;

#[async_trait]
pub trait UserRepository: Send {
    async fn insert(&mut self, user: &User) -> Result<(), DatabaseError>;
    async fn update(&mut self, user: &User) -> Result<(), DatabaseError>;
    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError>;
    async fn find(&mut self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    /// `email` must already be normalized.
    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_many(&mut self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError>;
}

#[async_trait]
pub trait OrganizationRepository: Send {
    async fn insert(&mut self, organization: &Organization) -> Result<(), DatabaseError>;
    async fn update(&mut self, organization: &Organization) -> Result<(), DatabaseError>;
    /// Removes the organization together with its roles, memberships and groups.
    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError>;
    async fn find(&mut self, id: Uuid) -> Result<Option<Organization>, DatabaseError>;
    async fn find_by_slug(&mut self, slug: &str) -> Result<Option<Organization>, DatabaseError>;
    /// Takes the organization's row lock until the unit of work ends.
    /// Returns `false` when the organization does not exist.
    async fn lock(&mut self, id: Uuid) -> Result<bool, DatabaseError>;
    /// Page of the given organizations, ordered by name.
    async fn list_by_ids(
        &mut self,
        ids: &[Uuid],
        params: &ListParams,
    ) -> Result<(Vec<Organization>, i64), DatabaseError>;
}

#[async_trait]
pub trait MemberRepository: Send {
    async fn insert(&mut self, member: &OrganizationUser) -> Result<(), DatabaseError>;
    async fn update(&mut self, member: &OrganizationUser) -> Result<(), DatabaseError>;
    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError>;
    async fn find(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationUser>, DatabaseError>;
    /// Page of an organization's memberships, oldest first.
    async fn list(
        &mut self,
        organization_id: Uuid,
        status: Option<MembershipStatus>,
        params: &ListParams,
    ) -> Result<(Vec<OrganizationUser>, i64), DatabaseError>;
    async fn list_for_user(
        &mut self,
        user_id: Uuid,
        status: Option<MembershipStatus>,
    ) -> Result<Vec<OrganizationUser>, DatabaseError>;
    async fn count_active_with_role(
        &mut self,
        organization_id: Uuid,
        role_id: Uuid,
    ) -> Result<i64, DatabaseError>;
    /// Points every membership holding `from` at `to`; returns how many moved.
    async fn reassign_role(&mut self, from: Uuid, to: Uuid) -> Result<u64, DatabaseError>;
    async fn delete_for_user(&mut self, user_id: Uuid) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait RoleRepository: Send {
    async fn insert(&mut self, role: &Role) -> Result<(), DatabaseError>;
    /// Updates the role row and replaces its permission grants.
    async fn update(&mut self, role: &Role) -> Result<(), DatabaseError>;
    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError>;
    async fn find(&mut self, id: Uuid) -> Result<Option<Role>, DatabaseError>;
    /// System roles followed by the organization's own roles.
    async fn list_visible(&mut self, organization_id: Uuid) -> Result<Vec<Role>, DatabaseError>;
    async fn count_for_organization(&mut self, organization_id: Uuid) -> Result<i64, DatabaseError>;
}

/// Storage for one kind of organization-scoped group and its member table.
#[async_trait]
pub trait GroupRepository<G: Group>: Send {
    async fn insert(&mut self, group: &G) -> Result<(), DatabaseError>;
    async fn update(&mut self, group: &G) -> Result<(), DatabaseError>;
    /// Member rows go with the group. Deleting a workspace detaches its projects.
    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError>;
    async fn find(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<G>, DatabaseError>;
    async fn list(
        &mut self,
        organization_id: Uuid,
        params: &ListParams,
    ) -> Result<(Vec<G>, i64), DatabaseError>;

    async fn add_member(&mut self, member: &GroupMember) -> Result<(), DatabaseError>;
    async fn remove_member(&mut self, group_id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError>;
    async fn find_member(
        &mut self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, DatabaseError>;
    async fn list_members(&mut self, group_id: Uuid) -> Result<Vec<GroupMember>, DatabaseError>;
    /// Drops the user from every group of this kind inside one organization.
    async fn remove_user_in_organization(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, DatabaseError>;
    async fn remove_user_everywhere(&mut self, user_id: Uuid) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    fn users(&mut self) -> &mut dyn UserRepository;
    fn organizations(&mut self) -> &mut dyn OrganizationRepository;
    fn members(&mut self) -> &mut dyn MemberRepository;
    fn roles(&mut self) -> &mut dyn RoleRepository;
    fn workspaces(&mut self) -> &mut dyn GroupRepository<Workspace>;
    fn teams(&mut self) -> &mut dyn GroupRepository<Team>;
    fn projects(&mut self) -> &mut dyn GroupRepository<Project>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DatabaseError>;
    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// Resolves the repository for a group kind, so generic code can reach it
/// from a unit of work.
pub trait GroupStore: Group {
    fn repository(uow: &mut dyn UnitOfWork) -> &mut dyn GroupRepository<Self>;
}

impl GroupStore for Workspace {
    fn repository(uow: &mut dyn UnitOfWork) -> &mut dyn GroupRepository<Self> {
        uow.workspaces()
    }
}

impl GroupStore for Team {
    fn repository(uow: &mut dyn UnitOfWork) -> &mut dyn GroupRepository<Self> {
        uow.teams()
    }
}

impl GroupStore for Project {
    fn repository(uow: &mut dyn UnitOfWork) -> &mut dyn GroupRepository<Self> {
        uow.projects()
    }
}
