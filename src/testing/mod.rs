//! In-memory [`Database`] and fixtures for service tests.
//!
//! `begin` snapshots the shared state and `commit` writes the snapshot back,
//! so a unit of work dropped without committing leaves no trace. Constraints
//! the schema enforces (unique keys, cascades, restricted deletes) are
//! reproduced here so services behave the same against both backends.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::database::models::{
    Group, GroupMember, MembershipStatus, Organization, OrganizationUser, Project, Role, Team, User,
    Workspace,
};
use crate::database::repository::{
    Database, GroupRepository, MemberRepository, OrganizationRepository, RoleRepository,
    UnitOfWork, UserRepository,
};
use crate::database::DatabaseError;
use crate::services::organization_service::CreateOrganization;
use crate::services::user_service::RegisterUser;
use crate::services::Services;
use crate::types::ListParams;

#[derive(Clone)]
pub struct GroupTable<G> {
    rows: Vec<G>,
    members: Vec<GroupMember>,
}

impl<G> Default for GroupTable<G> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            members: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct State {
    users: Vec<User>,
    organizations: Vec<Organization>,
    members: Vec<OrganizationUser>,
    roles: Vec<Role>,
    workspaces: GroupTable<Workspace>,
    teams: GroupTable<Team>,
    projects: GroupTable<Project>,
}

impl State {
    fn seeded() -> Self {
        Self {
            roles: vec![Role::system_admin(), Role::system_default()],
            ..Default::default()
        }
    }

    fn drop_group_members_of_user(&mut self, user_id: Uuid) {
        self.workspaces.members.retain(|m| m.user_id != user_id);
        self.teams.members.retain(|m| m.user_id != user_id);
        self.projects.members.retain(|m| m.user_id != user_id);
    }
}

#[derive(Clone)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::seeded())),
        }
    }

    /// Copy of the committed state.
    pub fn snapshot(&self) -> State {
        self.state.lock().unwrap().clone()
    }
}

impl State {
    pub fn member(&self, organization_id: Uuid, user_id: Uuid) -> Option<&OrganizationUser> {
        self.members
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
    }

    pub fn user_exists(&self, user_id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == user_id)
    }

    pub fn group_memberships(&self, user_id: Uuid) -> usize {
        self.workspaces.members.iter().filter(|m| m.user_id == user_id).count()
            + self.teams.members.iter().filter(|m| m.user_id == user_id).count()
            + self.projects.members.iter().filter(|m| m.user_id == user_id).count()
    }

    pub fn project(&self, id: Uuid) -> Option<&Project> {
        self.projects.rows.iter().find(|p| p.id == id)
    }

    pub fn organization_rows(&self, organization_id: Uuid) -> usize {
        self.organizations.iter().filter(|o| o.id == organization_id).count()
            + self.members.iter().filter(|m| m.organization_id == organization_id).count()
            + self.roles.iter().filter(|r| r.organization_id == Some(organization_id)).count()
            + self.workspaces.rows.iter().filter(|g| g.organization_id == organization_id).count()
            + self.teams.rows.iter().filter(|g| g.organization_id == organization_id).count()
            + self.projects.rows.iter().filter(|g| g.organization_id == organization_id).count()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DatabaseError> {
        let state = self.state.lock().unwrap().clone();
        Ok(Box::new(MemoryUnitOfWork {
            state,
            shared: self.state.clone(),
        }))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

pub struct MemoryUnitOfWork {
    state: State,
    shared: Arc<Mutex<State>>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn users(&mut self) -> &mut dyn UserRepository {
        self
    }

    fn organizations(&mut self) -> &mut dyn OrganizationRepository {
        self
    }

    fn members(&mut self) -> &mut dyn MemberRepository {
        self
    }

    fn roles(&mut self) -> &mut dyn RoleRepository {
        self
    }

    fn workspaces(&mut self) -> &mut dyn GroupRepository<Workspace> {
        self
    }

    fn teams(&mut self) -> &mut dyn GroupRepository<Team> {
        self
    }

    fn projects(&mut self) -> &mut dyn GroupRepository<Project> {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        *self.shared.lock().unwrap() = self.state;
        Ok(())
    }
}

fn not_found(what: &str) -> DatabaseError {
    DatabaseError::NotFound(format!("{} not found", what))
}

fn unique(constraint: &str) -> DatabaseError {
    DatabaseError::UniqueViolation(constraint.to_string())
}

fn page<T: Clone>(rows: Vec<T>, params: &ListParams) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(params.offset() as usize)
        .take(params.limit() as usize)
        .collect();
    (items, total)
}

#[async_trait]
impl UserRepository for MemoryUnitOfWork {
    async fn insert(&mut self, user: &User) -> Result<(), DatabaseError> {
        if self.state.users.iter().any(|u| u.email == user.email) {
            return Err(unique("users_email_key"));
        }
        self.state.users.push(user.clone());
        Ok(())
    }

    async fn update(&mut self, user: &User) -> Result<(), DatabaseError> {
        if self.state.users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(unique("users_email_key"));
        }
        let row = self.state.users.iter_mut().find(|u| u.id == user.id).ok_or_else(|| not_found("User"))?;
        *row = user.clone();
        Ok(())
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        let before = self.state.users.len();
        self.state.users.retain(|u| u.id != id);
        if self.state.users.len() == before {
            return Err(not_found("User"));
        }
        self.state.members.retain(|m| m.user_id != id);
        for member in self.state.members.iter_mut() {
            if member.invited_by == Some(id) {
                member.invited_by = None;
            }
        }
        self.state.drop_group_members_of_user(id);
        Ok(())
    }

    async fn find(&mut self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_many(&mut self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        Ok(self.state.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }
}

#[async_trait]
impl OrganizationRepository for MemoryUnitOfWork {
    async fn insert(&mut self, organization: &Organization) -> Result<(), DatabaseError> {
        if self.state.organizations.iter().any(|o| o.slug == organization.slug) {
            return Err(unique("organizations_slug_key"));
        }
        self.state.organizations.push(organization.clone());
        Ok(())
    }

    async fn update(&mut self, organization: &Organization) -> Result<(), DatabaseError> {
        if self
            .state
            .organizations
            .iter()
            .any(|o| o.slug == organization.slug && o.id != organization.id)
        {
            return Err(unique("organizations_slug_key"));
        }
        let row = self
            .state
            .organizations
            .iter_mut()
            .find(|o| o.id == organization.id)
            .ok_or_else(|| not_found("Organization"))?;
        *row = organization.clone();
        Ok(())
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        let before = self.state.organizations.len();
        self.state.organizations.retain(|o| o.id != id);
        if self.state.organizations.len() == before {
            return Err(not_found("Organization"));
        }

        let state = &mut self.state;
        state.members.retain(|m| m.organization_id != id);
        state.roles.retain(|r| r.organization_id != Some(id));

        let workspaces: Vec<Uuid> = state.workspaces.rows.iter().filter(|g| g.organization_id == id).map(|g| g.id).collect();
        let teams: Vec<Uuid> = state.teams.rows.iter().filter(|g| g.organization_id == id).map(|g| g.id).collect();
        let projects: Vec<Uuid> = state.projects.rows.iter().filter(|g| g.organization_id == id).map(|g| g.id).collect();

        state.workspaces.rows.retain(|g| g.organization_id != id);
        state.workspaces.members.retain(|m| !workspaces.contains(&m.group_id));
        state.teams.rows.retain(|g| g.organization_id != id);
        state.teams.members.retain(|m| !teams.contains(&m.group_id));
        state.projects.rows.retain(|g| g.organization_id != id);
        state.projects.members.retain(|m| !projects.contains(&m.group_id));
        Ok(())
    }

    async fn find(&mut self, id: Uuid) -> Result<Option<Organization>, DatabaseError> {
        Ok(self.state.organizations.iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_slug(&mut self, slug: &str) -> Result<Option<Organization>, DatabaseError> {
        Ok(self.state.organizations.iter().find(|o| o.slug == slug).cloned())
    }

    // Tests drive one unit of work at a time
    async fn lock(&mut self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.state.organizations.iter().any(|o| o.id == id))
    }

    async fn list_by_ids(
        &mut self,
        ids: &[Uuid],
        params: &ListParams,
    ) -> Result<(Vec<Organization>, i64), DatabaseError> {
        let mut rows: Vec<Organization> = self
            .state
            .organizations
            .iter()
            .filter(|o| ids.contains(&o.id) && params.matches(&o.name))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page(rows, params))
    }
}

#[async_trait]
impl MemberRepository for MemoryUnitOfWork {
    async fn insert(&mut self, member: &OrganizationUser) -> Result<(), DatabaseError> {
        if self.state.member(member.organization_id, member.user_id).is_some() {
            return Err(unique("organization_users_organization_user_key"));
        }
        self.state.members.push(member.clone());
        Ok(())
    }

    async fn update(&mut self, member: &OrganizationUser) -> Result<(), DatabaseError> {
        let row = self
            .state
            .members
            .iter_mut()
            .find(|m| m.id == member.id)
            .ok_or_else(|| not_found("Membership"))?;
        *row = member.clone();
        Ok(())
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        let before = self.state.members.len();
        self.state.members.retain(|m| m.id != id);
        if self.state.members.len() == before {
            return Err(not_found("Membership"));
        }
        Ok(())
    }

    async fn find(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationUser>, DatabaseError> {
        Ok(self.state.member(organization_id, user_id).cloned())
    }

    async fn list(
        &mut self,
        organization_id: Uuid,
        status: Option<MembershipStatus>,
        params: &ListParams,
    ) -> Result<(Vec<OrganizationUser>, i64), DatabaseError> {
        let mut rows: Vec<OrganizationUser> = self
            .state
            .members
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(page(rows, params))
    }

    async fn list_for_user(
        &mut self,
        user_id: Uuid,
        status: Option<MembershipStatus>,
    ) -> Result<Vec<OrganizationUser>, DatabaseError> {
        let mut rows: Vec<OrganizationUser> = self
            .state
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.invited_at.cmp(&a.invited_at));
        Ok(rows)
    }

    async fn count_active_with_role(
        &mut self,
        organization_id: Uuid,
        role_id: Uuid,
    ) -> Result<i64, DatabaseError> {
        Ok(self
            .state
            .members
            .iter()
            .filter(|m| m.organization_id == organization_id && m.role_id == role_id && m.is_active())
            .count() as i64)
    }

    async fn reassign_role(&mut self, from: Uuid, to: Uuid) -> Result<u64, DatabaseError> {
        let mut moved = 0;
        for member in self.state.members.iter_mut().filter(|m| m.role_id == from) {
            member.set_role(to);
            moved += 1;
        }
        Ok(moved)
    }

    async fn delete_for_user(&mut self, user_id: Uuid) -> Result<u64, DatabaseError> {
        let before = self.state.members.len();
        self.state.members.retain(|m| m.user_id != user_id);
        Ok((before - self.state.members.len()) as u64)
    }
}

#[async_trait]
impl RoleRepository for MemoryUnitOfWork {
    async fn insert(&mut self, role: &Role) -> Result<(), DatabaseError> {
        if self
            .state
            .roles
            .iter()
            .any(|r| r.organization_id == role.organization_id && r.name == role.name)
        {
            return Err(unique("roles_organization_name_key"));
        }
        self.state.roles.push(role.clone());
        Ok(())
    }

    async fn update(&mut self, role: &Role) -> Result<(), DatabaseError> {
        let row = self.state.roles.iter_mut().find(|r| r.id == role.id).ok_or_else(|| not_found("Role"))?;
        *row = role.clone();
        Ok(())
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        if self.state.members.iter().any(|m| m.role_id == id) {
            return Err(DatabaseError::QueryError("role is still assigned to members".to_string()));
        }
        let before = self.state.roles.len();
        self.state.roles.retain(|r| r.id != id);
        if self.state.roles.len() == before {
            return Err(not_found("Role"));
        }
        Ok(())
    }

    async fn find(&mut self, id: Uuid) -> Result<Option<Role>, DatabaseError> {
        Ok(self.state.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn list_visible(&mut self, organization_id: Uuid) -> Result<Vec<Role>, DatabaseError> {
        let mut rows: Vec<Role> = self
            .state
            .roles
            .iter()
            .filter(|r| r.is_visible_to(organization_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.is_system.cmp(&a.is_system).then(a.name.cmp(&b.name)));
        Ok(rows)
    }

    async fn count_for_organization(&mut self, organization_id: Uuid) -> Result<i64, DatabaseError> {
        Ok(self
            .state
            .roles
            .iter()
            .filter(|r| r.organization_id == Some(organization_id))
            .count() as i64)
    }
}

/// Where a group kind lives in [`State`].
pub trait MemoryGroup: Group {
    fn table(state: &mut State) -> &mut GroupTable<Self>;

    /// Side effects of deleting a group beyond its own rows.
    fn on_delete(_state: &mut State, _id: Uuid) {}
}

impl MemoryGroup for Workspace {
    fn table(state: &mut State) -> &mut GroupTable<Self> {
        &mut state.workspaces
    }

    fn on_delete(state: &mut State, id: Uuid) {
        for project in state.projects.rows.iter_mut().filter(|p| p.workspace_id == Some(id)) {
            project.workspace_id = None;
        }
    }
}

impl MemoryGroup for Team {
    fn table(state: &mut State) -> &mut GroupTable<Self> {
        &mut state.teams
    }
}

impl MemoryGroup for Project {
    fn table(state: &mut State) -> &mut GroupTable<Self> {
        &mut state.projects
    }
}

#[async_trait]
impl<G: MemoryGroup> GroupRepository<G> for MemoryUnitOfWork {
    async fn insert(&mut self, group: &G) -> Result<(), DatabaseError> {
        G::table(&mut self.state).rows.push(group.clone());
        Ok(())
    }

    async fn update(&mut self, group: &G) -> Result<(), DatabaseError> {
        let table = G::table(&mut self.state);
        let row = table
            .rows
            .iter_mut()
            .find(|g| g.id() == group.id())
            .ok_or_else(|| not_found(G::KIND))?;
        *row = group.clone();
        Ok(())
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        let table = G::table(&mut self.state);
        let before = table.rows.len();
        table.rows.retain(|g| g.id() != id);
        if table.rows.len() == before {
            return Err(not_found(G::KIND));
        }
        table.members.retain(|m| m.group_id != id);
        G::on_delete(&mut self.state, id);
        Ok(())
    }

    async fn find(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<G>, DatabaseError> {
        Ok(G::table(&mut self.state)
            .rows
            .iter()
            .find(|g| g.id() == id && g.organization_id() == organization_id)
            .cloned())
    }

    async fn list(
        &mut self,
        organization_id: Uuid,
        params: &ListParams,
    ) -> Result<(Vec<G>, i64), DatabaseError> {
        let mut rows: Vec<G> = G::table(&mut self.state)
            .rows
            .iter()
            .filter(|g| g.organization_id() == organization_id && params.matches(g.name()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        Ok(page(rows, params))
    }

    async fn add_member(&mut self, member: &GroupMember) -> Result<(), DatabaseError> {
        let table = G::table(&mut self.state);
        if table
            .members
            .iter()
            .any(|m| m.group_id == member.group_id && m.user_id == member.user_id)
        {
            return Err(unique(&format!("{}_users_pkey", G::KIND)));
        }
        table.members.push(member.clone());
        Ok(())
    }

    async fn remove_member(&mut self, group_id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let table = G::table(&mut self.state);
        let before = table.members.len();
        table.members.retain(|m| !(m.group_id == group_id && m.user_id == user_id));
        Ok(table.members.len() < before)
    }

    async fn find_member(
        &mut self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, DatabaseError> {
        Ok(G::table(&mut self.state)
            .members
            .iter()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&mut self, group_id: Uuid) -> Result<Vec<GroupMember>, DatabaseError> {
        let mut rows: Vec<GroupMember> = G::table(&mut self.state)
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn remove_user_in_organization(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let table = G::table(&mut self.state);
        let groups: Vec<Uuid> = table
            .rows
            .iter()
            .filter(|g| g.organization_id() == organization_id)
            .map(|g| g.id())
            .collect();
        let before = table.members.len();
        table
            .members
            .retain(|m| !(m.user_id == user_id && groups.contains(&m.group_id)));
        Ok((before - table.members.len()) as u64)
    }

    async fn remove_user_everywhere(&mut self, user_id: Uuid) -> Result<u64, DatabaseError> {
        let table = G::table(&mut self.state);
        let before = table.members.len();
        table.members.retain(|m| m.user_id != user_id);
        Ok((before - table.members.len()) as u64)
    }
}

/// Services over a fresh in-memory database.
pub struct Fixture {
    pub db: MemoryDatabase,
    pub services: Services,
}

impl Fixture {
    pub fn new() -> Self {
        let db = MemoryDatabase::new();
        let services = Services::new(Arc::new(db.clone()));
        Self { db, services }
    }

    pub async fn user(&self, name: &str) -> User {
        self.services
            .users
            .register(RegisterUser {
                email: format!("{}@example.com", name.to_lowercase()),
                name: name.to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn organization(&self, owner: &User, name: &str) -> Organization {
        self.services
            .organizations
            .create(
                owner.id,
                CreateOrganization {
                    name: name.to_string(),
                    description: None,
                },
            )
            .await
            .unwrap()
    }

    /// Invites `user` with `role_id` (default role when `None`) and accepts.
    pub async fn join(&self, organization: &Organization, inviter: &User, user: &User, role_id: Option<Uuid>) {
        self.services
            .members
            .invite(
                organization.id,
                inviter.id,
                crate::services::member_service::InviteMember {
                    email: user.email.clone(),
                    role_id,
                },
            )
            .await
            .unwrap();
        self.services.members.accept(organization.id, user.id).await.unwrap();
    }
}
