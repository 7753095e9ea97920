//! Workspaces, teams and projects are managed by one generic service;
//! only creation (and a project's workspace) differ per kind.

use serde::{Deserialize, Deserializer};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::validation;
use crate::database::models::{GroupMember, Project, Team, Workspace};
use crate::database::{Database, GroupStore, UnitOfWork};
use crate::types::{ListParams, Paged};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub workspace_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGroup {
    pub name: Option<String>,
    /// A blank description clears it.
    pub description: Option<String>,
    /// Projects only: `null` detaches, an id moves the project.
    #[serde(default, deserialize_with = "present")]
    pub workspace_id: Option<Option<Uuid>>,
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub struct GroupService<G> {
    db: Arc<dyn Database>,
    _kind: PhantomData<fn() -> G>,
}

impl<G> Clone for GroupService<G> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _kind: PhantomData,
        }
    }
}

impl<G: GroupStore> GroupService<G> {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db, _kind: PhantomData }
    }

    pub async fn get(&self, organization_id: Uuid, id: Uuid) -> ServiceResult<G> {
        let mut uow = self.db.begin().await?;
        find_group::<G>(uow.as_mut(), organization_id, id).await
    }

    pub async fn list(&self, organization_id: Uuid, params: &ListParams) -> ServiceResult<Paged<G>> {
        let mut uow = self.db.begin().await?;
        let (items, total) = G::repository(uow.as_mut()).list(organization_id, params).await?;
        Ok(Paged::new(items, total, params))
    }

    pub async fn update(&self, organization_id: Uuid, id: Uuid, input: UpdateGroup) -> ServiceResult<G> {
        let name = input.name.as_deref().map(|n| validation::name("name", n)).transpose()?;
        let description = match input.description {
            Some(d) => Some(validation::description(Some(d))?),
            None => None,
        };
        if input.workspace_id.is_some() && !G::HAS_WORKSPACE {
            return Err(ServiceError::field(
                "workspace_id",
                format!("a {} cannot be placed in a workspace", G::KIND),
            ));
        }

        let mut uow = self.db.begin().await?;
        let mut group = find_group::<G>(uow.as_mut(), organization_id, id).await?;
        if let Some(workspace_id) = input.workspace_id {
            if let Some(workspace_id) = workspace_id {
                find_group::<Workspace>(uow.as_mut(), organization_id, workspace_id).await?;
            }
            group.set_workspace(workspace_id);
        }
        if let Some(name) = name {
            group.rename(name);
        }
        if let Some(description) = description {
            group.set_description(description);
        }
        G::repository(uow.as_mut()).update(&group).await?;
        uow.commit().await?;
        Ok(group)
    }

    pub async fn delete(&self, organization_id: Uuid, id: Uuid) -> ServiceResult<()> {
        let mut uow = self.db.begin().await?;
        find_group::<G>(uow.as_mut(), organization_id, id).await?;
        G::repository(uow.as_mut()).delete(id).await?;
        uow.commit().await?;
        info!(organization_id = %organization_id, id = %id, kind = G::KIND, "deleted group");
        Ok(())
    }

    /// The user must be an active member of the group's organization.
    pub async fn add_member(&self, organization_id: Uuid, id: Uuid, user_id: Uuid) -> ServiceResult<GroupMember> {
        let mut uow = self.db.begin().await?;
        find_group::<G>(uow.as_mut(), organization_id, id).await?;

        match uow.members().find(organization_id, user_id).await? {
            Some(m) if m.is_active() => {}
            _ => {
                return Err(ServiceError::field(
                    "user_id",
                    "must be an active member of the organization",
                ))
            }
        }
        if G::repository(uow.as_mut()).find_member(id, user_id).await?.is_some() {
            return Err(ServiceError::Conflict(format!("User is already a member of this {}", G::KIND)));
        }

        let member = GroupMember::new(id, user_id);
        G::repository(uow.as_mut()).add_member(&member).await?;
        uow.commit().await?;

        info!(organization_id = %organization_id, id = %id, user_id = %user_id, kind = G::KIND, "added group member");
        Ok(member)
    }

    pub async fn remove_member(&self, organization_id: Uuid, id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let mut uow = self.db.begin().await?;
        find_group::<G>(uow.as_mut(), organization_id, id).await?;
        if !G::repository(uow.as_mut()).remove_member(id, user_id).await? {
            return Err(ServiceError::not_found("Member"));
        }
        uow.commit().await?;
        Ok(())
    }

    pub async fn list_members(&self, organization_id: Uuid, id: Uuid) -> ServiceResult<Vec<GroupMember>> {
        let mut uow = self.db.begin().await?;
        find_group::<G>(uow.as_mut(), organization_id, id).await?;
        Ok(G::repository(uow.as_mut()).list_members(id).await?)
    }

    async fn insert(&self, mut uow: Box<dyn UnitOfWork>, group: G) -> ServiceResult<G> {
        G::repository(uow.as_mut()).insert(&group).await?;
        uow.commit().await?;
        info!(organization_id = %group.organization_id(), id = %group.id(), kind = G::KIND, "created group");
        Ok(group)
    }
}

impl GroupService<Workspace> {
    pub async fn create(&self, organization_id: Uuid, input: CreateGroup) -> ServiceResult<Workspace> {
        let name = validation::name("name", &input.name)?;
        let description = validation::description(input.description)?;

        let mut uow = self.db.begin().await?;
        ensure_organization(uow.as_mut(), organization_id).await?;
        self.insert(uow, Workspace::new(organization_id, name, description)).await
    }
}

impl GroupService<Team> {
    pub async fn create(&self, organization_id: Uuid, input: CreateGroup) -> ServiceResult<Team> {
        let name = validation::name("name", &input.name)?;
        let description = validation::description(input.description)?;

        let mut uow = self.db.begin().await?;
        ensure_organization(uow.as_mut(), organization_id).await?;
        self.insert(uow, Team::new(organization_id, name, description)).await
    }
}

impl GroupService<Project> {
    pub async fn create(&self, organization_id: Uuid, input: CreateProject) -> ServiceResult<Project> {
        let name = validation::name("name", &input.name)?;
        let description = validation::description(input.description)?;

        let mut uow = self.db.begin().await?;
        ensure_organization(uow.as_mut(), organization_id).await?;
        if let Some(workspace_id) = input.workspace_id {
            find_group::<Workspace>(uow.as_mut(), organization_id, workspace_id).await?;
        }
        let project = Project::new(organization_id, input.workspace_id, name, description);
        self.insert(uow, project).await
    }

    /// `None` detaches the project from its workspace.
    pub async fn move_to_workspace(
        &self,
        organization_id: Uuid,
        id: Uuid,
        workspace_id: Option<Uuid>,
    ) -> ServiceResult<Project> {
        let input = UpdateGroup {
            workspace_id: Some(workspace_id),
            ..Default::default()
        };
        self.update(organization_id, id, input).await
    }
}

/// Lookups are always scoped by organization, so foreign ids read as missing.
async fn find_group<G: GroupStore>(uow: &mut dyn UnitOfWork, organization_id: Uuid, id: Uuid) -> ServiceResult<G> {
    G::repository(uow)
        .find(organization_id, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("{} not found", capitalize(G::KIND))))
}

async fn ensure_organization(uow: &mut dyn UnitOfWork, organization_id: Uuid) -> ServiceResult<()> {
    uow.organizations()
        .find(organization_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Organization"))?;
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
