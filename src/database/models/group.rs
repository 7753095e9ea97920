//! Workspaces, teams and projects share one shape: an organization-scoped,
//! named grouping of members. [`Group`] captures that shape so storage,
//! services and handlers are written once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::permission::Permission;
use super::{Project, Team, Workspace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    Read,
    Create,
    Update,
    Delete,
    Members,
}

/// Row of a group's member table (`workspace_users`, `team_users`, `project_users`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn new(group_id: Uuid, user_id: Uuid) -> Self {
        Self {
            group_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

pub trait Group: Clone + Serialize + Send + Sync + Unpin + 'static {
    /// Singular noun used in messages ("workspace").
    const KIND: &'static str;

    fn id(&self) -> Uuid;
    fn organization_id(&self) -> Uuid;
    fn name(&self) -> &str;
    fn rename(&mut self, name: String);
    fn set_description(&mut self, description: Option<String>);
    fn permission(action: GroupAction) -> Permission;

    /// Only projects can be placed in a workspace.
    const HAS_WORKSPACE: bool = false;

    fn set_workspace(&mut self, _workspace_id: Option<Uuid>) {}
}

impl Group for Workspace {
    const KIND: &'static str = "workspace";

    fn id(&self) -> Uuid {
        self.id
    }

    fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rename(&mut self, name: String) {
        Workspace::rename(self, name)
    }

    fn set_description(&mut self, description: Option<String>) {
        Workspace::set_description(self, description)
    }

    fn permission(action: GroupAction) -> Permission {
        match action {
            GroupAction::Read => Permission::WorkspacesRead,
            GroupAction::Create => Permission::WorkspacesCreate,
            GroupAction::Update => Permission::WorkspacesUpdate,
            GroupAction::Delete => Permission::WorkspacesDelete,
            GroupAction::Members => Permission::WorkspacesMembers,
        }
    }
}

impl Group for Team {
    const KIND: &'static str = "team";

    fn id(&self) -> Uuid {
        self.id
    }

    fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rename(&mut self, name: String) {
        Team::rename(self, name)
    }

    fn set_description(&mut self, description: Option<String>) {
        Team::set_description(self, description)
    }

    fn permission(action: GroupAction) -> Permission {
        match action {
            GroupAction::Read => Permission::TeamsRead,
            GroupAction::Create => Permission::TeamsCreate,
            GroupAction::Update => Permission::TeamsUpdate,
            GroupAction::Delete => Permission::TeamsDelete,
            GroupAction::Members => Permission::TeamsMembers,
        }
    }
}

impl Group for Project {
    const KIND: &'static str = "project";
    const HAS_WORKSPACE: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rename(&mut self, name: String) {
        Project::rename(self, name)
    }

    fn set_description(&mut self, description: Option<String>) {
        Project::set_description(self, description)
    }

    fn set_workspace(&mut self, workspace_id: Option<Uuid>) {
        self.move_to_workspace(workspace_id)
    }

    fn permission(action: GroupAction) -> Permission {
        match action {
            GroupAction::Read => Permission::ProjectsRead,
            GroupAction::Create => Permission::ProjectsCreate,
            GroupAction::Update => Permission::ProjectsUpdate,
            GroupAction::Delete => Permission::ProjectsDelete,
            GroupAction::Members => Permission::ProjectsMembers,
        }
    }
}
