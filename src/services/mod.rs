pub mod access_service;
pub mod error;
pub mod group_service;
pub mod member_service;
pub mod organization_service;
pub mod role_service;
pub mod user_service;
pub mod validation;

use std::sync::Arc;

use crate::database::models::{Project, Team, Workspace};
use crate::database::Database;

pub use access_service::AccessService;
pub use error::{ServiceError, ServiceResult};
pub use group_service::GroupService;
pub use member_service::MemberService;
pub use organization_service::OrganizationService;
pub use role_service::RoleService;
pub use user_service::UserService;

/// Every service, sharing one database handle.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub organizations: OrganizationService,
    pub members: MemberService,
    pub roles: RoleService,
    pub access: AccessService,
    pub workspaces: GroupService<Workspace>,
    pub teams: GroupService<Team>,
    pub projects: GroupService<Project>,
}

impl Services {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            users: UserService::new(db.clone()),
            organizations: OrganizationService::new(db.clone()),
            members: MemberService::new(db.clone()),
            roles: RoleService::new(db.clone()),
            access: AccessService::new(db.clone()),
            workspaces: GroupService::new(db.clone()),
            teams: GroupService::new(db.clone()),
            projects: GroupService::new(db),
        }
    }
}

/// Typed access to the per-kind group service from generic handlers.
pub trait GroupServices: crate::database::GroupStore {
    fn service(services: &Services) -> &GroupService<Self>;
}

impl GroupServices for Workspace {
    fn service(services: &Services) -> &GroupService<Self> {
        &services.workspaces
    }
}

impl GroupServices for Team {
    fn service(services: &Services) -> &GroupService<Self> {
        &services.teams
    }
}

impl GroupServices for Project {
    fn service(services: &Services) -> &GroupService<Self> {
        &services.projects
    }
}
