pub mod group;
pub mod membership;
pub mod organization;
pub mod permission;
pub mod project;
pub mod role;
pub mod team;
pub mod user;
pub mod workspace;

pub use group::{Group, GroupAction, GroupMember};
pub use membership::{MembershipError, MembershipStatus, OrganizationUser};
pub use organization::Organization;
pub use permission::Permission;
pub use project::Project;
pub use role::Role;
pub use team::Team;
pub use user::User;
pub use workspace::Workspace;
