// Organization-scoped routes: /api/organizations/:org/...

pub mod groups;
pub mod members;
pub mod organization;
pub mod roles;

pub use organization::{
    delete as organization_delete, get as organization_get, list as organization_list,
    patch as organization_patch, permissions as organization_permissions, post as organization_post,
};
