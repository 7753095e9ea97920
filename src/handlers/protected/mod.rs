// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here runs behind jwt_auth_middleware and
// validate_user_middleware, so handlers receive a ValidatedUser extension.
// Organization-scoped handlers authorize through utils::authorize first.

pub mod auth;
pub mod invitations;
pub mod organizations;
pub mod permissions;
pub mod users;
pub mod utils;
