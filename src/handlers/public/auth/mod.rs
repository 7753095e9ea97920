// handlers/public/auth/mod.rs - Public authentication handlers
//
// Account creation and token acquisition; everything under /api needs the
// token issued here.

pub mod login;
pub mod register;

pub use login::login_post;
pub use register::register_post;
