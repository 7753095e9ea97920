// handlers/mod.rs - Two-tier handler architecture
//
// Public (no auth) → Protected (JWT auth + validated user)
pub mod public; // No authentication required (/, /health, /auth/*)
pub mod protected; // JWT authentication required (/api/*)
