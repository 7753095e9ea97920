use std::sync::Arc;

use crate::database::Database;
use crate::services::Services;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub services: Services,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>) -> Self {
        let services = Services::new(db.clone());
        Self { db, services }
    }
}
