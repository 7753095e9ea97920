//! PostgreSQL implementation of the repository traits.

mod groups;
mod members;
mod organizations;
mod roles;
mod table;
mod users;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Project, Team, Workspace};
use crate::database::repository::{
    Database, GroupRepository, MemberRepository, OrganizationRepository, RoleRepository,
    UnitOfWork, UserRepository,
};

pub use table::Table;

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DatabaseError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

/// One open transaction. Every repository accessor hands out the same
/// transaction, so all work done through it commits or rolls back together.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
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
        self.tx.commit().await?;
        Ok(())
    }
}

/// Maps a zero-row write to `NotFound`.
fn expect_affected(rows: u64, what: &str) -> Result<(), DatabaseError> {
    if rows == 0 {
        Err(DatabaseError::NotFound(format!("{} not found", what)))
    } else {
        Ok(())
    }
}
