use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use super::{expect_affected, PgUnitOfWork, Table};
use crate::database::manager::DatabaseError;
use crate::database::models::Organization;
use crate::database::repository::OrganizationRepository;
use crate::types::ListParams;

const ORGANIZATIONS: Table<Organization> = Table::new("organizations", &["id"]);

#[async_trait]
impl OrganizationRepository for PgUnitOfWork {
    async fn insert(&mut self, organization: &Organization) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, slug, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(&organization.slug)
        .bind(&organization.description)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update(&mut self, organization: &Organization) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE organizations SET name = $2, slug = $3, description = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(&organization.slug)
        .bind(&organization.description)
        .bind(organization.updated_at)
        .execute(&mut *self.tx)
        .await?;
        expect_affected(result.rows_affected(), "Organization")
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        // Memberships reference roles with ON DELETE RESTRICT, so they go first
        sqlx::query("DELETE FROM organization_users WHERE organization_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        expect_affected(result.rows_affected(), "Organization")
    }

    async fn find(&mut self, id: Uuid) -> Result<Option<Organization>, DatabaseError> {
        ORGANIZATIONS.select_one(&mut *self.tx, json!({ "id": id })).await
    }

    async fn find_by_slug(&mut self, slug: &str) -> Result<Option<Organization>, DatabaseError> {
        ORGANIZATIONS.select_one(&mut *self.tx, json!({ "slug": slug })).await
    }

    async fn lock(&mut self, id: Uuid) -> Result<bool, DatabaseError> {
        let row = sqlx::query("SELECT id FROM organizations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    async fn list_by_ids(
        &mut self,
        ids: &[Uuid],
        params: &ListParams,
    ) -> Result<(Vec<Organization>, i64), DatabaseError> {
        ORGANIZATIONS
            .select_page(&mut *self.tx, json!({ "id": { "$in": ids } }), "name asc, id asc", params)
            .await
    }
}
