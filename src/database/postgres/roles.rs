use async_trait::async_trait;
use serde_json::json;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{expect_affected, PgUnitOfWork, Table};
use crate::database::manager::DatabaseError;
use crate::database::models::Role;
use crate::database::repository::RoleRepository;
use crate::filter::FilterData;

/// Roles are written to `roles` + `role_permissions` and read back through the view.
const ROLES: Table<Role> = Table::new("roles_with_permissions", &["id", "organization_id"]);

async fn replace_permissions(conn: &mut PgConnection, role: &Role) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
        .bind(role.id)
        .execute(&mut *conn)
        .await?;

    if role.permissions.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission, position)
        SELECT $1, slug, ord::INTEGER
        FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS p(slug, ord)
        "#,
    )
    .bind(role.id)
    .bind(role.permissions.slugs())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl RoleRepository for PgUnitOfWork {
    async fn insert(&mut self, role: &Role) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, organization_id, name, description, is_system, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(role.id)
        .bind(role.organization_id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.is_system)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&mut *self.tx)
        .await?;
        replace_permissions(&mut *self.tx, role).await
    }

    async fn update(&mut self, role: &Role) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE roles SET name = $2, description = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.updated_at)
        .execute(&mut *self.tx)
        .await?;
        expect_affected(result.rows_affected(), "Role")?;
        replace_permissions(&mut *self.tx, role).await
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        expect_affected(result.rows_affected(), "Role")
    }

    async fn find(&mut self, id: Uuid) -> Result<Option<Role>, DatabaseError> {
        ROLES.select_one(&mut *self.tx, json!({ "id": id })).await
    }

    async fn list_visible(&mut self, organization_id: Uuid) -> Result<Vec<Role>, DatabaseError> {
        let filter = FilterData {
            where_clause: Some(json!({
                "$or": [
                    { "organization_id": null },
                    { "organization_id": organization_id },
                ]
            })),
            order: Some(json!("is_system desc, name asc")),
            ..Default::default()
        };
        ROLES.select_any(&mut *self.tx, filter).await
    }

    async fn count_for_organization(&mut self, organization_id: Uuid) -> Result<i64, DatabaseError> {
        ROLES
            .count(&mut *self.tx, json!({ "organization_id": organization_id }))
            .await
    }
}
