use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use super::{expect_affected, PgUnitOfWork, Table};
use crate::database::manager::DatabaseError;
use crate::database::models::User;
use crate::database::repository::UserRepository;

const USERS: Table<User> = Table::new("users", &["id"]);

#[async_trait]
impl UserRepository for PgUnitOfWork {
    async fn insert(&mut self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update(&mut self, user: &User) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, name = $3, password_hash = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await?;
        expect_affected(result.rows_affected(), "User")
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        expect_affected(result.rows_affected(), "User")
    }

    async fn find(&mut self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        USERS.select_one(&mut *self.tx, json!({ "id": id })).await
    }

    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, DatabaseError> {
        USERS.select_one(&mut *self.tx, json!({ "email": email })).await
    }

    async fn find_many(&mut self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        USERS.select_ids(&mut *self.tx, ids).await
    }
}
