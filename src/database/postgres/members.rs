use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use super::{expect_affected, PgUnitOfWork, Table};
use crate::database::manager::DatabaseError;
use crate::database::models::{MembershipStatus, OrganizationUser};
use crate::database::repository::MemberRepository;
use crate::filter::FilterData;
use crate::types::ListParams;

const MEMBERS: Table<OrganizationUser> = Table::new(
    "organization_users",
    &["id", "organization_id", "user_id", "role_id", "invited_by"],
);

#[async_trait]
impl MemberRepository for PgUnitOfWork {
    async fn insert(&mut self, member: &OrganizationUser) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO organization_users
                (id, organization_id, user_id, role_id, status, invited_by, invited_at, joined_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(member.id)
        .bind(member.organization_id)
        .bind(member.user_id)
        .bind(member.role_id)
        .bind(member.status.as_str())
        .bind(member.invited_by)
        .bind(member.invited_at)
        .bind(member.joined_at)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update(&mut self, member: &OrganizationUser) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE organization_users
            SET role_id = $2, status = $3, invited_by = $4, invited_at = $5, joined_at = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(member.id)
        .bind(member.role_id)
        .bind(member.status.as_str())
        .bind(member.invited_by)
        .bind(member.invited_at)
        .bind(member.joined_at)
        .bind(member.updated_at)
        .execute(&mut *self.tx)
        .await?;
        expect_affected(result.rows_affected(), "Membership")
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM organization_users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        expect_affected(result.rows_affected(), "Membership")
    }

    async fn find(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationUser>, DatabaseError> {
        MEMBERS
            .select_one(
                &mut *self.tx,
                json!({ "organization_id": organization_id, "user_id": user_id }),
            )
            .await
    }

    async fn list(
        &mut self,
        organization_id: Uuid,
        status: Option<MembershipStatus>,
        params: &ListParams,
    ) -> Result<(Vec<OrganizationUser>, i64), DatabaseError> {
        let mut where_clause = json!({ "organization_id": organization_id });
        if let Some(status) = status {
            where_clause["status"] = json!(status.as_str());
        }
        // Memberships have no name column to search
        let unsearched = ListParams {
            search: None,
            ..params.clone()
        };
        MEMBERS
            .select_page(&mut *self.tx, where_clause, "created_at asc, id asc", &unsearched)
            .await
    }

    async fn list_for_user(
        &mut self,
        user_id: Uuid,
        status: Option<MembershipStatus>,
    ) -> Result<Vec<OrganizationUser>, DatabaseError> {
        let mut where_clause = json!({ "user_id": user_id });
        if let Some(status) = status {
            where_clause["status"] = json!(status.as_str());
        }
        let filter = FilterData {
            where_clause: Some(where_clause),
            order: Some(json!("invited_at desc")),
            ..Default::default()
        };
        MEMBERS.select_any(&mut *self.tx, filter).await
    }

    async fn count_active_with_role(
        &mut self,
        organization_id: Uuid,
        role_id: Uuid,
    ) -> Result<i64, DatabaseError> {
        MEMBERS
            .count(
                &mut *self.tx,
                json!({
                    "organization_id": organization_id,
                    "role_id": role_id,
                    "status": MembershipStatus::Active.as_str(),
                }),
            )
            .await
    }

    async fn reassign_role(&mut self, from: Uuid, to: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE organization_users SET role_id = $2, updated_at = NOW() WHERE role_id = $1",
        )
        .bind(from)
        .bind(to)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_for_user(&mut self, user_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM organization_users WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}
