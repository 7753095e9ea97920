use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{postgres::PgRow, FromRow, PgConnection};
use uuid::Uuid;

use super::{expect_affected, PgUnitOfWork, Table};
use crate::database::manager::DatabaseError;
use crate::database::models::{Group, GroupMember, Project, Team, Workspace};
use crate::database::repository::GroupRepository;
use crate::filter::FilterData;
use crate::types::ListParams;

/// Table layout of a group kind. Member tables share the
/// `(group_id, user_id, created_at)` shape.
#[async_trait]
pub trait PgGroup: Group + for<'r> FromRow<'r, PgRow> {
    const TABLE: &'static str;
    const MEMBER_TABLE: &'static str;
    const UUID_COLUMNS: &'static [&'static str] = &["id", "organization_id"];

    async fn insert_row(&self, conn: &mut PgConnection) -> Result<(), DatabaseError>;
    async fn update_row(&self, conn: &mut PgConnection) -> Result<u64, DatabaseError>;
}

const MEMBER_UUID_COLUMNS: &[&str] = &["group_id", "user_id"];

#[allow(clippy::too_many_arguments)]
async fn insert_named(
    conn: &mut PgConnection,
    table: &str,
    id: Uuid,
    organization_id: Uuid,
    name: &str,
    description: Option<&str>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let sql = format!(
        "INSERT INTO {} (id, organization_id, name, description, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)",
        table
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(organization_id)
        .bind(name)
        .bind(description)
        .bind(created_at)
        .bind(updated_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn update_named(
    conn: &mut PgConnection,
    table: &str,
    id: Uuid,
    name: &str,
    description: Option<&str>,
    updated_at: DateTime<Utc>,
) -> Result<u64, DatabaseError> {
    let sql = format!(
        "UPDATE {} SET name = $2, description = $3, updated_at = $4 WHERE id = $1",
        table
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(updated_at)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

#[async_trait]
impl PgGroup for Workspace {
    const TABLE: &'static str = "workspaces";
    const MEMBER_TABLE: &'static str = "workspace_users";

    async fn insert_row(&self, conn: &mut PgConnection) -> Result<(), DatabaseError> {
        insert_named(
            conn,
            Self::TABLE,
            self.id,
            self.organization_id,
            &self.name,
            self.description.as_deref(),
            self.created_at,
            self.updated_at,
        )
        .await
    }

    async fn update_row(&self, conn: &mut PgConnection) -> Result<u64, DatabaseError> {
        update_named(conn, Self::TABLE, self.id, &self.name, self.description.as_deref(), self.updated_at).await
    }
}

#[async_trait]
impl PgGroup for Team {
    const TABLE: &'static str = "teams";
    const MEMBER_TABLE: &'static str = "team_users";

    async fn insert_row(&self, conn: &mut PgConnection) -> Result<(), DatabaseError> {
        insert_named(
            conn,
            Self::TABLE,
            self.id,
            self.organization_id,
            &self.name,
            self.description.as_deref(),
            self.created_at,
            self.updated_at,
        )
        .await
    }

    async fn update_row(&self, conn: &mut PgConnection) -> Result<u64, DatabaseError> {
        update_named(conn, Self::TABLE, self.id, &self.name, self.description.as_deref(), self.updated_at).await
    }
}

#[async_trait]
impl PgGroup for Project {
    const TABLE: &'static str = "projects";
    const MEMBER_TABLE: &'static str = "project_users";
    const UUID_COLUMNS: &'static [&'static str] = &["id", "organization_id", "workspace_id"];

    async fn insert_row(&self, conn: &mut PgConnection) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, organization_id, workspace_id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.organization_id)
        .bind(self.workspace_id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn update_row(&self, conn: &mut PgConnection) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE projects SET workspace_id = $2, name = $3, description = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(self.id)
        .bind(self.workspace_id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl<G: PgGroup> GroupRepository<G> for PgUnitOfWork {
    async fn insert(&mut self, group: &G) -> Result<(), DatabaseError> {
        group.insert_row(&mut *self.tx).await
    }

    async fn update(&mut self, group: &G) -> Result<(), DatabaseError> {
        let rows = group.update_row(&mut *self.tx).await?;
        expect_affected(rows, G::KIND)
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", G::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&mut *self.tx).await?;
        expect_affected(result.rows_affected(), G::KIND)
    }

    async fn find(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<G>, DatabaseError> {
        Table::<G>::new(G::TABLE, G::UUID_COLUMNS)
            .select_one(&mut *self.tx, json!({ "organization_id": organization_id, "id": id }))
            .await
    }

    async fn list(
        &mut self,
        organization_id: Uuid,
        params: &ListParams,
    ) -> Result<(Vec<G>, i64), DatabaseError> {
        Table::<G>::new(G::TABLE, G::UUID_COLUMNS)
            .select_page(
                &mut *self.tx,
                json!({ "organization_id": organization_id }),
                "name asc, id asc",
                params,
            )
            .await
    }

    async fn add_member(&mut self, member: &GroupMember) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (group_id, user_id, created_at) VALUES ($1, $2, $3)",
            G::MEMBER_TABLE
        );
        sqlx::query(&sql)
            .bind(member.group_id)
            .bind(member.user_id)
            .bind(member.created_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn remove_member(&mut self, group_id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE group_id = $1 AND user_id = $2", G::MEMBER_TABLE);
        let result = sqlx::query(&sql)
            .bind(group_id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_member(
        &mut self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, DatabaseError> {
        Table::<GroupMember>::new(G::MEMBER_TABLE, MEMBER_UUID_COLUMNS)
            .select_one(&mut *self.tx, json!({ "group_id": group_id, "user_id": user_id }))
            .await
    }

    async fn list_members(&mut self, group_id: Uuid) -> Result<Vec<GroupMember>, DatabaseError> {
        let filter = FilterData {
            where_clause: Some(json!({ "group_id": group_id })),
            order: Some(json!("created_at asc")),
            ..Default::default()
        };
        Table::<GroupMember>::new(G::MEMBER_TABLE, MEMBER_UUID_COLUMNS)
            .select_any(&mut *self.tx, filter)
            .await
    }

    async fn remove_user_in_organization(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let sql = format!(
            "DELETE FROM {members} m USING {groups} g WHERE m.group_id = g.id AND g.organization_id = $1 AND m.user_id = $2",
            members = G::MEMBER_TABLE,
            groups = G::TABLE,
        );
        let result = sqlx::query(&sql)
            .bind(organization_id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn remove_user_everywhere(&mut self, user_id: Uuid) -> Result<u64, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE user_id = $1", G::MEMBER_TABLE);
        let result = sqlx::query(&sql).bind(user_id).execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }
}
