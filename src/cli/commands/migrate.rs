use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect().await?;
    DatabaseManager::migrate(&pool).await?;

    let applied: Vec<i64> = crate::database::manager::MIGRATOR
        .iter()
        .map(|migration| migration.version)
        .collect();
    utils::output_success(
        output_format,
        "Database migrations applied",
        Some(json!({ "versions": applied })),
    )
}
