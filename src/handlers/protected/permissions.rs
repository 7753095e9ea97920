use serde::Serialize;

use crate::database::models::Permission;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct PermissionEntry {
    pub slug: &'static str,
    pub description: &'static str,
}

/// GET /api/permissions - the permission catalog
pub async fn catalog() -> ApiResult<Vec<PermissionEntry>> {
    let entries = Permission::ALL
        .iter()
        .map(|p| PermissionEntry {
            slug: p.as_str(),
            description: p.description(),
        })
        .collect();
    Ok(ApiResponse::success(entries))
}
