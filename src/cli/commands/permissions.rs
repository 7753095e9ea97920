use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::database::models::Permission;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let catalog: Vec<_> = Permission::ALL
                .iter()
                .map(|p| json!({ "slug": p.as_str(), "description": p.description() }))
                .collect();
            utils::output_success(
                output_format,
                &format!("{} permissions", catalog.len()),
                Some(json!({ "permissions": catalog })),
            )
        }
        OutputFormat::Text => {
            for permission in Permission::ALL.iter() {
                println!("{:<22} {}", permission.as_str(), permission.description());
            }
            Ok(())
        }
    }
}
