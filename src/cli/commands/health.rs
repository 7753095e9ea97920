use serde_json::Value;

use crate::cli::{utils, OutputFormat};

pub async fn handle(base_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let response = reqwest::get(&url).await?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        utils::output_success(output_format, &format!("{} is healthy", base_url), Some(body))
    } else {
        utils::output_error(
            output_format,
            &format!("{} answered {}", base_url, status),
            Some("UNHEALTHY"),
        )?;
        anyhow::bail!("health check failed with status {}", status)
    }
}
