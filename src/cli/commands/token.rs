use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::{utils, OutputFormat};

/// Signs with the configured secret; the user is not looked up.
pub fn handle(user_id: Uuid, email: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let claims = Claims::new(user_id, email);
    let token = generate_jwt(&claims)?;

    match output_format {
        OutputFormat::Json => utils::output_success(
            output_format,
            "Token issued",
            Some(json!({ "token": token, "expires_at": claims.exp })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
