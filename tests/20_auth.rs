#[macro_use]
mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn register_login_and_whoami() -> Result<()> {
    server_or_skip!(server);
    let ada = common::account(server, "Ada").await?;

    let res = ada.api.get("/api/auth/whoami").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["email"], ada.email.as_str());
    assert_eq!(res.data()["organizations"]["total"], 0);
    assert!(res.data().get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    server_or_skip!(server);
    let ada = common::account(server, "Ada").await?;

    let api = common::Api::new(server);
    let res = api
        .post(
            "/auth/register",
            json!({ "email": ada.email.to_uppercase(), "name": "Other", "password": "password123" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn register_validates_input() -> Result<()> {
    server_or_skip!(server);
    let api = common::Api::new(server);

    let res = api
        .post("/auth/register", json!({ "email": "not-an-email", "name": "", "password": "short" }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = api.post("/auth/register", json!({ "email": "x@example.com" })).await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    server_or_skip!(server);
    let ada = common::account(server, "Ada").await?;

    let res = common::Api::new(server)
        .post("/auth/login", json!({ "email": ada.email, "password": "wrong-password" }))
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn deleted_user_token_stops_working() -> Result<()> {
    server_or_skip!(server);
    let ada = common::account(server, "Ada").await?;

    let res = ada.api.delete("/api/users/me").await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = ada.api.get("/api/auth/whoami").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}
