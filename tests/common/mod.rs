#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Inherits DATABASE_URL and the rest of the environment
        let child = Command::new(env!("CARGO_BIN_EXE_orgkit-api"))
            .env("API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Server owned by the calling test, or `None` when no database is configured.
/// The process is killed when the returned value is dropped.
pub async fn start_server() -> Result<Option<TestServer>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return Ok(None);
    }
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(Some(server))
}

/// Binds `$server` to a running server for the rest of the test, or
/// returns early when none is available.
macro_rules! server_or_skip {
    ($server:ident) => {
        let owned = match common::start_server().await? {
            Some(server) => server,
            None => return Ok(()),
        };
        let $server = &owned;
    };
}

/// Unique suffix so repeated runs against one database do not collide.
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

pub struct Api {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl Api {
    pub fn new(server: &TestServer) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: server.base_url.clone(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Reply> {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        let body = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
        Ok(Reply { status, body })
    }

    pub async fn get(&self, path: &str) -> Result<Reply> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Reply> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<Reply> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Reply> {
        self.send(Method::DELETE, path, None).await
    }
}

pub struct Account {
    pub id: String,
    pub email: String,
    pub api: Api,
}

/// Registers a fresh user and logs in.
pub async fn account(server: &TestServer, name: &str) -> Result<Account> {
    let api = Api::new(server);
    let email = format!("{}@example.com", unique(&name.to_lowercase()));

    let reg = api
        .post("/auth/register", json!({ "email": email, "name": name, "password": "password123" }))
        .await?;
    anyhow::ensure!(reg.status == StatusCode::CREATED, "register failed: {}", reg.body);

    let login = api
        .post("/auth/login", json!({ "email": email, "password": "password123" }))
        .await?;
    anyhow::ensure!(login.status == StatusCode::OK, "login failed: {}", login.body);

    let token = login.data()["token"].as_str().context("token missing")?.to_string();
    let id = login.data()["user"]["id"].as_str().context("user id missing")?.to_string();
    Ok(Account {
        id,
        email,
        api: api.with_token(token),
    })
}
