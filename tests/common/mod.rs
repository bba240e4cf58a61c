use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Password the spawned server accepts for local sign-in
pub const LOCAL_PASSWORD: &str = "qube-test-pass";
pub const JWT_SECRET: &str = "qube-integration-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Local-only server: no hosted provider, no database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_qube-ops-api"));
        cmd.env("QUBE_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("QUBE_FORCE_LOCAL_AUTH", "true")
            .env("QUBE_DISABLE_LOCAL_AUTH", "false")
            .env("QUBE_LOCAL_AUTH_PASSWORD", LOCAL_PASSWORD)
            .env("QUBE_AUTH_JWT_SECRET", JWT_SECRET)
            .env("QUBE_SUPER_ADMIN_EMAIL", "admin@qube.com")
            .env_remove("QUBE_AUTH_URL")
            .env_remove("QUBE_AUTH_ANON_KEY")
            .env_remove("DATABASE_URL")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Sign in through the local fallback and return the issued bearer token
#[allow(dead_code)]
pub async fn login(server: &TestServer, email: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": email, "password": LOCAL_PASSWORD }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login for {} returned {}", email, res.status());

    let body: Value = res.json().await?;
    body["access_token"]
        .as_str()
        .map(str::to_string)
        .context("login response carries no access_token")
}
