//! Maintenance client used by the `sweep` and `stats` commands.
//!
//! redb holds an exclusive lock on each database file while a process has it
//! open, so the CLI cannot open the stores of a running `snapbooth serve`.
//! The commands go through the server's `/maintenance` routes instead and
//! open the files directly only when no server answers.
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! use snapbooth::daemon::client::{self, MaintenanceClient};
//! use std::path::Path;
//!
//! let client = MaintenanceClient::new("http://127.0.0.1:8080", None);
//! let (report, target) = client::sweep(&client, Path::new("/var/lib/snapbooth")).await?;
//! println!("evicted {} via {target}", report.evicted);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result, bail};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::constants::{API_KEY_ENV, API_KEY_HEADER, SERVER_PROBE_TIMEOUT_MS};
use crate::daemon::config::Config;
use crate::daemon::http::{StatsResponse, SweepResponse};
use crate::daemon::services;

/// Where a maintenance operation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Through a running server's HTTP API
    Server,
    /// Against the database files directly
    Local,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Local => write!(f, "local files"),
        }
    }
}

/// HTTP client for the maintenance routes of a running server.
#[derive(Debug, Clone)]
pub struct MaintenanceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl MaintenanceClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    /// Targets the server described by `config`, with the API key from
    /// `SNAPBOOTH_API_KEY`. Wildcard bind addresses are reached on loopback.
    pub fn from_config(config: &Config) -> Self {
        let host = match config.server.host.as_str() {
            "" | "0.0.0.0" => "127.0.0.1".to_string(),
            "::" => "[::1]".to_string(),
            host if host.contains(':') => format!("[{host}]"),
            host => host.to_string(),
        };
        let api_key = std::env::var(API_KEY_ENV).ok();
        Self::new(format!("http://{host}:{}", config.server.port), api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a server answers `GET /health`.
    pub async fn is_running(&self) -> bool {
        self.http
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_millis(SERVER_PROBE_TIMEOUT_MS))
            .send()
            .await
            .is_ok_and(|resp| resp.status().is_success())
    }

    /// POST /maintenance/sweep
    pub async fn sweep(&self) -> Result<SweepResponse> {
        let request = self.http.post(format!("{}/maintenance/sweep", self.base_url));
        self.send(request).await
    }

    /// GET /maintenance/stats
    pub async fn stats(&self) -> Result<StatsResponse> {
        let request = self.http.get(format!("{}/maintenance/stats", self.base_url));
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        };

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach server at {}", self.base_url))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            bail!("Server at {} rejected the API key (set {API_KEY_ENV})", self.base_url);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Server at {} returned {status}: {body}", self.base_url);
        }

        response
            .json()
            .await
            .context("Failed to decode server response")
    }
}

/// Evicts expired sessions through the running server, or directly from
/// `data_dir` when none answers.
pub async fn sweep(
    client: &MaintenanceClient,
    data_dir: &Path,
) -> Result<(SweepResponse, Target)> {
    if client.is_running().await {
        let report = client.sweep().await?;
        return Ok((report, Target::Server));
    }

    tracing::debug!(
        url = client.base_url(),
        data_dir = %data_dir.display(),
        "No server answered, sweeping the database directly"
    );
    let store = services::open_sessions(data_dir)?;
    let report = store.sweep_async().await?;
    Ok((report.into(), Target::Local))
}

/// Reads store counters through the running server, or directly from
/// `data_dir` when none answers.
pub async fn stats(
    client: &MaintenanceClient,
    data_dir: &Path,
) -> Result<(StatsResponse, Target)> {
    if client.is_running().await {
        let stats = client.stats().await?;
        return Ok((stats, Target::Server));
    }

    tracing::debug!(
        url = client.base_url(),
        data_dir = %data_dir.display(),
        "No server answered, reading the databases directly"
    );
    let sessions = services::open_sessions(data_dir)?.stats_async().await?;
    let coupons = services::open_coupons(data_dir)?.count_async().await?;
    Ok((
        StatsResponse {
            live_sessions: sessions.live(),
            sessions,
            coupons,
        },
        Target::Local,
    ))
}
