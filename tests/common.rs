//! Common test utilities for integration tests.
//!
//! `TestServer` serves the real router on an ephemeral port backed by a
//! temporary data directory. It shuts down when dropped.
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_health() {
//!     let server = TestServer::start().await;
//!     let resp = reqwest::get(server.url("/health")).await.unwrap();
//!     assert_eq!(resp.status(), 200);
//! }
//! ```

#![allow(dead_code)]

use snapbooth::daemon::http::{AppState, router};
use snapbooth::daemon::services::{CouponStore, SessionStore};
use std::net::SocketAddr;
use std::path::Path;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub struct TestServer {
    pub addr: SocketAddr,
    /// Direct handle on the store the server uses
    pub sessions: SessionStore,
    pub coupons: CouponStore,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    tmp: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(None, None).await
    }

    pub async fn start_with(public_url: Option<&str>, api_key: Option<&str>) -> Self {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let sessions = SessionStore::open(tmp.path().join("sessions.redb"))
            .expect("Failed to open session store");
        let coupons = CouponStore::open(tmp.path().join("coupons.redb"))
            .expect("Failed to open coupon store");

        let state = AppState::new(sessions.clone(), coupons.clone())
            .with_public_url(public_url.map(String::from))
            .with_api_key(api_key.map(String::from));
        let app = router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Test server failed");
        });

        Self {
            addr,
            sessions,
            coupons,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            tmp,
        }
    }

    /// Data directory holding the server's databases.
    pub fn data_dir(&self) -> &Path {
        self.tmp.path()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Stops the server and waits for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
