//! `snapbooth sweep` and `snapbooth stats` against a live server.
//!
//! While `serve` runs it holds the redb lock on both databases, so the
//! maintenance commands must go through the HTTP API. With no server up they
//! open the files themselves.

#[path = "common.rs"]
mod common;

use chrono::{Duration, Utc};
use common::TestServer;
use snapbooth::daemon::client::{self, MaintenanceClient, Target};
use snapbooth::daemon::services::coupons::{Discount, NewCoupon};
use snapbooth::daemon::services::sessions::MediaRef;
use snapbooth::daemon::services::{self, SessionStore};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Address on which nothing listens.
async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn seed_expired(store: &SessionStore) -> String {
    let issued = Utc::now() - Duration::hours(73);
    store
        .create_at(vec![MediaRef::from_url("https://cdn/old.jpg")], issued)
        .unwrap()
        .code
}

#[tokio::test]
async fn test_sweep_while_server_holds_database() {
    let server = TestServer::start().await;
    let code = seed_expired(&server.sessions);
    server
        .sessions
        .create(vec![MediaRef::from_url("https://cdn/new.jpg")])
        .unwrap();

    // The files are locked by the running server
    assert!(services::open_sessions(server.data_dir()).is_err());

    let api = MaintenanceClient::new(server.url(""), None);
    let (report, target) = client::sweep(&api, server.data_dir()).await.unwrap();

    assert_eq!(target, Target::Server);
    assert_eq!(report.scanned, 2);
    assert_eq!(report.evicted, 1);
    assert!(server.sessions.get(&code).is_err());

    server.shutdown().await;
}

#[tokio::test]
async fn test_stats_while_server_holds_database() {
    let server = TestServer::start().await;
    server
        .sessions
        .create(vec![MediaRef::from_url("https://cdn/a.jpg")])
        .unwrap();
    server.sessions.reserve().unwrap();
    server
        .coupons
        .create(NewCoupon {
            code: "BOOTH".into(),
            discount: Discount::Percent(10),
            max_uses: None,
            expires_at: None,
        })
        .unwrap();

    let api = MaintenanceClient::new(server.url(""), None);
    let (stats, target) = client::stats(&api, server.data_dir()).await.unwrap();

    assert_eq!(target, Target::Server);
    assert_eq!(stats.sessions.completed, 1);
    assert_eq!(stats.sessions.processing, 1);
    assert_eq!(stats.live_sessions, 2);
    assert_eq!(stats.coupons, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_maintenance_sends_api_key() {
    let server = TestServer::start_with(None, Some("booth-secret")).await;
    seed_expired(&server.sessions);

    let without_key = MaintenanceClient::new(server.url(""), None);
    let err = client::sweep(&without_key, server.data_dir())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("API key"));

    let with_key = MaintenanceClient::new(server.url(""), Some("booth-secret".into()));
    let (report, target) = client::sweep(&with_key, server.data_dir()).await.unwrap();
    assert_eq!(target, Target::Server);
    assert_eq!(report.evicted, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_falls_back_to_files_without_server() {
    let tmp = TempDir::new().unwrap();
    {
        let store = services::open_sessions(tmp.path()).unwrap();
        seed_expired(&store);
        store
            .create(vec![MediaRef::from_url("https://cdn/keep.jpg")])
            .unwrap();
    }

    let api = MaintenanceClient::new(closed_url().await, None);
    assert!(!api.is_running().await);

    let (report, target) = client::sweep(&api, tmp.path()).await.unwrap();
    assert_eq!(target, Target::Local);
    assert_eq!(report.scanned, 2);
    assert_eq!(report.evicted, 1);

    let (stats, target) = client::stats(&api, tmp.path()).await.unwrap();
    assert_eq!(target, Target::Local);
    assert_eq!(stats.sessions.completed, 1);
    assert_eq!(stats.coupons, 0);
}
