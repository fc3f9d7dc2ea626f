//! Concurrent coupon redemption over HTTP.
//!
//! A coupon limited to `k` uses must be redeemed exactly `k` times however
//! many requests race for it. All tests have strict timeouts so a stuck
//! writer shows up as a failure rather than a hang.

#[path = "common.rs"]
mod common;

use common::TestServer;
use serde_json::json;
use snapbooth::daemon::services::coupons::{Discount, NewCoupon};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(30);

async fn race_redemptions(server: &TestServer, code: &str, requests: usize) -> (usize, usize) {
    let client = reqwest::Client::new();
    let url = server.url(&format!("/coupons/{code}/redeem"));

    let tasks: Vec<_> = (0..requests)
        .map(|_| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                client
                    .post(&url)
                    .json(&json!({"amount": 2000}))
                    .send()
                    .await
                    .map(|resp| resp.status().as_u16())
            })
        })
        .collect();

    let mut ok = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.unwrap().unwrap() {
            200 => ok += 1,
            409 => rejected += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    (ok, rejected)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_limited_coupon_redeemed_exactly_k_times() {
    let server = TestServer::start().await;
    server
        .coupons
        .create(NewCoupon {
            code: "RACE".into(),
            discount: Discount::Percent(25),
            max_uses: Some(7),
            expires_at: None,
        })
        .unwrap();

    let (ok, rejected) = tokio::time::timeout(TIMEOUT, race_redemptions(&server, "RACE", 40))
        .await
        .expect("redemptions timed out");

    assert_eq!(ok, 7);
    assert_eq!(rejected, 33);
    assert_eq!(server.coupons.get("RACE").unwrap().used, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unlimited_coupon_counts_every_use() {
    let server = TestServer::start().await;
    server
        .coupons
        .create(NewCoupon {
            code: "OPEN".into(),
            discount: Discount::Fixed(500),
            max_uses: None,
            expires_at: None,
        })
        .unwrap();

    let (ok, rejected) = tokio::time::timeout(TIMEOUT, race_redemptions(&server, "open", 25))
        .await
        .expect("redemptions timed out");

    assert_eq!(ok, 25);
    assert_eq!(rejected, 0);
    assert_eq!(server.coupons.get("OPEN").unwrap().used, 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_session_creation_yields_unique_codes() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let client = client.clone();
            let url = server.url("/sessions");
            tokio::spawn(async move {
                let body: serde_json::Value = client
                    .post(&url)
                    .json(&json!({"media": [format!("https://cdn/{i}.jpg")]}))
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
                body["code"].as_str().unwrap().to_string()
            })
        })
        .collect();

    let mut codes = std::collections::HashSet::new();
    for task in tasks {
        let code = tokio::time::timeout(TIMEOUT, task)
            .await
            .expect("create timed out")
            .unwrap();
        assert!(codes.insert(code));
    }
    assert_eq!(codes.len(), 50);
}
