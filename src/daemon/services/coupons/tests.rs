//! Tests for the coupon store module.

use super::*;
use crate::daemon::error::Error;
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use tempfile::TempDir;

fn open_store(tmp: &TempDir) -> CouponStore {
    CouponStore::open(tmp.path().join("coupons.redb")).unwrap()
}

fn new_coupon(code: &str, discount: Discount, max_uses: Option<u32>) -> NewCoupon {
    NewCoupon {
        code: code.to_string(),
        discount,
        max_uses,
        expires_at: None,
    }
}

#[test]
fn test_create_and_get() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let created = store
        .create(new_coupon("welcome", Discount::Percent(10), Some(5)))
        .unwrap();
    assert_eq!(created.code, "WELCOME");
    assert_eq!(created.used, 0);
    assert!(created.active);

    // Lookup is case-insensitive
    let fetched = store.get("Welcome").unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn test_create_duplicate() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store
        .create(new_coupon("DUP", Discount::Fixed(100), None))
        .unwrap();
    let result = store.create(new_coupon("dup", Discount::Fixed(200), None));
    assert!(matches!(result, Err(Error::CouponExists { .. })));

    // Original untouched
    assert_eq!(store.get("DUP").unwrap().discount, Discount::Fixed(100));
}

#[test]
fn test_get_unknown() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    assert!(matches!(
        store.get("NOPE"),
        Err(Error::CouponNotFound { .. })
    ));
}

#[test]
fn test_validate_does_not_consume() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store
        .create(new_coupon("ONCE", Discount::Percent(50), Some(1)))
        .unwrap();

    for _ in 0..3 {
        let quote = store.validate("ONCE", 2000).unwrap();
        assert_eq!(quote.total, 1000);
    }
    assert_eq!(store.get("ONCE").unwrap().used, 0);
}

#[test]
fn test_redeem_until_exhausted() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store
        .create(new_coupon("TWICE", Discount::Fixed(250), Some(2)))
        .unwrap();

    let first = store.redeem("twice", 1000).unwrap();
    assert_eq!(first.discount, 250);
    assert_eq!(first.total, 750);
    store.redeem("TWICE", 1000).unwrap();

    let third = store.redeem("TWICE", 1000);
    assert!(matches!(
        third,
        Err(Error::CouponExhausted { max_uses: 2, .. })
    ));
    assert_eq!(store.get("TWICE").unwrap().used, 2);

    // Validation also reports exhaustion
    assert!(store.validate("TWICE", 1000).is_err());
}

#[test]
fn test_redeem_expired() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let now = Utc::now();
    let mut request = new_coupon("FLASH", Discount::Percent(20), None);
    request.expires_at = Some(now + Duration::hours(1));
    store.create_at(request, now).unwrap();

    assert!(store.redeem_at("FLASH", 100, now).is_ok());
    let late = store.redeem_at("FLASH", 100, now + Duration::hours(2));
    assert!(matches!(late, Err(Error::CouponExpired { .. })));
    assert_eq!(store.get("FLASH").unwrap().used, 1);
}

#[test]
fn test_set_active() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store
        .create(new_coupon("PAUSE", Discount::Percent(5), None))
        .unwrap();

    let paused = store.set_active("pause", false).unwrap();
    assert!(!paused.active);
    assert!(matches!(
        store.redeem("PAUSE", 100),
        Err(Error::CouponInactive { .. })
    ));

    store.set_active("PAUSE", true).unwrap();
    assert!(store.redeem("PAUSE", 100).is_ok());

    assert!(matches!(
        store.set_active("MISSING", true),
        Err(Error::CouponNotFound { .. })
    ));
}

#[test]
fn test_invalid_requests_not_persisted() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    assert!(matches!(
        store.create(new_coupon("", Discount::Percent(10), None)),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store.create(new_coupon("ZERO", Discount::Percent(0), None)),
        Err(Error::InvalidInput(_))
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_concurrent_redemptions_respect_limit() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store
        .create(new_coupon("RUSH", Discount::Percent(10), Some(5)))
        .unwrap();

    let successes = Arc::new(AtomicU32::new(0));
    let handles: Vec<_> = (0..20)
        .map(|_| {
            let store = store.clone();
            let successes = Arc::clone(&successes);
            thread::spawn(move || {
                if store.redeem("RUSH", 1000).is_ok() {
                    successes.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(successes.load(Ordering::SeqCst), 5);
    assert_eq!(store.get("RUSH").unwrap().used, 5);
}

#[tokio::test]
async fn test_async_wrappers() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store
        .create_async(new_coupon("ASYNC", Discount::Fixed(100), Some(1)))
        .await
        .unwrap();

    let quote = store.validate_async("async".into(), 500).await.unwrap();
    assert_eq!(quote.total, 400);

    store.redeem_async("ASYNC".into(), 500).await.unwrap();
    assert!(store.redeem_async("ASYNC".into(), 500).await.is_err());

    let coupon = store.set_active_async("ASYNC".into(), false).await.unwrap();
    assert!(!coupon.active);
    assert_eq!(store.get_async("ASYNC".into()).await.unwrap().used, 1);
    assert_eq!(store.count_async().await.unwrap(), 1);
}
