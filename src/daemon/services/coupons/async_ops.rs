//! Async wrappers for `CouponStore` operations.

use super::store::CouponStore;
use super::types::{Coupon, NewCoupon, Quote};
use crate::daemon::error::Result;
use anyhow::Context;

impl CouponStore {
    /// Async version of `create`.
    pub async fn create_async(&self, new: NewCoupon) -> Result<Coupon> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.create(new))
            .await
            .context("Task join error")?
    }

    /// Async version of `get`.
    pub async fn get_async(&self, code: String) -> Result<Coupon> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.get(&code))
            .await
            .context("Task join error")?
    }

    /// Async version of `validate`.
    pub async fn validate_async(&self, code: String, amount: u64) -> Result<Quote> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.validate(&code, amount))
            .await
            .context("Task join error")?
    }

    /// Async version of `redeem`.
    pub async fn redeem_async(&self, code: String, amount: u64) -> Result<Quote> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.redeem(&code, amount))
            .await
            .context("Task join error")?
    }

    /// Async version of `set_active`.
    pub async fn set_active_async(&self, code: String, active: bool) -> Result<Coupon> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.set_active(&code, active))
            .await
            .context("Task join error")?
    }

    /// Async version of `count`.
    pub async fn count_async(&self) -> Result<u64> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.count())
            .await
            .context("Task join error")?
    }
}
