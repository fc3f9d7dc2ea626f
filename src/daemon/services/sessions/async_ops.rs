//! Async wrappers for `SessionStore` operations.
//!
//! These methods wrap the synchronous operations in `spawn_blocking` to
//! avoid blocking the async runtime. Use these when calling from async
//! contexts (HTTP handlers, the sweeper task).

use super::store::SessionStore;
use super::types::{MediaRef, MediaSession, SessionStats, SweepReport};
use crate::daemon::error::Result;
use anyhow::Context;

impl SessionStore {
    /// Async version of `create`.
    pub async fn create_async(&self, media: Vec<MediaRef>) -> Result<MediaSession> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.create(media))
            .await
            .context("Task join error")?
    }

    /// Async version of `reserve`.
    pub async fn reserve_async(&self) -> Result<MediaSession> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.reserve())
            .await
            .context("Task join error")?
    }

    /// Async version of `get`.
    pub async fn get_async(&self, code: String) -> Result<MediaSession> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.get(&code))
            .await
            .context("Task join error")?
    }

    /// Async version of `attach`.
    pub async fn attach_async(&self, code: String, media: Vec<MediaRef>) -> Result<MediaSession> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.attach(&code, media))
            .await
            .context("Task join error")?
    }

    /// Async version of `sweep`.
    pub async fn sweep_async(&self) -> Result<SweepReport> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.sweep())
            .await
            .context("Task join error")?
    }

    /// Async version of `stats`.
    pub async fn stats_async(&self) -> Result<SessionStats> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.stats())
            .await
            .context("Task join error")?
    }
}
