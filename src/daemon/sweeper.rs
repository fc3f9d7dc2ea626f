//! Background eviction of expired sessions.
//!
//! Reads already refuse expired sessions on their own; the sweeper reclaims
//! their storage so the database does not grow with dead records.

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use crate::daemon::metrics;
use crate::daemon::services::sessions::SessionStore;

/// Sweeps `store` every `interval` until `shutdown_rx` fires.
///
/// The first sweep runs immediately. A failed sweep is logged and retried
/// on the next tick.
pub async fn run(
    store: SessionStore,
    interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Sweeper started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep_once(&store).await;
            }
            _ = &mut shutdown_rx => {
                tracing::info!("Sweeper shutting down");
                break;
            }
        }
    }
}

async fn sweep_once(store: &SessionStore) {
    match store.sweep_async().await {
        Ok(report) => {
            let live = report.scanned.saturating_sub(report.evicted);
            metrics::record_sweep(report.evicted as u64, live as u64);
            if report.evicted > 0 {
                tracing::info!(
                    scanned = report.scanned,
                    evicted = report.evicted,
                    "Swept expired sessions"
                );
            } else {
                tracing::debug!(scanned = report.scanned, "Sweep found nothing to evict");
            }
        },
        Err(e) => tracing::error!(error = %e, "Sweep failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::services::sessions::MediaRef;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sweeper_evicts_and_stops() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path().join("sessions.redb")).unwrap();

        let old = Utc::now() - chrono::Duration::hours(100);
        let stale = store
            .create_at(vec![MediaRef::from_url("https://cdn/old.jpg")], old)
            .unwrap();
        let fresh = store
            .create(vec![MediaRef::from_url("https://cdn/new.jpg")])
            .unwrap();

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(run(store.clone(), Duration::from_millis(20), rx));

        // First tick fires immediately
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(matches!(
            store.get(&stale.code),
            Err(crate::daemon::error::Error::SessionNotFound { .. })
        ));
        assert!(store.get(&fresh.code).is_ok());
    }

    #[tokio::test]
    async fn test_sweeper_stops_without_ticking_again() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path().join("sessions.redb")).unwrap();

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(run(store, Duration::from_secs(3600), rx));
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
