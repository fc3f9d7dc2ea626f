//! Maintenance handlers: on-demand eviction and counters.

use axum::{Json, extract::State};

use super::super::types::{StatsResponse, SweepResponse};
use super::super::{AppError, SharedState, metrics};

/// POST /maintenance/sweep - Delete every expired session now.
pub(crate) async fn maintenance_sweep(
    State(state): State<SharedState>,
) -> Result<Json<SweepResponse>, AppError> {
    let report = state.sessions.sweep_async().await?;
    metrics::record_sweep(
        report.evicted as u64,
        report.scanned.saturating_sub(report.evicted) as u64,
    );
    Ok(Json(report.into()))
}

/// GET /maintenance/stats - Session counts by status and coupon count.
pub(crate) async fn maintenance_stats(
    State(state): State<SharedState>,
) -> Result<Json<StatsResponse>, AppError> {
    let sessions = state.sessions.stats_async().await?;
    let coupons = state.coupons.count_async().await?;
    metrics::set_live_sessions(sessions.live() as u64);

    Ok(Json(StatsResponse {
        live_sessions: sessions.live(),
        sessions,
        coupons,
    }))
}
