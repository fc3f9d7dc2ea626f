//! Coupon handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::super::types::{AmountRequest, CouponResponse, UpdateCouponRequest};
use super::super::{AppError, SharedState, metrics};
use crate::daemon::services::coupons::{NewCoupon, Quote};

/// POST /coupons - Create a coupon.
pub(crate) async fn coupon_create(
    State(state): State<SharedState>,
    payload: Result<Json<NewCoupon>, JsonRejection>,
) -> Result<(StatusCode, Json<CouponResponse>), AppError> {
    let Json(new) = payload?;
    let result = state.coupons.create_async(new).await;
    metrics::record_coupon_operation("create", result.is_ok());

    Ok((StatusCode::CREATED, Json(result?.into())))
}

/// GET /coupons/:code - Fetch a coupon.
pub(crate) async fn coupon_get(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<CouponResponse>, AppError> {
    let coupon = state.coupons.get_async(code).await?;
    Ok(Json(coupon.into()))
}

/// PATCH /coupons/:code - Enable or disable a coupon.
pub(crate) async fn coupon_update(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<UpdateCouponRequest>, JsonRejection>,
) -> Result<Json<CouponResponse>, AppError> {
    let Json(req) = payload?;
    let coupon = state.coupons.set_active_async(code, req.active).await?;
    metrics::record_coupon_operation("update", true);
    Ok(Json(coupon.into()))
}

/// POST /coupons/:code/validate - Price an amount without consuming a use.
pub(crate) async fn coupon_validate(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<Quote>, AppError> {
    let Json(req) = payload?;
    let result = state.coupons.validate_async(code, req.amount).await;
    metrics::record_coupon_operation("validate", result.is_ok());
    Ok(Json(result?))
}

/// POST /coupons/:code/redeem - Consume one use and price an amount.
pub(crate) async fn coupon_redeem(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<Quote>, AppError> {
    let Json(req) = payload?;
    let result = state.coupons.redeem_async(code, req.amount).await;
    metrics::record_coupon_operation("redeem", result.is_ok());
    Ok(Json(result?))
}
