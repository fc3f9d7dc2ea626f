//! HTTP API handlers organized by resource.

pub mod coupons;
pub mod maintenance;
pub mod sessions;
pub mod system;

// Re-export all handlers for use in routing
pub(crate) use coupons::{coupon_create, coupon_get, coupon_redeem, coupon_update, coupon_validate};
pub(crate) use maintenance::{maintenance_stats, maintenance_sweep};
pub(crate) use sessions::{session_attach, session_create, session_get, session_reserve};
pub(crate) use system::{health, version};
