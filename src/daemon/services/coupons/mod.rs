//! Coupon store backed by redb.
//!
//! Percent or fixed discounts with optional expiry and usage limit. Stores
//! data at `<data_dir>/coupons.redb`.
//!
//! Validation prices an amount without consuming a use; redemption checks
//! and increments the usage counter atomically.

mod async_ops;
mod store;
mod types;

#[cfg(test)]
mod tests;

pub use store::CouponStore;
pub use types::{Coupon, Discount, NewCoupon, Quote, normalize_code};
