//! Persistent stores backing the API.
//!
//! - **Sessions**: share-code keyed media sessions with a fixed retention window
//! - **Coupons**: discount codes with atomic usage accounting
//!
//! Both live as redb databases under the data directory (`~/.snapbooth` by
//! default, see `[storage] data_dir`).

pub mod coupons;
pub mod sessions;

use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::constants::{COUPONS_DB_FILE, SESSIONS_DB_FILE};

pub use coupons::CouponStore;
pub use sessions::SessionStore;

/// Default base directory for snapbooth data (`~/.snapbooth`).
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".snapbooth"))
}

/// Opens the session store under `data_dir`.
pub fn open_sessions(data_dir: &Path) -> anyhow::Result<SessionStore> {
    SessionStore::open(data_dir.join(SESSIONS_DB_FILE)).context("Failed to open session store")
}

/// Opens the coupon store under `data_dir`.
pub fn open_coupons(data_dir: &Path) -> anyhow::Result<CouponStore> {
    CouponStore::open(data_dir.join(COUPONS_DB_FILE)).context("Failed to open coupon store")
}
