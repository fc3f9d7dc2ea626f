//! Core `CouponStore` implementation with synchronous operations.

use super::types::{Coupon, NewCoupon, Quote, normalize_code};
use crate::daemon::error::{Error, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Table holding JSON-encoded coupons keyed by normalized code
pub(super) const COUPONS_TABLE: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("coupons");

/// Coupon store backed by redb.
///
/// Redemption checks the coupon and bumps its usage counter inside one
/// write transaction. redb admits a single writer at a time, so a coupon
/// limited to `k` uses is redeemed at most `k` times no matter how many
/// requests race for it.
#[derive(Clone)]
pub struct CouponStore {
    pub(super) db: Arc<Database>,
}

impl CouponStore {
    /// Opens or creates the coupon database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create coupon directory: {}", parent.display())
            })?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open coupon database: {}", path.display()))?;

        let write_txn = db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            let _table = write_txn
                .open_table(COUPONS_TABLE)
                .context("Failed to initialize coupons table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Creates a coupon.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed request and
    /// [`Error::CouponExists`] if the code is taken.
    pub fn create(&self, new: NewCoupon) -> Result<Coupon> {
        self.create_at(new, Utc::now())
    }

    /// [`CouponStore::create`] with an explicit creation time.
    pub fn create_at(&self, new: NewCoupon, now: DateTime<Utc>) -> Result<Coupon> {
        let code = new.validate()?;

        let coupon = Coupon {
            code,
            discount: new.discount,
            max_uses: new.max_uses,
            used: 0,
            active: true,
            expires_at: new.expires_at,
            created_at: now,
        };

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(COUPONS_TABLE)
                .context("Failed to open coupons table")?;

            if read_record(&table, &coupon.code)?.is_some() {
                return Err(Error::CouponExists { code: coupon.code });
            }
            write_record(&mut table, &coupon)?;
        }
        write_txn
            .commit()
            .context("Failed to commit create transaction")?;

        tracing::info!(code = %coupon.code, max_uses = ?coupon.max_uses, "Created coupon");
        Ok(coupon)
    }

    /// Fetches a coupon by code (case-insensitive).
    pub fn get(&self, code: &str) -> Result<Coupon> {
        let code = normalize_code(code);

        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(COUPONS_TABLE)
            .context("Failed to open coupons table")?;

        read_record(&table, &code)?.ok_or_else(|| Error::coupon_not_found(code))
    }

    /// Prices `amount` with a coupon without consuming a use.
    ///
    /// # Errors
    ///
    /// [`Error::CouponNotFound`], [`Error::CouponInactive`],
    /// [`Error::CouponExpired`] or [`Error::CouponExhausted`].
    pub fn validate(&self, code: &str, amount: u64) -> Result<Quote> {
        self.validate_at(code, amount, Utc::now())
    }

    /// [`CouponStore::validate`] evaluated at `now`.
    pub fn validate_at(&self, code: &str, amount: u64, now: DateTime<Utc>) -> Result<Quote> {
        let coupon = self.get(code)?;
        coupon.check_redeemable(now)?;
        Ok(coupon.quote(amount))
    }

    /// Consumes one use of a coupon and prices `amount` with it.
    ///
    /// The check and the increment are one conditional update.
    pub fn redeem(&self, code: &str, amount: u64) -> Result<Quote> {
        self.redeem_at(code, amount, Utc::now())
    }

    /// [`CouponStore::redeem`] evaluated at `now`.
    pub fn redeem_at(&self, code: &str, amount: u64, now: DateTime<Utc>) -> Result<Quote> {
        let code = normalize_code(code);

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let coupon = {
            let mut table = write_txn
                .open_table(COUPONS_TABLE)
                .context("Failed to open coupons table")?;

            let Some(mut coupon) = read_record(&table, &code)? else {
                return Err(Error::coupon_not_found(code));
            };
            coupon.record_use(now)?;
            write_record(&mut table, &coupon)?;
            coupon
        };

        write_txn
            .commit()
            .context("Failed to commit redeem transaction")?;

        tracing::info!(
            code = %coupon.code,
            used = coupon.used,
            remaining = ?coupon.remaining(),
            "Redeemed coupon"
        );
        Ok(coupon.quote(amount))
    }

    /// Enables or disables a coupon.
    pub fn set_active(&self, code: &str, active: bool) -> Result<Coupon> {
        let code = normalize_code(code);

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let coupon = {
            let mut table = write_txn
                .open_table(COUPONS_TABLE)
                .context("Failed to open coupons table")?;

            let Some(mut coupon) = read_record(&table, &code)? else {
                return Err(Error::coupon_not_found(code));
            };
            coupon.active = active;
            write_record(&mut table, &coupon)?;
            coupon
        };

        write_txn
            .commit()
            .context("Failed to commit update transaction")?;

        tracing::info!(code = %coupon.code, active, "Updated coupon");
        Ok(coupon)
    }

    /// Number of stored coupons.
    pub fn count(&self) -> Result<u64> {
        use redb::ReadableTableMetadata;

        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(COUPONS_TABLE)
            .context("Failed to open coupons table")?;

        Ok(table.len().context("Failed to count coupons")?)
    }
}

fn read_record<T>(table: &T, code: &str) -> anyhow::Result<Option<Coupon>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let Some(guard) = table
        .get(code)
        .with_context(|| format!("Failed to read coupon '{code}'"))?
    else {
        return Ok(None);
    };

    let coupon = serde_json::from_slice(guard.value())
        .with_context(|| format!("Failed to deserialize coupon '{code}'"))?;
    Ok(Some(coupon))
}

fn write_record(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    coupon: &Coupon,
) -> anyhow::Result<()> {
    let json = serde_json::to_vec(coupon).context("Failed to serialize coupon to JSON")?;
    table
        .insert(coupon.code.as_str(), json.as_slice())
        .with_context(|| format!("Failed to write coupon '{}'", coupon.code))?;
    Ok(())
}
