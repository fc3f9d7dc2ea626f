//! Type definitions for coupons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_COUPON_CODE_LEN;
use crate::daemon::error::{Error, Result};

/// How a coupon reduces a price. Amounts are in the smallest currency unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Discount {
    /// Percentage off, 1..=100. Rounds down.
    Percent(u8),
    /// Fixed amount off, capped at the price.
    Fixed(u64),
}

impl Discount {
    /// Amount taken off `amount`. Never exceeds `amount`.
    pub fn amount_off(self, amount: u64) -> u64 {
        match self {
            Self::Percent(pct) => {
                let off = u128::from(amount) * u128::from(pct) / 100;
                u64::try_from(off).unwrap_or(amount).min(amount)
            },
            Self::Fixed(value) => value.min(amount),
        }
    }

    fn validate(self) -> Result<()> {
        match self {
            Self::Percent(pct) if pct == 0 || pct > 100 => Err(Error::invalid(format!(
                "percent discount must be between 1 and 100, got {pct}"
            ))),
            Self::Fixed(0) => Err(Error::invalid("fixed discount must be greater than zero")),
            _ => Ok(()),
        }
    }
}

/// A stored coupon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coupon {
    /// Upper-case code typed by the customer
    pub code: String,
    pub discount: Discount,
    /// None = unlimited
    pub max_uses: Option<u32>,
    pub used: u32,
    pub active: bool,
    /// None = never expires
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Checks whether one more redemption is allowed at `now`.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.active {
            return Err(Error::CouponInactive {
                code: self.code.clone(),
            });
        }
        if let Some(expires_at) = self.expires_at
            && now >= expires_at
        {
            return Err(Error::CouponExpired {
                code: self.code.clone(),
            });
        }
        // Unlimited coupons still stop at the counter's ceiling
        let max_uses = self.max_uses.unwrap_or(u32::MAX);
        if self.used >= max_uses {
            return Err(self.exhausted(max_uses));
        }
        Ok(())
    }

    /// Checks redeemability at `now` and counts one use.
    pub fn record_use(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.check_redeemable(now)?;
        let Some(used) = self.used.checked_add(1) else {
            return Err(self.exhausted(self.max_uses.unwrap_or(u32::MAX)));
        };
        self.used = used;
        Ok(())
    }

    fn exhausted(&self, max_uses: u32) -> Error {
        Error::CouponExhausted {
            code: self.code.clone(),
            max_uses,
        }
    }

    /// Redemptions left, or None when unlimited.
    pub fn remaining(&self) -> Option<u32> {
        self.max_uses.map(|max| max.saturating_sub(self.used))
    }

    /// Prices `amount` with this coupon.
    pub fn quote(&self, amount: u64) -> Quote {
        let discount = self.discount.amount_off(amount);
        Quote {
            code: self.code.clone(),
            original: amount,
            discount,
            total: amount - discount,
        }
    }
}

/// Request to create a coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub discount: Discount,
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewCoupon {
    /// Validates the request and returns the normalized code.
    pub(super) fn validate(&self) -> Result<String> {
        let code = normalize_code(&self.code);
        if code.is_empty() {
            return Err(Error::invalid("coupon code must not be blank"));
        }
        if code.len() > MAX_COUPON_CODE_LEN {
            return Err(Error::invalid(format!(
                "coupon code exceeds {MAX_COUPON_CODE_LEN} characters"
            )));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::invalid(
                "coupon code can only contain letters, digits, hyphens and underscores",
            ));
        }
        if self.max_uses == Some(0) {
            return Err(Error::invalid("max_uses must be at least 1"));
        }
        self.discount.validate()?;
        Ok(code)
    }
}

/// Price breakdown for one coupon application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub code: String,
    pub original: u64,
    pub discount: u64,
    pub total: u64,
}

/// Normalizes a customer-typed code for lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(discount: Discount) -> Coupon {
        Coupon {
            code: "SUMMER".into(),
            discount,
            max_uses: Some(2),
            used: 0,
            active: true,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_use_counts_until_limit() {
        let mut limited = coupon(Discount::Fixed(100));
        let now = Utc::now();

        limited.record_use(now).unwrap();
        limited.record_use(now).unwrap();
        assert_eq!(limited.used, 2);
        assert!(matches!(
            limited.record_use(now),
            Err(Error::CouponExhausted { max_uses: 2, .. })
        ));
        assert_eq!(limited.used, 2);
    }

    #[test]
    fn test_unlimited_coupon_stops_at_counter_ceiling() {
        let mut unlimited = Coupon {
            max_uses: None,
            used: u32::MAX - 1,
            ..coupon(Discount::Percent(10))
        };
        let now = Utc::now();

        unlimited.record_use(now).unwrap();
        assert_eq!(unlimited.used, u32::MAX);
        assert_eq!(unlimited.remaining(), None);

        assert!(matches!(
            unlimited.check_redeemable(now),
            Err(Error::CouponExhausted { .. })
        ));
        assert!(matches!(
            unlimited.record_use(now),
            Err(Error::CouponExhausted { .. })
        ));
        assert_eq!(unlimited.used, u32::MAX);
    }

    #[test]
    fn test_percent_discount_rounds_down() {
        assert_eq!(Discount::Percent(15).amount_off(999), 149);
        assert_eq!(Discount::Percent(100).amount_off(500), 500);
        assert_eq!(Discount::Percent(50).amount_off(u64::MAX), u64::MAX / 2);
    }

    #[test]
    fn test_fixed_discount_capped_at_price() {
        assert_eq!(Discount::Fixed(300).amount_off(1000), 300);
        assert_eq!(Discount::Fixed(3000).amount_off(1000), 1000);
    }

    #[test]
    fn test_quote_never_negative() {
        let quote = coupon(Discount::Fixed(5000)).quote(1200);
        assert_eq!(quote.discount, 1200);
        assert_eq!(quote.total, 0);
    }

    #[test]
    fn test_check_redeemable_order() {
        let now = Utc::now();

        let mut c = coupon(Discount::Percent(10));
        assert!(c.check_redeemable(now).is_ok());

        c.used = 2;
        assert!(matches!(
            c.check_redeemable(now),
            Err(Error::CouponExhausted { max_uses: 2, .. })
        ));

        c.expires_at = Some(now - Duration::minutes(1));
        assert!(matches!(
            c.check_redeemable(now),
            Err(Error::CouponExpired { .. })
        ));

        c.active = false;
        assert!(matches!(
            c.check_redeemable(now),
            Err(Error::CouponInactive { .. })
        ));
    }

    #[test]
    fn test_remaining() {
        let mut c = coupon(Discount::Percent(10));
        c.used = 1;
        assert_eq!(c.remaining(), Some(1));
        c.max_uses = None;
        assert_eq!(c.remaining(), None);
    }

    #[test]
    fn test_new_coupon_validation() {
        let base = NewCoupon {
            code: " summer-25 ".into(),
            discount: Discount::Percent(25),
            max_uses: None,
            expires_at: None,
        };
        assert_eq!(base.validate().unwrap(), "SUMMER-25");

        let blank = NewCoupon {
            code: "   ".into(),
            ..base.clone()
        };
        assert!(blank.validate().is_err());

        let bad_chars = NewCoupon {
            code: "a b".into(),
            ..base.clone()
        };
        assert!(bad_chars.validate().is_err());

        let zero_uses = NewCoupon {
            max_uses: Some(0),
            ..base.clone()
        };
        assert!(zero_uses.validate().is_err());

        let too_much = NewCoupon {
            discount: Discount::Percent(101),
            ..base
        };
        assert!(too_much.validate().is_err());
    }

    #[test]
    fn test_discount_json_shape() {
        let json = serde_json::to_string(&Discount::Percent(20)).unwrap();
        assert_eq!(json, r#"{"type":"percent","value":20}"#);
        let fixed: Discount = serde_json::from_str(r#"{"type":"fixed","value":500}"#).unwrap();
        assert_eq!(fixed, Discount::Fixed(500));
    }
}
