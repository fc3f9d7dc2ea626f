//! Domain error types for the snapbooth service.
//!
//! Every user-visible failure of the session and coupon stores is a variant
//! here, with an HTTP status code mapping for API responses. Storage and
//! serialization plumbing stays in `anyhow` and enters as [`Error::Internal`].

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Service errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Session code was never issued or has been evicted.
    #[error("session not found: {code}")]
    SessionNotFound { code: String },

    /// Session existed but its retention window has elapsed.
    #[error("session expired: {code}")]
    SessionExpired { code: String },

    /// Media can only be attached while a session is processing.
    #[error("session '{code}' is {status}, expected PROCESSING")]
    SessionNotPending { code: String, status: String },

    /// Coupon code does not exist.
    #[error("coupon not found: {code}")]
    CouponNotFound { code: String },

    /// Coupon is past its expiry date.
    #[error("coupon expired: {code}")]
    CouponExpired { code: String },

    /// Coupon was disabled by an operator.
    #[error("coupon inactive: {code}")]
    CouponInactive { code: String },

    /// Coupon reached its usage limit.
    #[error("coupon '{code}' reached its usage limit of {max_uses}")]
    CouponExhausted { code: String, max_uses: u32 },

    /// Coupon code is already taken.
    #[error("coupon already exists: {code}")]
    CouponExists { code: String },

    /// Invalid request payload.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage or other internal failure.
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Create a session not found error.
    pub fn session_not_found(code: impl Into<String>) -> Self {
        Self::SessionNotFound { code: code.into() }
    }

    /// Create a session expired error.
    pub fn session_expired(code: impl Into<String>) -> Self {
        Self::SessionExpired { code: code.into() }
    }

    /// Create a coupon not found error.
    pub fn coupon_not_found(code: impl Into<String>) -> Self {
        Self::CouponNotFound { code: code.into() }
    }

    /// Create an invalid input error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Get the appropriate HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::SessionNotFound { .. } | Self::CouponNotFound { .. } => 404,
            Self::SessionExpired { .. } | Self::CouponExpired { .. } => 410,
            Self::SessionNotPending { .. }
            | Self::CouponInactive { .. }
            | Self::CouponExhausted { .. }
            | Self::CouponExists { .. } => 409,
            Self::InvalidInput(_) => 400,
            Self::Config(_) => 422,
            Self::Internal(_) => 500,
        }
    }

    /// Get a client-safe error message (doesn't leak internal details).
    pub fn client_message(&self) -> String {
        match self {
            Self::SessionNotFound { .. } => "Session not found".to_string(),
            Self::SessionExpired { .. } => "This link has expired".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Config(_) => "Configuration error".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error is a server-side failure rather than a client condition.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}
