//! Centralized constants for session lifetimes, limits and defaults.
//!
//! The retention window and the code format are the same for every
//! deployment and are not configurable.

// =============================================================================
// Media Sessions
// =============================================================================

/// How long a media session stays readable after creation (72 hours).
pub const SESSION_RETENTION_SECS: i64 = 72 * 60 * 60;

/// Length of a session code.
pub const SESSION_CODE_LEN: usize = 10;

/// Alphabet for session codes.
///
/// URL-safe and free of look-alike glyphs (`0 O 1 l I`) so codes survive
/// being read aloud or typed from a printed slip.
pub const SESSION_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";

/// Candidate codes tried inside one write transaction before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 8;

/// Maximum number of media references attached to one session.
pub const MAX_MEDIA_PER_SESSION: usize = 64;

/// Maximum length of a single media URL.
pub const MAX_MEDIA_URL_LEN: usize = 2048;

// =============================================================================
// Storage
// =============================================================================

/// Session database file under the data directory.
pub const SESSIONS_DB_FILE: &str = "sessions.redb";

/// Coupon database file under the data directory.
pub const COUPONS_DB_FILE: &str = "coupons.redb";

// =============================================================================
// Coupons
// =============================================================================

/// Maximum coupon code length.
pub const MAX_COUPON_CODE_LEN: usize = 32;

// =============================================================================
// HTTP
// =============================================================================

/// Maximum request body size (1 MiB). Payloads only carry URLs.
pub const MAX_BODY_SIZE_BYTES: usize = 1024 * 1024;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Environment variable holding the admin API key.
pub const API_KEY_ENV: &str = "SNAPBOOTH_API_KEY";

// =============================================================================
// Maintenance
// =============================================================================

/// Default interval between eager expiry sweeps (10 minutes).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;

/// How long the CLI waits for a running server's health check.
pub const SERVER_PROBE_TIMEOUT_MS: u64 = 500;
