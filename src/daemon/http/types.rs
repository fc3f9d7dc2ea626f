//! Request and response types for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::daemon::services::coupons::Coupon;
use crate::daemon::services::sessions::{
    MediaRef, MediaSession, MediaSlots, SessionStats, SessionStatus, SweepReport,
};

// =============================================================================
// Session Types
// =============================================================================

/// One media entry: a bare URL or an explicit `{kind, url}` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MediaInput {
    Url(String),
    Ref(MediaRef),
}

impl From<MediaInput> for MediaRef {
    fn from(input: MediaInput) -> Self {
        match input {
            MediaInput::Url(url) => Self::from_url(url),
            MediaInput::Ref(media) => media,
        }
    }
}

/// Body for `POST /sessions` and `PATCH /sessions/{code}`.
///
/// Accepts a `media` list, the `image`/`video`/`gif` slots, or both. List
/// entries come first, followed by slots in image, video, gif order.
///
/// ```json
/// {"media": ["https://cdn.example.com/a.jpg", {"kind": "video", "url": "https://cdn.example.com/b"}]}
/// {"image": "https://cdn.example.com/a.jpg", "gif": "https://cdn.example.com/a.gif"}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaPayload {
    #[serde(default)]
    pub media: Vec<MediaInput>,
    #[serde(flatten)]
    pub slots: MediaSlots,
}

impl MediaPayload {
    /// Flattens the payload into the canonical ordered media list.
    pub fn into_media(self) -> Vec<MediaRef> {
        let mut media: Vec<MediaRef> = self.media.into_iter().map(MediaRef::from).collect();
        media.extend(self.slots.into_refs());
        media
    }
}

/// Session as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub code: String,
    pub status: SessionStatus,
    pub media: Vec<MediaRef>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Present when `server.public_url` is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
}

impl SessionResponse {
    pub fn new(session: MediaSession, public_url: Option<&str>) -> Self {
        let share_url = public_url.map(|base| share_url(base, &session.code));
        Self {
            code: session.code,
            status: session.status,
            media: session.media,
            created_at: session.created_at,
            expires_at: session.expires_at,
            share_url,
        }
    }
}

/// Link a customer opens to view their session.
pub fn share_url(public_url: &str, code: &str) -> String {
    format!("{}/s/{code}", public_url.trim_end_matches('/'))
}

// =============================================================================
// Maintenance Types
// =============================================================================

/// Result of an on-demand sweep.
#[derive(Debug, Serialize, Deserialize)]
pub struct SweepResponse {
    pub scanned: usize,
    pub evicted: usize,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            scanned: report.scanned,
            evicted: report.evicted,
        }
    }
}

/// Store counters.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub sessions: SessionStats,
    pub live_sessions: usize,
    pub coupons: u64,
}

// =============================================================================
// Coupon Types
// =============================================================================

/// Body for `PATCH /coupons/{code}`.
#[derive(Debug, Deserialize)]
pub struct UpdateCouponRequest {
    pub active: bool,
}

/// Body for validate and redeem, in the smallest currency unit.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: u64,
}

/// Coupon as returned by the API.
#[derive(Debug, Serialize)]
pub struct CouponResponse {
    #[serde(flatten)]
    pub coupon: Coupon,
    /// Omitted for unlimited coupons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

impl From<Coupon> for CouponResponse {
    fn from(coupon: Coupon) -> Self {
        let remaining = coupon.remaining();
        Self { coupon, remaining }
    }
}

// =============================================================================
// System Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Version response.
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
