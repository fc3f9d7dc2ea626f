//! Type definitions for media sessions.
//!
//! Contains the stored session record, its status state machine and the
//! canonical tagged media reference list.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MAX_MEDIA_PER_SESSION, MAX_MEDIA_URL_LEN, SESSION_RETENTION_SECS};
use crate::daemon::error::{Error, Result};

/// Kind of a captured media asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Gif,
    Other,
}

impl MediaKind {
    /// Infers the kind from the URL's file extension.
    ///
    /// Query strings and fragments are ignored. Unknown extensions map to
    /// [`MediaKind::Other`].
    pub fn infer(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let file = path.rsplit('/').next().unwrap_or(path);
        let Some((_, ext)) = file.rsplit_once('.') else {
            return Self::Other;
        };

        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "heic" | "avif" | "bmp" => Self::Image,
            "mp4" | "webm" | "mov" | "m4v" => Self::Video,
            "gif" => Self::Gif,
            _ => Self::Other,
        }
    }
}

/// A single media asset attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
}

impl MediaRef {
    /// Creates a reference with an explicit kind.
    pub fn new(kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }

    /// Creates a reference whose kind is inferred from the URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            kind: MediaKind::infer(&url),
            url,
        }
    }
}

/// Named per-type media slots, as sent by the capture flow on attach.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaSlots {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub gif: Option<String>,
}

impl MediaSlots {
    /// Returns true if no slot is filled.
    pub const fn is_empty(&self) -> bool {
        self.image.is_none() && self.video.is_none() && self.gif.is_none()
    }

    /// Flattens the slots into refs, ordered image, video, gif.
    pub fn into_refs(self) -> Vec<MediaRef> {
        [
            (MediaKind::Image, self.image),
            (MediaKind::Video, self.video),
            (MediaKind::Gif, self.gif),
        ]
        .into_iter()
        .filter_map(|(kind, url)| url.map(|url| MediaRef::new(kind, url)))
        .collect()
    }
}

/// Validates a media list before it is stored.
pub(super) fn validate_media(media: &[MediaRef]) -> Result<()> {
    if media.is_empty() {
        return Err(Error::invalid("media list must not be empty"));
    }
    if media.len() > MAX_MEDIA_PER_SESSION {
        return Err(Error::invalid(format!(
            "at most {MAX_MEDIA_PER_SESSION} media references per session"
        )));
    }
    for item in media {
        if item.url.trim().is_empty() {
            return Err(Error::invalid("media URL must not be blank"));
        }
        if item.url.len() > MAX_MEDIA_URL_LEN {
            return Err(Error::invalid(format!(
                "media URL exceeds {MAX_MEDIA_URL_LEN} bytes"
            )));
        }
    }
    Ok(())
}

/// Lifecycle status of a media session.
///
/// `Processing -> Completed` on attach; any state `-> Expired` once the
/// retention window has elapsed. `Expired` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Processing,
    Completed,
    Expired,
}

impl SessionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored media session.
///
/// Serialized to JSON in redb for human-readable debugging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaSession {
    /// Public lookup key embedded in the QR code
    pub code: String,
    /// Attached media, in capture order
    pub media: Vec<MediaRef>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    /// Always `created_at` plus the retention window
    pub expires_at: DateTime<Utc>,
}

impl MediaSession {
    /// Builds a new record created at `now`.
    pub(super) fn new(
        code: String,
        media: Vec<MediaRef>,
        status: SessionStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            code,
            media,
            status,
            created_at: now,
            expires_at: now + retention(),
        }
    }

    /// Whether the retention window has elapsed at `now`.
    ///
    /// A session created at `t0` is readable for every `t < t0 + 72h`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Expired || now >= self.expires_at
    }

    /// URLs of all attached media, in order.
    pub fn urls(&self) -> Vec<&str> {
        self.media.iter().map(|m| m.url.as_str()).collect()
    }
}

/// The fixed retention window.
pub fn retention() -> Duration {
    Duration::seconds(SESSION_RETENTION_SECS)
}

/// Outcome of an eager expiry sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepReport {
    /// Records examined
    pub scanned: usize,
    /// Records deleted because their window had elapsed
    pub evicted: usize,
}

/// Session counts by effective status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStats {
    pub processing: usize,
    pub completed: usize,
    /// Expired records not yet removed by a sweep
    pub expired: usize,
}

impl SessionStats {
    /// Sessions that can still be read.
    pub const fn live(&self) -> usize {
        self.processing + self.completed
    }
}
