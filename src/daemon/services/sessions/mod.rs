//! Media session store backed by redb.
//!
//! Maps a short public code to the media a kiosk produced, for a fixed
//! 72-hour retention window, so a customer can fetch everything from one
//! QR code. Stores data at `<data_dir>/sessions.redb`.
//!
//! Features:
//! - Create a completed session from a media list
//! - Reserve a `PROCESSING` session and attach media later
//! - Lazy expiry: reads past the window report `Expired` and flag the record
//! - Eager expiry: `sweep` deletes expired records, later reads report `NotFound`
//! - Collision-free code allocation inside a single write transaction
//!
//! # Async Usage
//!
//! All database operations are blocking. When using from async contexts,
//! use the async methods (`get_async`, `create_async`, etc.) which wrap
//! operations in `spawn_blocking`.

mod async_ops;
pub mod code;
mod store;
mod types;


pub use store::SessionStore;
pub use types::{
    MediaKind, MediaRef, MediaSession, MediaSlots, SessionStats, SessionStatus, SweepReport,
    retention,
};
