// =============================================================================
// Lint Configuration
// =============================================================================

#![deny(unsafe_code)]
// Correctness: Must handle all fallible operations
#![deny(unused_must_use)]
// Quality: Pedantic but pragmatic
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![allow(missing_debug_implementations)] // Stores wrap redb::Database handles

// Allowed with documented reasons
#![allow(clippy::missing_errors_doc)] // Error returns self-documenting via type
#![allow(clippy::module_name_repetitions)] // e.g., sessions::SessionStore is clearer
#![allow(clippy::doc_markdown)] // Too many false positives in code docs
#![allow(clippy::must_use_candidate)] // Not all returned values need annotation
#![allow(clippy::cast_possible_truncation)] // Counts converted for metrics

//! Library crate for snapbooth - exposes the stores and HTTP API for the
//! binary and for integration testing.
//!
//! A photo booth uploads its media and receives a short share code. Anyone
//! holding the code can view the media for 72 hours; after that the code
//! answers "expired" until a sweep removes the record, and "not found"
//! afterwards.
//!
//! # Example
//!
//! ```no_run
//! use snapbooth::daemon::services::SessionStore;
//! use snapbooth::daemon::services::sessions::MediaRef;
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = SessionStore::open("/tmp/snapbooth/sessions.redb")?;
//! let session = store.create(vec![MediaRef::from_url("https://cdn.example.com/shot.jpg")])?;
//! let same = store.get(&session.code)?;
//! assert_eq!(same.media, session.media);
//! # Ok(())
//! # }
//! ```

/// Centralized constants for limits and defaults.
///
/// Includes the retention window, share code shape, media limits and
/// request body size.
pub mod constants;

/// Stores, HTTP API, sweeper, configuration, logging and metrics.
pub mod daemon;
