//! Core `SessionStore` implementation with synchronous operations.
//!
//! Every public operation has a `*_at` variant taking the current time
//! explicitly; the plain variants read the system clock.

use super::code::{generate_code, is_well_formed};
use super::types::{
    MediaRef, MediaSession, SessionStats, SessionStatus, SweepReport, validate_media,
};
use crate::constants::MAX_CODE_ATTEMPTS;
use crate::daemon::error::{Error, Result};
use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Table holding JSON-encoded sessions keyed by code
pub(super) const SESSIONS_TABLE: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("sessions");

/// Media session store backed by redb.
///
/// Sessions survive restarts. Expiry is evaluated against each record's
/// `expires_at`: reads past the window report [`Error::SessionExpired`] and
/// flag the record, [`SessionStore::sweep`] deletes expired records.
///
/// # Thread Safety
///
/// `SessionStore` is `Clone` and can be shared across threads. redb
/// serializes write transactions, so code allocation and status
/// transitions are atomic.
#[derive(Clone)]
pub struct SessionStore {
    pub(super) db: Arc<Database>,
}

impl SessionStore {
    /// Opens or creates the session database at the given path.
    ///
    /// Creates parent directories if needed and initializes the sessions
    /// table on first open.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created (permissions, disk full, etc.)
    /// - Initialization transaction fails to begin or commit
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open session database: {}", path.display()))?;

        let write_txn = db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            let _table = write_txn
                .open_table(SESSIONS_TABLE)
                .context("Failed to initialize sessions table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Creates a completed session holding `media`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty or malformed media list;
    /// nothing is persisted in that case.
    pub fn create(&self, media: Vec<MediaRef>) -> Result<MediaSession> {
        self.create_at(media, Utc::now())
    }

    /// [`SessionStore::create`] with an explicit creation time.
    pub fn create_at(&self, media: Vec<MediaRef>, now: DateTime<Utc>) -> Result<MediaSession> {
        validate_media(&media)?;

        let session = self.insert_new(media, SessionStatus::Completed, now)?;
        tracing::info!(
            code = %session.code,
            media = session.media.len(),
            expires_at = %session.expires_at,
            "Created media session"
        );
        Ok(session)
    }

    /// Creates an empty session in `PROCESSING` state.
    ///
    /// The kiosk reserves a code while capture is still running and
    /// attaches media later with [`SessionStore::attach`].
    pub fn reserve(&self) -> Result<MediaSession> {
        self.reserve_at(Utc::now())
    }

    /// [`SessionStore::reserve`] with an explicit creation time.
    pub fn reserve_at(&self, now: DateTime<Utc>) -> Result<MediaSession> {
        let session = self.insert_new(Vec::new(), SessionStatus::Processing, now)?;
        tracing::info!(code = %session.code, "Reserved media session");
        Ok(session)
    }

    /// Looks up a session by code.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionNotFound`] if the code was never issued or was swept
    /// - [`Error::SessionExpired`] if the retention window has elapsed; the
    ///   record is flagged `EXPIRED` as a side effect
    pub fn get(&self, code: &str) -> Result<MediaSession> {
        self.get_at(code, Utc::now())
    }

    /// [`SessionStore::get`] evaluated at `now`.
    pub fn get_at(&self, code: &str, now: DateTime<Utc>) -> Result<MediaSession> {
        if !is_well_formed(code) {
            return Err(Error::session_not_found(code));
        }

        let session = self
            .load(code)?
            .ok_or_else(|| Error::session_not_found(code))?;

        if session.is_expired_at(now) {
            if session.status != SessionStatus::Expired {
                self.mark_expired(code, now)?;
            }
            return Err(Error::session_expired(code));
        }

        Ok(session)
    }

    /// Attaches media to a `PROCESSING` session and completes it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty or malformed media list
    /// - [`Error::SessionNotFound`] for unknown codes
    /// - [`Error::SessionExpired`] past the retention window
    /// - [`Error::SessionNotPending`] if media was already attached
    pub fn attach(&self, code: &str, media: Vec<MediaRef>) -> Result<MediaSession> {
        self.attach_at(code, media, Utc::now())
    }

    /// [`SessionStore::attach`] evaluated at `now`.
    pub fn attach_at(
        &self,
        code: &str,
        media: Vec<MediaRef>,
        now: DateTime<Utc>,
    ) -> Result<MediaSession> {
        validate_media(&media)?;
        if !is_well_formed(code) {
            return Err(Error::session_not_found(code));
        }

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let outcome = {
            let mut table = write_txn
                .open_table(SESSIONS_TABLE)
                .context("Failed to open sessions table")?;

            let Some(mut session) = read_record(&table, code)? else {
                return Err(Error::session_not_found(code));
            };

            if session.is_expired_at(now) {
                if session.status != SessionStatus::Expired {
                    session.status = SessionStatus::Expired;
                    write_record(&mut table, &session)?;
                }
                Err(Error::session_expired(code))
            } else if session.status != SessionStatus::Processing {
                Err(Error::SessionNotPending {
                    code: code.to_string(),
                    status: session.status.to_string(),
                })
            } else {
                session.media = media;
                session.status = SessionStatus::Completed;
                write_record(&mut table, &session)?;
                Ok(session)
            }
        };

        write_txn
            .commit()
            .context("Failed to commit attach transaction")?;

        if let Ok(session) = &outcome {
            tracing::info!(
                code = %session.code,
                media = session.media.len(),
                "Attached media to session"
            );
        }
        outcome
    }

    /// Deletes every session whose retention window has elapsed.
    ///
    /// After a sweep, lookups of the evicted codes report
    /// [`Error::SessionNotFound`].
    pub fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(Utc::now())
    }

    /// [`SessionStore::sweep`] evaluated at `now`.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let report = {
            let mut table = write_txn
                .open_table(SESSIONS_TABLE)
                .context("Failed to open sessions table")?;

            let mut scanned = 0;
            let mut expired = Vec::new();

            for item in table.iter().context("Failed to iterate sessions table")? {
                let (key, value) = item.context("Failed to read session record")?;
                scanned += 1;

                match serde_json::from_slice::<MediaSession>(value.value()) {
                    Ok(session) if session.is_expired_at(now) => {
                        expired.push(key.value().to_string());
                    },
                    Ok(_) => {},
                    Err(e) => {
                        tracing::warn!(
                            code = key.value(),
                            error = %e,
                            "Skipping unreadable session record"
                        );
                    },
                }
            }

            for code in &expired {
                table
                    .remove(code.as_str())
                    .with_context(|| format!("Failed to evict session '{code}'"))?;
            }

            SweepReport {
                scanned,
                evicted: expired.len(),
            }
        };

        write_txn
            .commit()
            .context("Failed to commit sweep transaction")?;

        if report.evicted > 0 {
            tracing::info!(
                scanned = report.scanned,
                evicted = report.evicted,
                "Swept expired sessions"
            );
        } else {
            tracing::debug!(scanned = report.scanned, "Sweep found no expired sessions");
        }

        Ok(report)
    }

    /// Counts stored sessions by effective status.
    pub fn stats(&self) -> Result<SessionStats> {
        self.stats_at(Utc::now())
    }

    /// [`SessionStore::stats`] evaluated at `now`.
    pub fn stats_at(&self, now: DateTime<Utc>) -> Result<SessionStats> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(SESSIONS_TABLE)
            .context("Failed to open sessions table")?;

        let mut stats = SessionStats::default();
        for item in table.iter().context("Failed to iterate sessions table")? {
            let (_, value) = item.context("Failed to read session record")?;
            let Ok(session) = serde_json::from_slice::<MediaSession>(value.value()) else {
                continue;
            };

            if session.is_expired_at(now) {
                stats.expired += 1;
            } else if session.status == SessionStatus::Processing {
                stats.processing += 1;
            } else {
                stats.completed += 1;
            }
        }

        Ok(stats)
    }

    /// Allocates a unique code and inserts a new record in one transaction.
    fn insert_new(
        &self,
        media: Vec<MediaRef>,
        status: SessionStatus,
        now: DateTime<Utc>,
    ) -> Result<MediaSession> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let session = {
            let mut table = write_txn
                .open_table(SESSIONS_TABLE)
                .context("Failed to open sessions table")?;

            let mut code = None;
            for attempt in 1..=MAX_CODE_ATTEMPTS {
                let candidate = generate_code();
                let taken = table
                    .get(candidate.as_str())
                    .context("Failed to check session code")?
                    .is_some();

                if !taken {
                    code = Some(candidate);
                    break;
                }
                tracing::warn!(attempt, "Session code collision, retrying");
            }

            let code = code.ok_or_else(|| {
                anyhow!("Failed to allocate a unique session code after {MAX_CODE_ATTEMPTS} attempts")
            })?;

            let session = MediaSession::new(code, media, status, now);
            write_record(&mut table, &session)?;
            session
        };

        write_txn
            .commit()
            .context("Failed to commit create transaction")?;

        Ok(session)
    }

    /// Reads a record in its own read transaction.
    fn load(&self, code: &str) -> anyhow::Result<Option<MediaSession>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(SESSIONS_TABLE)
            .context("Failed to open sessions table")?;

        read_record(&table, code)
    }

    /// Flags a record `EXPIRED` if it is still present and past its window.
    fn mark_expired(&self, code: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        {
            let mut table = write_txn
                .open_table(SESSIONS_TABLE)
                .context("Failed to open sessions table")?;

            // A concurrent sweep may have removed it already.
            if let Some(mut session) = read_record(&table, code)?
                && session.status != SessionStatus::Expired
                && now >= session.expires_at
            {
                session.status = SessionStatus::Expired;
                write_record(&mut table, &session)?;
                tracing::debug!(code = %code, "Flagged session as expired");
            }
        }

        write_txn
            .commit()
            .context("Failed to commit expiry transaction")?;

        Ok(())
    }
}

/// Reads and decodes one record from any readable sessions table.
fn read_record<T>(table: &T, code: &str) -> anyhow::Result<Option<MediaSession>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let Some(guard) = table
        .get(code)
        .with_context(|| format!("Failed to read session '{code}'"))?
    else {
        return Ok(None);
    };

    let session = serde_json::from_slice(guard.value())
        .with_context(|| format!("Failed to deserialize session '{code}'"))?;
    Ok(Some(session))
}

/// Encodes and writes one record.
fn write_record(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    session: &MediaSession,
) -> anyhow::Result<()> {
    let json = serde_json::to_vec(session).context("Failed to serialize session to JSON")?;
    table
        .insert(session.code.as_str(), json.as_slice())
        .with_context(|| format!("Failed to write session '{}'", session.code))?;
    Ok(())
}
