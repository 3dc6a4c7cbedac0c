// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result cache operations keyed by document fingerprint.

use aggieace_core::{AggieError, CacheEntry, Fingerprint};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;

/// Fetch the cached calendar for `fingerprint`, if any.
pub async fn find_cached(
    db: &Database,
    fingerprint: &Fingerprint,
) -> Result<Option<CacheEntry>, AggieError> {
    let key = fingerprint.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<CacheEntry>, rusqlite::Error> {
            conn.query_row(
                "SELECT fingerprint, calendar_text, source_path, created_at
                 FROM calendar_cache WHERE fingerprint = ?1",
                params![key],
                |row| {
                    Ok(CacheEntry {
                        fingerprint: Fingerprint(row.get(0)?),
                        calendar_text: row.get(1)?,
                        source_path: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or overwrite the calendar for `fingerprint`.
///
/// A second write for the same fingerprint replaces the text, the source
/// path and the timestamp.
pub async fn save_cached(
    db: &Database,
    fingerprint: &Fingerprint,
    calendar_text: &str,
    source_path: Option<&str>,
    created_at: &str,
) -> Result<(), AggieError> {
    let key = fingerprint.as_str().to_string();
    let calendar_text = calendar_text.to_string();
    let source_path = source_path.map(str::to_string);
    let created_at = created_at.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO calendar_cache (fingerprint, calendar_text, source_path, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(fingerprint) DO UPDATE SET
                     calendar_text = excluded.calendar_text,
                     source_path = excluded.source_path,
                     created_at = excluded.created_at",
                params![key, calendar_text, source_path, created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of cached calendars.
pub async fn count_cached(db: &Database) -> Result<u64, AggieError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM calendar_cache", [], |row| row.get(0))
        })
        .await
        .map(|n| n.max(0) as u64)
        .map_err(crate::database::map_tr_err)
}
