// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded SQLite migrations for the cache table.
//!
//! SQL files under `migrations/` are compiled in via `embed_migrations!`
//! and applied when a [`SqliteBackend`](crate::SqliteBackend) opens.

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), refinery::Error> {
    embedded::migrations::runner().run(conn)?;
    Ok(())
}
