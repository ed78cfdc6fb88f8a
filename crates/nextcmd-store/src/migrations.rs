use crate::error::{Error, Result};
use crate::schema::MIGRATION_1;
use rusqlite::Connection;

/// One forward-only step in the schema ledger. Migrations are applied
/// in ascending order and never drop or rewrite existing tables (§4.3);
/// a later migration only adds tables, columns, or indexes.
struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "initial schema: sessions, events, templates, and all aggregate tables",
    sql: MIGRATION_1,
}];

pub const SUPPORTED_VERSION: i32 = 1;

/// Apply every migration the on-disk database hasn't seen yet. Refuses
/// to run if the on-disk version is newer than this binary supports,
/// rather than guessing at a format it doesn't know (§4.3).
pub fn run(conn: &Connection) -> Result<()> {
    let on_disk: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if on_disk > SUPPORTED_VERSION {
        return Err(Error::SchemaTooNew {
            on_disk,
            supported: SUPPORTED_VERSION,
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > on_disk) {
        tracing::info!(version = migration.version, description = migration.description, "applying migration");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(&format!("PRAGMA user_version = {}", migration.version), [])?;
        tx.commit()?;
    }

    Ok(())
}
