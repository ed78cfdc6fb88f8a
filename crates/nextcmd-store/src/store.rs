use crate::error::{Error, Result};
use crate::lock::DirLock;
use crate::migrations;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Embedded, single-process SQL store (§4.3). Holds one connection
/// behind a mutex: there is exactly one writer, and readers serialize
/// at the same lock rather than fighting SQLite's own locking.
#[derive(Debug)]
pub struct Store {
    conn: Mutex<Connection>,
    data_dir: Option<PathBuf>,
    _lock: Option<DirLock>,
}

impl Store {
    /// Open (creating if absent) the store file at `data_dir/state.db`,
    /// applying pending migrations under an advisory file lock. If
    /// `enable_recovery` is set and the file fails an integrity check,
    /// it is rotated to `*.corrupt.<unix_ms>` and a fresh store opened
    /// in its place; otherwise corruption is fatal (§4.3, §4.11).
    pub fn open(data_dir: &Path, enable_recovery: bool) -> Result<Self> {
        let lock = DirLock::acquire(data_dir)?;
        let db_path = data_dir.join("state.db");

        if db_path.exists() {
            if let Err(reason) = check_integrity(&db_path) {
                if enable_recovery {
                    rotate_corrupt(&db_path)?;
                    tracing::warn!(reason = %reason, "rotated corrupt store file and starting fresh");
                } else {
                    return Err(Error::Corrupt(reason));
                }
            }
        }

        let conn = Connection::open(&db_path)?;
        apply_pragmas(&conn)?;
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            data_dir: Some(data_dir.to_path_buf()),
            _lock: Some(lock),
        })
    }

    /// In-memory store for tests: no lock, no file, same schema.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_pragmas(&conn)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            data_dir: None,
            _lock: None,
        })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Run `f` inside a single serialized transaction, committing on
    /// `Ok` and rolling back on `Err` (§4.4: all aggregate writes for
    /// one event share one transaction).
    pub fn with_tx<T>(&self, f: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock().expect("store mutex poisoned");
        let tx = guard.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Run a read-only closure against the connection. Reads don't need
    /// their own transaction; SQLite already gives a consistent
    /// snapshot for a single statement.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock().expect("store mutex poisoned");
        f(&guard)
    }

    /// Checkpoint and truncate the WAL (§4.3, default every 5 minutes
    /// and on shutdown).
    pub fn checkpoint(&self) -> Result<()> {
        let guard = self.conn.lock().expect("store mutex poisoned");
        guard.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}

fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        "#,
    )?;
    Ok(())
}

fn check_integrity(db_path: &Path) -> std::result::Result<(), String> {
    let conn = Connection::open(db_path).map_err(|e| e.to_string())?;
    let result: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .map_err(|e| e.to_string())?;
    if result == "ok" {
        Ok(())
    } else {
        Err(result)
    }
}

fn rotate_corrupt(db_path: &Path) -> Result<()> {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let rotated = db_path.with_extension(format!("db.corrupt.{now_ms}"));
    std::fs::rename(db_path, rotated)?;
    for suffix in ["-wal", "-shm"] {
        let side_file = PathBuf::from(format!("{}{}", db_path.display(), suffix));
        let _ = std::fs::remove_file(side_file);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_opens_and_migrates() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let count: i32 = conn.query_row(
                    "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='command_events'",
                    [],
                    |r| r.get(0),
                )?;
                assert_eq!(count, 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn with_tx_rolls_back_on_error() {
        let store = Store::open_in_memory().unwrap();
        let result: Result<()> = store.with_tx(|tx| {
            tx.execute(
                "INSERT INTO sessions (id, shell, start_ts) VALUES ('s1', 'bash', 0)",
                [],
            )?;
            Err(Error::Query("forced rollback".into()))
        });
        assert!(result.is_err());

        store
            .with_conn(|conn| {
                let count: i32 =
                    conn.query_row("SELECT count(*) FROM sessions", [], |r| r.get(0))?;
                assert_eq!(count, 0);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn open_twice_on_same_dir_fails_to_lock() {
        let dir = tempfile::tempdir().unwrap();
        let _first = Store::open(dir.path(), false).unwrap();
        let second = Store::open(dir.path(), false);
        assert!(matches!(second, Err(Error::Locked)));
    }
}
