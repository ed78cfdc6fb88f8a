use crate::error::Result;
use rusqlite::{Connection, Transaction};

/// Clear every aggregate table that `RebuildAggregates` recomputes from
/// retained events (§4.7). Tables derived from data not persisted on the
/// event row itself (slots, pipeline segments, project types) are left
/// untouched; a rebuild can't reconstruct what was never stored.
pub fn reset_for_rebuild(tx: &Transaction) -> Result<()> {
    tx.execute("DELETE FROM command_stats", [])?;
    tx.execute("DELETE FROM transition_stats", [])?;
    tx.execute("DELETE FROM failure_recovery", [])?;
    Ok(())
}

/// Reclaim space after a `Purge` deletes a large share of raw events (§4.7).
pub fn vacuum(conn: &Connection) -> Result<()> {
    conn.execute("VACUUM", [])?;
    Ok(())
}

/// Row counts across the store's core tables, for `nextcmd status` (§6.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub session_count: i64,
    pub event_count: i64,
    pub cached_suggestion_count: i64,
}

pub fn counts(conn: &Connection) -> Result<StoreCounts> {
    let session_count: i64 = conn.query_row("SELECT count(*) FROM sessions", [], |r| r.get(0))?;
    let event_count: i64 = conn.query_row("SELECT count(*) FROM command_events", [], |r| r.get(0))?;
    let cached_suggestion_count: i64 = conn.query_row("SELECT count(*) FROM suggestion_cache", [], |r| r.get(0))?;
    Ok(StoreCounts { session_count, event_count, cached_suggestion_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn reset_for_rebuild_clears_only_the_replayable_tables() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                tx.execute(
                    "INSERT INTO command_stats (scope, template_id, score, last_seen_ms) VALUES ('global', 't1', 1.0, 1000)",
                    [],
                )?;
                tx.execute(
                    "INSERT INTO project_type_stats (scope, project_type, score, last_seen_ms) VALUES ('global', 'rust', 1.0, 1000)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        store.with_tx(|tx| reset_for_rebuild(tx)).unwrap();

        let stats_count = store
            .with_conn(|conn| Ok(conn.query_row("SELECT count(*) FROM command_stats", [], |r| r.get::<_, i64>(0))?))
            .unwrap();
        assert_eq!(stats_count, 0);

        let project_count = store
            .with_conn(|conn| Ok(conn.query_row("SELECT count(*) FROM project_type_stats", [], |r| r.get::<_, i64>(0))?))
            .unwrap();
        assert_eq!(project_count, 1, "rebuild must not touch aggregates it can't recompute");
    }

    #[test]
    fn counts_reflect_inserted_rows() {
        use nextcmd_types::{Session, ShellKind};

        let store = Store::open_in_memory().unwrap();
        let session = Session::new("s1", ShellKind::Bash, 0);
        store.with_conn(|conn| crate::sessions::ensure_exists(conn, &session)).unwrap();

        let counts = store.with_conn(counts).unwrap();
        assert_eq!(counts.session_count, 1);
        assert_eq!(counts.event_count, 0);
    }
}
