use crate::error::Result;
use nextcmd_types::CommandEvent;
use rusqlite::{params, Connection, Row};

/// Insert the event row and return its assigned id (§4.4 step 1).
/// Ephemeral events are still inserted (retention purges them like any
/// other raw event) but callers decide whether to feed them into the
/// rest of the write path.
pub fn insert(conn: &Connection, event: &CommandEvent) -> Result<i64> {
    conn.execute(
        "INSERT INTO command_events
         (session_id, completed_ts_ms, duration_ms, exit_code, cwd, normalized_text,
          template_id, repo_key, branch, repo_name, repo_root, ephemeral)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            event.session_id,
            event.completed_ts_ms,
            event.duration_ms,
            event.exit_code,
            event.cwd,
            event.normalized_text,
            event.template_id,
            event.repo_key,
            event.branch,
            event.repo_name,
            event.repo_root,
            event.ephemeral,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent non-ephemeral event for a session, used to determine
/// "previous template id" / "previous exit code" context (§4.4 step 4,
/// §5 ordering guarantee).
pub fn last_for_session(conn: &Connection, session_id: &str) -> Result<Option<CommandEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, session_id, completed_ts_ms, duration_ms, exit_code, cwd, normalized_text,
                template_id, repo_key, branch, repo_name, repo_root, ephemeral
         FROM command_events
         WHERE session_id = ?1 AND ephemeral = 0
         ORDER BY completed_ts_ms DESC, id DESC
         LIMIT 1",
    )?;
    let mut rows = stmt.query(params![session_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_event(row)?)),
        None => Ok(None),
    }
}

/// Delete raw events older than the retention horizon (§4.7 `Purge`).
/// Aggregate rows are untouched; they already encode decay.
pub fn delete_older_than(conn: &Connection, horizon_ms: i64) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM command_events WHERE completed_ts_ms < ?1",
        params![horizon_ms],
    )?;
    Ok(deleted)
}

/// All retained events in chronological order, for `RebuildAggregates`
/// (§4.7).
pub fn all_chronological(conn: &Connection) -> Result<Vec<CommandEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, completed_ts_ms, duration_ms, exit_code, cwd, normalized_text,
                template_id, repo_key, branch, repo_name, repo_root, ephemeral
         FROM command_events
         ORDER BY completed_ts_ms ASC, id ASC",
    )?;
    let rows = stmt.query_map([], row_to_event)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

fn row_to_event(row: &Row) -> rusqlite::Result<CommandEvent> {
    Ok(CommandEvent {
        id: row.get(0)?,
        session_id: row.get(1)?,
        completed_ts_ms: row.get(2)?,
        duration_ms: row.get(3)?,
        exit_code: row.get(4)?,
        cwd: row.get(5)?,
        normalized_text: row.get(6)?,
        template_id: row.get(7)?,
        repo_key: row.get(8)?,
        branch: row.get(9)?,
        repo_name: row.get(10)?,
        repo_root: row.get(11)?,
        ephemeral: row.get(12)?,
    })
}
