use crate::error::Result;
use crate::scope_codec;
use nextcmd_types::{decay, ProjectTypeStat, ProjectTypeTransition, Scope};
use rusqlite::{params, Connection, OptionalExtension};

/// Decayed-frequency update for one active project type (§4.4 step 6),
/// mirroring [`crate::stats::upsert_frequency`] but keyed by project
/// type instead of template id.
pub fn upsert_stat(
    conn: &Connection,
    scope: &Scope,
    project_type: &str,
    now_ms: i64,
    tau_ms: i64,
) -> Result<()> {
    let key = scope.as_key();
    let existing: Option<(f64, i64)> = conn
        .query_row(
            "SELECT score, last_seen_ms FROM project_type_stats WHERE scope = ?1 AND project_type = ?2",
            params![key, project_type],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let score = match existing {
        Some((score, last_seen_ms)) => decay(score, last_seen_ms, now_ms, tau_ms) + 1.0,
        None => 1.0,
    };

    conn.execute(
        "INSERT INTO project_type_stats (scope, project_type, score, last_seen_ms)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(scope, project_type) DO UPDATE SET score = ?3, last_seen_ms = ?4",
        params![key, project_type, score, now_ms],
    )?;
    Ok(())
}

pub fn upsert_transition(
    conn: &Connection,
    scope: &Scope,
    project_type: &str,
    prev_template_id: &str,
    next_template_id: &str,
    now_ms: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO project_type_transitions (scope, project_type, prev_template_id, next_template_id, weight, last_seen_ms)
         VALUES (?1, ?2, ?3, ?4, 1.0, ?5)
         ON CONFLICT(scope, project_type, prev_template_id, next_template_id) DO UPDATE SET
             weight = weight + 1.0, last_seen_ms = ?5",
        params![scope.as_key(), project_type, prev_template_id, next_template_id, now_ms],
    )?;
    Ok(())
}

pub fn stats_for_scope(conn: &Connection, scope: &Scope) -> Result<Vec<ProjectTypeStat>> {
    let mut stmt = conn.prepare_cached(
        "SELECT scope, project_type, score, last_seen_ms FROM project_type_stats WHERE scope = ?1",
    )?;
    let rows = stmt.query_map(params![scope.as_key()], |row| {
        let scope_key: String = row.get(0)?;
        Ok(ProjectTypeStat {
            scope: scope_codec::decode(&scope_key),
            project_type: row.get(1)?,
            score: row.get(2)?,
            last_seen_ms: row.get(3)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn transitions_for(
    conn: &Connection,
    scope: &Scope,
    project_type: &str,
    prev_template_id: &str,
) -> Result<Vec<ProjectTypeTransition>> {
    let mut stmt = conn.prepare_cached(
        "SELECT scope, project_type, prev_template_id, next_template_id, weight, last_seen_ms
         FROM project_type_transitions WHERE scope = ?1 AND project_type = ?2 AND prev_template_id = ?3",
    )?;
    let rows = stmt.query_map(params![scope.as_key(), project_type, prev_template_id], |row| {
        let scope_key: String = row.get(0)?;
        Ok(ProjectTypeTransition {
            scope: scope_codec::decode(&scope_key),
            project_type: row.get(1)?,
            prev_template_id: row.get(2)?,
            next_template_id: row.get(3)?,
            weight: row.get(4)?,
            last_seen_ms: row.get(5)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}
