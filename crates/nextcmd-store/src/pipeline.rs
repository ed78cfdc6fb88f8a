use crate::error::Result;
use crate::scope_codec;
use nextcmd_types::{BoundaryOp, PipelineEvent, PipelinePattern, PipelineTransition, Scope};
use rusqlite::{params, Connection};

fn boundary_to_str(op: Option<BoundaryOp>) -> Option<&'static str> {
    op.map(BoundaryOp::as_str)
}

fn boundary_from_str(s: Option<String>) -> Option<BoundaryOp> {
    s.and_then(|s| BoundaryOp::from_token(&s))
}

/// Insert one pipeline segment row (§4.4 step 7, first half).
pub fn insert_event(conn: &Connection, event: &PipelineEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO pipeline_events
         (parent_event_id, position, boundary_before, raw_segment, normalized_text, template_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.parent_event_id,
            event.position,
            boundary_to_str(event.boundary_before),
            event.raw_segment,
            event.normalized_text,
            event.template_id,
        ],
    )?;
    Ok(())
}

pub fn events_for_parent(conn: &Connection, parent_event_id: i64) -> Result<Vec<PipelineEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT parent_event_id, position, boundary_before, raw_segment, normalized_text, template_id
         FROM pipeline_events WHERE parent_event_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![parent_event_id], |row| {
        Ok(PipelineEvent {
            parent_event_id: row.get(0)?,
            position: row.get(1)?,
            boundary_before: boundary_from_str(row.get(2)?),
            raw_segment: row.get(3)?,
            normalized_text: row.get(4)?,
            template_id: row.get(5)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Bump an adjacent-segment transition (§4.4 step 7, second half).
pub fn upsert_transition(
    conn: &Connection,
    scope: &Scope,
    prev_template_id: &str,
    next_template_id: &str,
    operator: BoundaryOp,
    now_ms: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO pipeline_transitions (scope, prev_template_id, next_template_id, operator, weight, count, last_seen_ms)
         VALUES (?1, ?2, ?3, ?4, 1.0, 1, ?5)
         ON CONFLICT(scope, prev_template_id, next_template_id, operator) DO UPDATE SET
             weight = weight + 1.0, count = count + 1, last_seen_ms = ?5",
        params![scope.as_key(), prev_template_id, next_template_id, operator.as_str(), now_ms],
    )?;
    Ok(())
}

pub fn transitions_from(
    conn: &Connection,
    scope: &Scope,
    prev_template_id: &str,
) -> Result<Vec<PipelineTransition>> {
    let mut stmt = conn.prepare_cached(
        "SELECT scope, prev_template_id, next_template_id, operator, weight, count, last_seen_ms
         FROM pipeline_transitions WHERE scope = ?1 AND prev_template_id = ?2",
    )?;
    let rows = stmt.query_map(params![scope.as_key(), prev_template_id], |row| {
        let scope_key: String = row.get(0)?;
        let op: String = row.get(3)?;
        Ok(PipelineTransition {
            scope: scope_codec::decode(&scope_key),
            prev_template_id: row.get(1)?,
            next_template_id: row.get(2)?,
            operator: BoundaryOp::from_token(&op).unwrap_or(BoundaryOp::Pipe),
            weight: row.get(4)?,
            count: row.get(5)?,
            last_seen_ms: row.get(6)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Bump the whole-chain pattern row (§4.4 step 7, third part).
pub fn upsert_pattern(
    conn: &Connection,
    scope: &Scope,
    pattern_hash: &str,
    display: &str,
    operator_chain: &str,
    now_ms: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO pipeline_patterns (scope, pattern_hash, display, operator_chain, count, last_seen_ms)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)
         ON CONFLICT(scope, pattern_hash) DO UPDATE SET
             count = count + 1, last_seen_ms = ?5",
        params![scope.as_key(), pattern_hash, display, operator_chain, now_ms],
    )?;
    Ok(())
}

pub fn pattern_for(
    conn: &Connection,
    scope: &Scope,
    pattern_hash: &str,
) -> Result<Option<PipelinePattern>> {
    use rusqlite::OptionalExtension;
    let pattern = conn
        .query_row(
            "SELECT scope, pattern_hash, display, operator_chain, count, last_seen_ms
             FROM pipeline_patterns WHERE scope = ?1 AND pattern_hash = ?2",
            params![scope.as_key(), pattern_hash],
            |row| {
                let scope_key: String = row.get(0)?;
                Ok(PipelinePattern {
                    scope: scope_codec::decode(&scope_key),
                    pattern_hash: row.get(1)?,
                    display: row.get(2)?,
                    operator_chain: row.get(3)?,
                    count: row.get(4)?,
                    last_seen_ms: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn pipeline_events_are_ordered_by_position() {
        use nextcmd_types::{Session, ShellKind};

        let store = Store::open_in_memory().unwrap();
        store.with_conn(|conn| crate::sessions::ensure_exists(conn, &Session::new("s1", ShellKind::Other, 100))).unwrap();
        store.with_conn(|conn| crate::templates::upsert(conn, "parent", "go test <path> | grep <arg>", 0, 100)).unwrap();
        store.with_conn(|conn| {
            conn.execute(
                "INSERT INTO command_events (session_id, completed_ts_ms, exit_code, cwd, normalized_text, template_id)
                 VALUES ('s1', 100, 0, '/repo', 'go test <path> | grep <arg>', 'parent')",
                [],
            )?;
            Ok(conn.last_insert_rowid())
        }).unwrap();

        let parent_id = store.with_conn(|conn| {
            Ok(conn.query_row("SELECT id FROM command_events", [], |r| r.get::<_, i64>(0))?)
        }).unwrap();

        store.with_conn(|conn| {
            insert_event(conn, &PipelineEvent {
                parent_event_id: parent_id,
                position: 0,
                boundary_before: None,
                raw_segment: "go test ./...".into(),
                normalized_text: "go test <path>".into(),
                template_id: "seg0".into(),
            })
        }).unwrap();
        store.with_conn(|conn| {
            insert_event(conn, &PipelineEvent {
                parent_event_id: parent_id,
                position: 1,
                boundary_before: Some(BoundaryOp::Pipe),
                raw_segment: "grep FAIL".into(),
                normalized_text: "grep <arg>".into(),
                template_id: "seg1".into(),
            })
        }).unwrap();

        let segments = store.with_conn(|conn| events_for_parent(conn, parent_id)).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].boundary_before, None);
        assert_eq!(segments[1].boundary_before, Some(BoundaryOp::Pipe));
    }

    #[test]
    fn transition_and_pattern_counts_accumulate() {
        let store = Store::open_in_memory().unwrap();
        store.with_conn(|conn| upsert_transition(conn, &Scope::Global, "seg0", "seg1", BoundaryOp::Pipe, 100)).unwrap();
        store.with_conn(|conn| upsert_transition(conn, &Scope::Global, "seg0", "seg1", BoundaryOp::Pipe, 200)).unwrap();
        let transitions = store.with_conn(|conn| transitions_from(conn, &Scope::Global, "seg0")).unwrap();
        assert_eq!(transitions[0].count, 2);

        store.with_conn(|conn| upsert_pattern(conn, &Scope::Global, "hash1", "go test | grep", "|", 100)).unwrap();
        store.with_conn(|conn| upsert_pattern(conn, &Scope::Global, "hash1", "go test | grep", "|", 200)).unwrap();
        let pattern = store.with_conn(|conn| pattern_for(conn, &Scope::Global, "hash1")).unwrap().unwrap();
        assert_eq!(pattern.count, 2);
    }
}
