use crate::error::Result;
use crate::scope_codec;
use nextcmd_types::{DismissalPattern, Scope, SuppressionLevel};
use rusqlite::{params, Connection, OptionalExtension};

fn level_to_str(level: SuppressionLevel) -> &'static str {
    match level {
        SuppressionLevel::None => "none",
        SuppressionLevel::Soft => "soft",
        SuppressionLevel::Learned => "learned",
        SuppressionLevel::Permanent => "permanent",
    }
}

fn level_from_str(s: &str) -> SuppressionLevel {
    match s {
        "soft" => SuppressionLevel::Soft,
        "learned" => SuppressionLevel::Learned,
        "permanent" => SuppressionLevel::Permanent,
        _ => SuppressionLevel::None,
    }
}

pub fn get(
    conn: &Connection,
    scope: &Scope,
    context_template_id: &str,
    dismissed_template_id: &str,
) -> Result<Option<DismissalPattern>> {
    let row = conn
        .query_row(
            "SELECT scope, context_template_id, dismissed_template_id, dismissal_count, last_dismissal_ms, level
             FROM dismissal_patterns WHERE scope = ?1 AND context_template_id = ?2 AND dismissed_template_id = ?3",
            params![scope.as_key(), context_template_id, dismissed_template_id],
            |row| {
                let scope_key: String = row.get(0)?;
                let level: String = row.get(5)?;
                Ok(DismissalPattern {
                    scope: scope_codec::decode(&scope_key),
                    context_template_id: row.get(1)?,
                    dismissed_template_id: row.get(2)?,
                    dismissal_count: row.get(3)?,
                    last_dismissal_ms: row.get(4)?,
                    level: level_from_str(&level),
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// `RecordDismissal` (§4.10): bump the count and advance the
/// suppression ladder; never downgrades.
pub fn record_dismissal(
    conn: &Connection,
    scope: &Scope,
    context_template_id: &str,
    dismissed_template_id: &str,
    now_ms: i64,
) -> Result<SuppressionLevel> {
    let existing = get(conn, scope, context_template_id, dismissed_template_id)?;
    let (count, prior_level) = match &existing {
        Some(row) => (row.dismissal_count + 1, row.level),
        None => (1, SuppressionLevel::None),
    };
    let level = prior_level.next_on_dismissal(count);
    upsert(conn, scope, context_template_id, dismissed_template_id, count, now_ms, level)?;
    Ok(level)
}

/// `RecordNever` (§4.10): jump straight to `permanent`.
pub fn record_never(
    conn: &Connection,
    scope: &Scope,
    context_template_id: &str,
    dismissed_template_id: &str,
    now_ms: i64,
) -> Result<()> {
    let count = get(conn, scope, context_template_id, dismissed_template_id)?
        .map(|row| row.dismissal_count)
        .unwrap_or(0);
    upsert(
        conn,
        scope,
        context_template_id,
        dismissed_template_id,
        count,
        now_ms,
        SuppressionLevel::Permanent,
    )
}

fn upsert(
    conn: &Connection,
    scope: &Scope,
    context_template_id: &str,
    dismissed_template_id: &str,
    count: i64,
    now_ms: i64,
    level: SuppressionLevel,
) -> Result<()> {
    conn.execute(
        "INSERT INTO dismissal_patterns (scope, context_template_id, dismissed_template_id, dismissal_count, last_dismissal_ms, level)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(scope, context_template_id, dismissed_template_id) DO UPDATE SET
             dismissal_count = ?4, last_dismissal_ms = ?5, level = ?6",
        params![scope.as_key(), context_template_id, dismissed_template_id, count, now_ms, level_to_str(level)],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn dismissal_ladder_progresses_and_never_downgrades() {
        let store = Store::open_in_memory().unwrap();
        let level1 = store
            .with_conn(|conn| record_dismissal(conn, &Scope::Global, "ctx", "cmd", 100))
            .unwrap();
        assert_eq!(level1, SuppressionLevel::Soft);

        for ts in [200, 300] {
            store
                .with_conn(|conn| record_dismissal(conn, &Scope::Global, "ctx", "cmd", ts))
                .unwrap();
        }
        let row = store.with_conn(|conn| get(conn, &Scope::Global, "ctx", "cmd")).unwrap().unwrap();
        assert_eq!(row.level, SuppressionLevel::Learned);
        assert_eq!(row.dismissal_count, 3);
    }

    #[test]
    fn record_never_jumps_to_permanent() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| record_never(conn, &Scope::Global, "ctx", "cmd", 100))
            .unwrap();
        let row = store.with_conn(|conn| get(conn, &Scope::Global, "ctx", "cmd")).unwrap().unwrap();
        assert_eq!(row.level, SuppressionLevel::Permanent);
    }
}
