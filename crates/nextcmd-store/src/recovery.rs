use crate::error::Result;
use crate::scope_codec;
use nextcmd_types::{ExitClass, FailureRecovery, RecoverySource, Scope};
use rusqlite::{params, Connection, OptionalExtension};

fn class_to_str(class: ExitClass) -> &'static str {
    match class {
        ExitClass::General => "general",
        ExitClass::NotFound => "not_found",
        ExitClass::Sigint => "sigint",
        ExitClass::Sigkill => "sigkill",
        ExitClass::Unknown => "unknown",
    }
}

fn class_from_str(s: &str) -> ExitClass {
    match s {
        "not_found" => ExitClass::NotFound,
        "sigint" => ExitClass::Sigint,
        "sigkill" => ExitClass::Sigkill,
        "unknown" => ExitClass::Unknown,
        _ => ExitClass::General,
    }
}

fn source_to_str(source: RecoverySource) -> &'static str {
    match source {
        RecoverySource::Learned => "learned",
        RecoverySource::Bootstrap => "bootstrap",
    }
}

fn source_from_str(s: &str) -> RecoverySource {
    match s {
        "bootstrap" => RecoverySource::Bootstrap,
        _ => RecoverySource::Learned,
    }
}

pub fn get(
    conn: &Connection,
    scope: &Scope,
    failed_template_id: &str,
    exit_class: ExitClass,
    recovery_template_id: &str,
) -> Result<Option<FailureRecovery>> {
    let row = conn
        .query_row(
            "SELECT scope, failed_template_id, exit_class, recovery_template_id, weight, count,
                    success_rate, source, last_seen_ms
             FROM failure_recovery
             WHERE scope = ?1 AND failed_template_id = ?2 AND exit_class = ?3 AND recovery_template_id = ?4",
            params![scope.as_key(), failed_template_id, class_to_str(exit_class), recovery_template_id],
            |row| {
                let scope_key: String = row.get(0)?;
                let class: String = row.get(2)?;
                let source: String = row.get(7)?;
                Ok(FailureRecovery {
                    scope: scope_codec::decode(&scope_key),
                    failed_template_id: row.get(1)?,
                    exit_class: class_from_str(&class),
                    recovery_template_id: row.get(3)?,
                    weight: row.get(4)?,
                    count: row.get(5)?,
                    success_rate: row.get(6)?,
                    source: source_from_str(&source),
                    last_seen_ms: row.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Record a recovery outcome (§4.4 step 8): run the moving-average
/// formula in-process (so it exactly matches
/// [`FailureRecovery::record_outcome`]) then persist the result.
pub fn record_outcome(
    conn: &Connection,
    scope: &Scope,
    failed_template_id: &str,
    exit_class: ExitClass,
    recovery_template_id: &str,
    recovery_exit_code: i32,
    now_ms: i64,
) -> Result<()> {
    let mut recovery = get(conn, scope, failed_template_id, exit_class, recovery_template_id)?
        .unwrap_or(FailureRecovery {
            scope: scope.clone(),
            failed_template_id: failed_template_id.to_string(),
            exit_class,
            recovery_template_id: recovery_template_id.to_string(),
            weight: 0.0,
            count: 0,
            success_rate: 0.0,
            source: RecoverySource::Learned,
            last_seen_ms: now_ms,
        });
    recovery.record_outcome(recovery_exit_code, now_ms);

    conn.execute(
        "INSERT INTO failure_recovery
         (scope, failed_template_id, exit_class, recovery_template_id, weight, count, success_rate, source, last_seen_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(scope, failed_template_id, exit_class, recovery_template_id) DO UPDATE SET
             weight = ?5, count = ?6, success_rate = ?7, last_seen_ms = ?9",
        params![
            scope.as_key(),
            failed_template_id,
            class_to_str(exit_class),
            recovery_template_id,
            recovery.weight,
            recovery.count,
            recovery.success_rate,
            source_to_str(recovery.source),
            now_ms,
        ],
    )?;
    Ok(())
}

pub fn candidates_for_failure(
    conn: &Connection,
    scope: &Scope,
    failed_template_id: &str,
    exit_class: ExitClass,
) -> Result<Vec<FailureRecovery>> {
    let mut stmt = conn.prepare_cached(
        "SELECT scope, failed_template_id, exit_class, recovery_template_id, weight, count,
                success_rate, source, last_seen_ms
         FROM failure_recovery WHERE scope = ?1 AND failed_template_id = ?2 AND exit_class = ?3",
    )?;
    let rows = stmt.query_map(
        params![scope.as_key(), failed_template_id, class_to_str(exit_class)],
        |row| {
            let scope_key: String = row.get(0)?;
            let class: String = row.get(2)?;
            let source: String = row.get(7)?;
            Ok(FailureRecovery {
                scope: scope_codec::decode(&scope_key),
                failed_template_id: row.get(1)?,
                exit_class: class_from_str(&class),
                recovery_template_id: row.get(3)?,
                weight: row.get(4)?,
                count: row.get(5)?,
                success_rate: row.get(6)?,
                source: source_from_str(&source),
                last_seen_ms: row.get(8)?,
            })
        },
    )?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn record_outcome_matches_the_moving_average_formula() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                record_outcome(conn, &Scope::Global, "t1", ExitClass::NotFound, "t2", 0, 100)
            })
            .unwrap();
        store
            .with_conn(|conn| {
                record_outcome(conn, &Scope::Global, "t1", ExitClass::NotFound, "t2", 1, 200)
            })
            .unwrap();

        let recovery = store
            .with_conn(|conn| get(conn, &Scope::Global, "t1", ExitClass::NotFound, "t2"))
            .unwrap()
            .unwrap();
        assert_eq!(recovery.count, 2);
        assert!((recovery.success_rate - 0.5).abs() < 1e-9);
    }
}
