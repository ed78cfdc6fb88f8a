use crate::error::Result;
use crate::scope_codec;
use nextcmd_types::{decay, CommandStat, Scope, TransitionStat};
use rusqlite::{params, Connection, OptionalExtension};

/// Apply the decayed-frequency update for one scope (§4.4 step 3):
/// `score <- score * exp(-(now-last_ts)/tau) + 1.0`, first occurrence
/// sets score to 1.0, and the matching success/failure counter bumps.
pub fn upsert_frequency(
    conn: &Connection,
    scope: &Scope,
    template_id: &str,
    now_ms: i64,
    tau_ms: i64,
    succeeded: bool,
) -> Result<()> {
    let key = scope.as_key();
    let existing = get(conn, scope, template_id)?;
    let (score, success_count, failure_count) = match existing {
        Some(stat) => {
            let decayed = decay(stat.score, stat.last_seen_ms, now_ms, tau_ms) + 1.0;
            (decayed, stat.success_count, stat.failure_count)
        }
        None => (1.0, 0, 0),
    };
    let success_count = success_count + if succeeded { 1 } else { 0 };
    let failure_count = failure_count + if succeeded { 0 } else { 1 };

    conn.execute(
        "INSERT INTO command_stats (scope, template_id, score, success_count, failure_count, last_seen_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(scope, template_id) DO UPDATE SET
             score = ?3, success_count = ?4, failure_count = ?5, last_seen_ms = ?6",
        params![key, template_id, score, success_count, failure_count, now_ms],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, scope: &Scope, template_id: &str) -> Result<Option<CommandStat>> {
    let key = scope.as_key();
    let stat = conn
        .query_row(
            "SELECT scope, template_id, score, success_count, failure_count, last_seen_ms
             FROM command_stats WHERE scope = ?1 AND template_id = ?2",
            params![key, template_id],
            |row| {
                let scope_key: String = row.get(0)?;
                Ok(CommandStat {
                    scope: scope_codec::decode(&scope_key),
                    template_id: row.get(1)?,
                    score: row.get(2)?,
                    success_count: row.get(3)?,
                    failure_count: row.get(4)?,
                    last_seen_ms: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(stat)
}

/// Top candidates by raw (non-decayed) score for a scope; the scorer
/// re-decays to `now_ms` itself (§8 property 3).
pub fn top_for_scope(conn: &Connection, scope: &Scope, limit: usize) -> Result<Vec<CommandStat>> {
    let key = scope.as_key();
    let mut stmt = conn.prepare_cached(
        "SELECT scope, template_id, score, success_count, failure_count, last_seen_ms
         FROM command_stats WHERE scope = ?1 ORDER BY score DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![key, limit as i64], |row| {
        let scope_key: String = row.get(0)?;
        Ok(CommandStat {
            scope: scope_codec::decode(&scope_key),
            template_id: row.get(1)?,
            score: row.get(2)?,
            success_count: row.get(3)?,
            failure_count: row.get(4)?,
            last_seen_ms: row.get(5)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Bump a bigram transition (§4.4 step 4): `weight += 1.0, count += 1`.
pub fn upsert_transition(
    conn: &Connection,
    scope: &Scope,
    prev_template_id: &str,
    next_template_id: &str,
    now_ms: i64,
) -> Result<()> {
    let key = scope.as_key();
    conn.execute(
        "INSERT INTO transition_stats (scope, prev_template_id, next_template_id, weight, count, last_seen_ms)
         VALUES (?1, ?2, ?3, 1.0, 1, ?4)
         ON CONFLICT(scope, prev_template_id, next_template_id) DO UPDATE SET
             weight = weight + 1.0, count = count + 1, last_seen_ms = ?4",
        params![key, prev_template_id, next_template_id, now_ms],
    )?;
    Ok(())
}

pub fn transitions_from(
    conn: &Connection,
    scope: &Scope,
    prev_template_id: &str,
) -> Result<Vec<TransitionStat>> {
    let key = scope.as_key();
    let mut stmt = conn.prepare_cached(
        "SELECT scope, prev_template_id, next_template_id, weight, count, last_seen_ms
         FROM transition_stats WHERE scope = ?1 AND prev_template_id = ?2",
    )?;
    let rows = stmt.query_map(params![key, prev_template_id], |row| {
        let scope_key: String = row.get(0)?;
        Ok(TransitionStat {
            scope: scope_codec::decode(&scope_key),
            prev_template_id: row.get(1)?,
            next_template_id: row.get(2)?,
            weight: row.get(3)?,
            count: row.get(4)?,
            last_seen_ms: row.get(5)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn first_occurrence_sets_score_to_one() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| upsert_frequency(conn, &Scope::Global, "t1", 1_000, 86_400_000, true))
            .unwrap();
        let stat = store.with_conn(|conn| get(conn, &Scope::Global, "t1")).unwrap().unwrap();
        assert_eq!(stat.score, 1.0);
        assert_eq!(stat.success_count, 1);
        assert_eq!(stat.failure_count, 0);
    }

    #[test]
    fn repeated_occurrence_decays_then_adds_one() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| upsert_frequency(conn, &Scope::Global, "t1", 0, 86_400_000, true))
            .unwrap();
        store
            .with_conn(|conn| upsert_frequency(conn, &Scope::Global, "t1", 86_400_000, 86_400_000, false))
            .unwrap();
        let stat = store.with_conn(|conn| get(conn, &Scope::Global, "t1")).unwrap().unwrap();
        let expected = decay(1.0, 0, 86_400_000, 86_400_000) + 1.0;
        assert!((stat.score - expected).abs() < 1e-9);
        assert_eq!(stat.success_count, 1);
        assert_eq!(stat.failure_count, 1);
    }

    #[test]
    fn transition_weight_and_count_accumulate() {
        let store = Store::open_in_memory().unwrap();
        store.with_conn(|conn| upsert_transition(conn, &Scope::Global, "t1", "t2", 100)).unwrap();
        store.with_conn(|conn| upsert_transition(conn, &Scope::Global, "t1", "t2", 200)).unwrap();
        let transitions = store.with_conn(|conn| transitions_from(conn, &Scope::Global, "t1")).unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].weight, 2.0);
        assert_eq!(transitions[0].count, 2);
        assert_eq!(transitions[0].last_seen_ms, 200);
    }
}
