use crate::error::{Error, Result};
use nextcmd_types::{Suggestion, SuggestionCacheEntry};
use rusqlite::{params, Connection, OptionalExtension};

/// L3 set (§4.6): replace-semantics, not append. This is meant to be
/// called fire-and-forget from the cache hierarchy; a failure here is
/// non-fatal to the caller (§4.11).
pub fn set(conn: &Connection, entry: &SuggestionCacheEntry) -> Result<()> {
    let suggestions_json = serde_json::to_string(&entry.suggestions)
        .map_err(|e| Error::Query(format!("failed to encode suggestions: {e}")))?;
    conn.execute(
        "INSERT INTO suggestion_cache (session_id, context_hash, suggestions_json, created_ms, ttl_ms, hit_count)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)
         ON CONFLICT(session_id, context_hash) DO UPDATE SET
             suggestions_json = ?3, created_ms = ?4, ttl_ms = ?5, hit_count = 0",
        params![entry.session_id, entry.context_hash, suggestions_json, entry.created_ms, entry.ttl_ms],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, session_id: &str, context_hash: &str) -> Result<Option<SuggestionCacheEntry>> {
    let row = conn
        .query_row(
            "SELECT session_id, context_hash, suggestions_json, created_ms, ttl_ms, hit_count
             FROM suggestion_cache WHERE session_id = ?1 AND context_hash = ?2",
            params![session_id, context_hash],
            |row| {
                let suggestions_json: String = row.get(2)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    suggestions_json,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((session_id, context_hash, suggestions_json, created_ms, ttl_ms, hit_count)) = row else {
        return Ok(None);
    };
    let suggestions: Vec<Suggestion> = serde_json::from_str(&suggestions_json)
        .map_err(|e| Error::Query(format!("failed to decode suggestions: {e}")))?;
    Ok(Some(SuggestionCacheEntry {
        session_id,
        context_hash,
        suggestions,
        created_ms,
        ttl_ms,
        hit_count,
    }))
}

pub fn record_hit(conn: &Connection, session_id: &str, context_hash: &str) -> Result<()> {
    conn.execute(
        "UPDATE suggestion_cache SET hit_count = hit_count + 1 WHERE session_id = ?1 AND context_hash = ?2",
        params![session_id, context_hash],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use nextcmd_types::{Reason, ReasonTag, Risk};

    fn sample_entry() -> SuggestionCacheEntry {
        SuggestionCacheEntry {
            session_id: "s1".into(),
            context_hash: "ctx1".into(),
            suggestions: vec![Suggestion {
                command: "git status".into(),
                template_id: Some("t1".into()),
                score: 1.5,
                confidence: 0.8,
                risk: Risk::Safe,
                reasons: vec![Reason {
                    tag: ReasonTag::DirFreq,
                    contribution: 1.5,
                }],
            }],
            created_ms: 100,
            ttl_ms: 5_000,
            hit_count: 0,
        }
    }

    #[test]
    fn set_then_get_round_trips_suggestions() {
        let store = Store::open_in_memory().unwrap();
        let entry = sample_entry();
        store.with_conn(|conn| set(conn, &entry)).unwrap();

        let loaded = store.with_conn(|conn| get(conn, "s1", "ctx1")).unwrap().unwrap();
        assert_eq!(loaded.suggestions.len(), 1);
        assert_eq!(loaded.suggestions[0].command, "git status");
    }

    #[test]
    fn set_replaces_rather_than_duplicates() {
        let store = Store::open_in_memory().unwrap();
        store.with_conn(|conn| set(conn, &sample_entry())).unwrap();
        let mut updated = sample_entry();
        updated.created_ms = 999;
        store.with_conn(|conn| set(conn, &updated)).unwrap();

        let count = store
            .with_conn(|conn| Ok(conn.query_row("SELECT count(*) FROM suggestion_cache", [], |r| r.get::<_, i64>(0))?))
            .unwrap();
        assert_eq!(count, 1);
        let loaded = store.with_conn(|conn| get(conn, "s1", "ctx1")).unwrap().unwrap();
        assert_eq!(loaded.created_ms, 999);
    }
}
