use crate::Result;
use nextcmd_core::short_hash;
use nextcmd_store::Store;
use nextcmd_types::{ExitClass, Scope};
use std::collections::HashMap;

/// Outcome of a `Purge` run (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub events_deleted: usize,
    pub vacuumed: bool,
}

/// Delete raw events older than `retention_days`, then opportunistically
/// `VACUUM` if the delete crossed `VACUUM_THRESHOLD` and `auto_vacuum`
/// is enabled (§4.7).
pub fn purge(store: &Store, now_ms: i64, retention_days: u32, auto_vacuum: bool) -> Result<PurgeReport> {
    let horizon_ms = now_ms - i64::from(retention_days) * 86_400_000;
    let events_deleted = store.with_conn(|conn| nextcmd_store::events::delete_older_than(conn, horizon_ms))?;

    let vacuumed = if auto_vacuum && events_deleted as u64 >= crate::config::VACUUM_THRESHOLD {
        store.with_conn(nextcmd_store::maintenance::vacuum)?;
        true
    } else {
        false
    };

    Ok(PurgeReport { events_deleted, vacuumed })
}

/// Outcome of a `RebuildAggregates` run (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildReport {
    pub events_replayed: usize,
}

/// Recompute `command_stats`, `transition_stats`, and `failure_recovery`
/// from the retained raw events, replayed chronologically (§4.7).
///
/// Scope is limited to what `CommandEvent` itself records. Slot stats,
/// pipeline stats, and project-type stats are derived at write time from
/// data that is never persisted on the event row (parsed slots, pipeline
/// segments, active project types) and so cannot be replayed from
/// history alone; a rebuild leaves them as-is.
pub fn rebuild_aggregates(store: &Store, tau_ms: i64) -> Result<RebuildReport> {
    let events = store.with_conn(nextcmd_store::events::all_chronological)?;
    let mut events_replayed = 0usize;

    store.with_tx(|tx| {
        nextcmd_store::maintenance::reset_for_rebuild(tx)?;

        let mut last_per_session: HashMap<String, (String, i32)> = HashMap::new();

        for event in &events {
            if event.ephemeral {
                continue;
            }
            let dir_scope_key = short_hash(&event.cwd);
            let mut scopes = vec![Scope::Global, Scope::dir(dir_scope_key.as_str())];
            if let Some(repo_key) = &event.repo_key {
                scopes.push(Scope::Repo(repo_key.clone()));
            }

            let succeeded = event.exit_code == 0;
            for scope in &scopes {
                nextcmd_store::stats::upsert_frequency(
                    tx,
                    scope,
                    &event.template_id,
                    event.completed_ts_ms,
                    tau_ms,
                    succeeded,
                )?;
            }

            if let Some((prev_template_id, prev_exit_code)) = last_per_session.get(&event.session_id) {
                for scope in &scopes {
                    nextcmd_store::stats::upsert_transition(
                        tx,
                        scope,
                        prev_template_id,
                        &event.template_id,
                        event.completed_ts_ms,
                    )?;
                }
                if *prev_exit_code != 0 {
                    let exit_class = ExitClass::from_exit_code(*prev_exit_code);
                    for scope in &scopes {
                        nextcmd_store::recovery::record_outcome(
                            tx,
                            scope,
                            prev_template_id,
                            exit_class,
                            &event.template_id,
                            event.exit_code,
                            event.completed_ts_ms,
                        )?;
                    }
                }
            }

            last_per_session.insert(event.session_id.clone(), (event.template_id.clone(), event.exit_code));
            events_replayed += 1;
        }

        Ok(())
    })?;

    Ok(RebuildReport { events_replayed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextcmd_types::{CommandEvent, Scope, Session, ShellKind};

    fn sample_event(session_id: &str, ts: i64, template_id: &str, exit_code: i32) -> CommandEvent {
        CommandEvent {
            id: None,
            session_id: session_id.into(),
            completed_ts_ms: ts,
            duration_ms: Some(5),
            exit_code,
            cwd: "/repo".into(),
            normalized_text: template_id.into(),
            template_id: template_id.into(),
            repo_key: Some("r1".into()),
            branch: None,
            repo_name: None,
            repo_root: None,
            ephemeral: false,
        }
    }

    /// Satisfy the `command_events` foreign keys for a session and the
    /// `t1`/`t2` templates these tests reuse throughout.
    fn seed_parents(store: &Store, session_id: &str) {
        store
            .with_conn(|conn| nextcmd_store::sessions::ensure_exists(conn, &Session::new(session_id, ShellKind::Other, 0)))
            .unwrap();
        store.with_conn(|conn| nextcmd_store::templates::upsert(conn, "t1", "t1", 0, 0)).unwrap();
        store.with_conn(|conn| nextcmd_store::templates::upsert(conn, "t2", "t2", 0, 0)).unwrap();
    }

    #[test]
    fn purge_deletes_events_older_than_horizon() {
        let store = Store::open_in_memory().unwrap();
        seed_parents(&store, "s1");
        store.with_conn(|conn| nextcmd_store::events::insert(conn, &sample_event("s1", 0, "t1", 0))).unwrap();
        store.with_conn(|conn| nextcmd_store::events::insert(conn, &sample_event("s1", 200 * 86_400_000, "t2", 0))).unwrap();

        let report = purge(&store, 200 * 86_400_000, 90, false).unwrap();
        assert_eq!(report.events_deleted, 1);
        assert!(!report.vacuumed);
    }

    #[test]
    fn rebuild_recomputes_frequency_and_transitions_from_events() {
        let store = Store::open_in_memory().unwrap();
        seed_parents(&store, "s1");
        store.with_conn(|conn| nextcmd_store::events::insert(conn, &sample_event("s1", 1_000, "t1", 0))).unwrap();
        store.with_conn(|conn| nextcmd_store::events::insert(conn, &sample_event("s1", 2_000, "t2", 0))).unwrap();

        let report = rebuild_aggregates(&store, 7 * 86_400_000).unwrap();
        assert_eq!(report.events_replayed, 2);

        let stat = store.with_conn(|conn| nextcmd_store::stats::get(conn, &Scope::Global, "t1")).unwrap();
        assert!(stat.is_some());
        let transitions = store
            .with_conn(|conn| nextcmd_store::stats::transitions_from(conn, &Scope::Global, "t1"))
            .unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].next_template_id, "t2");
    }

    #[test]
    fn rebuild_records_recovery_only_after_a_failure() {
        let store = Store::open_in_memory().unwrap();
        seed_parents(&store, "s1");
        store.with_conn(|conn| nextcmd_store::events::insert(conn, &sample_event("s1", 1_000, "t1", 1))).unwrap();
        store.with_conn(|conn| nextcmd_store::events::insert(conn, &sample_event("s1", 2_000, "t2", 0))).unwrap();

        rebuild_aggregates(&store, 7 * 86_400_000).unwrap();

        let recovery = store
            .with_conn(|conn| nextcmd_store::recovery::get(conn, &Scope::Global, "t1", ExitClass::General, "t2"))
            .unwrap();
        assert!(recovery.is_some());
    }
}
