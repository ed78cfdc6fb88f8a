use crate::error::Result;
use nextcmd_core::content_hash;
use nextcmd_normalize::{split_and_normalize, DEFAULT_MAX_SEGMENTS};
use nextcmd_store::Store;
use nextcmd_types::{CommandEvent, ExitClass, PipelineEvent, Scope, ShellKind, Session, Slot};

/// Tunables for the aggregate write path (§6.4 config keys `tau_ms`,
/// `pipeline_max_segments`).
#[derive(Debug, Clone)]
pub struct WriteConfig {
    pub tau_ms: i64,
    pub pipeline_max_segments: usize,
    pub slot_tuple_positions: Vec<Vec<usize>>,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            tau_ms: 7 * 86_400_000,
            pipeline_max_segments: DEFAULT_MAX_SEGMENTS,
            slot_tuple_positions: Vec::new(),
        }
    }
}

/// Everything the write path needs about the session's prior state and
/// the current event's surrounding context, computed by the caller
/// (the orchestrator or the ingestion handler) before the transaction
/// starts (§4.4).
#[derive(Debug, Clone, Default)]
pub struct WriteContext {
    pub prev_template_id: Option<String>,
    pub prev_exit_code: Option<i32>,
    pub dir_scope_key: String,
    pub active_project_types: Vec<String>,
}

impl WriteContext {
    /// True when the previous event failed in a way that should count
    /// toward recovery tracking: exit code != 0, but not a signal
    /// cancellation the user initiated themselves (§4.4 step 8).
    fn prev_failed(&self) -> bool {
        self.prev_exit_code
            .map(|code| code != 0 && !matches!(ExitClass::from_exit_code(code), ExitClass::Sigint | ExitClass::Sigkill))
            .unwrap_or(false)
    }
}

fn scopes_for(repo_key: Option<&str>, dir_scope_key: &str) -> Vec<Scope> {
    let mut scopes = vec![Scope::Global, Scope::dir(dir_scope_key)];
    if let Some(repo_key) = repo_key {
        scopes.push(Scope::Repo(repo_key.to_string()));
    }
    scopes
}

/// Run all nine steps of the aggregate write path in a single
/// transaction (§4.4). Returns the new event's row id. A failure at any
/// step rolls back the whole transaction; the event is counted lost
/// (§4.11), never partially applied.
pub fn write_event(
    store: &Store,
    raw_command: &str,
    normalizer: &nextcmd_normalize::Normalizer,
    mut event: CommandEvent,
    slots: &[Slot],
    ctx: &WriteContext,
    config: &WriteConfig,
    now_ms: i64,
) -> Result<i64> {
    let pipeline_segments = split_and_normalize(raw_command, normalizer, config.pipeline_max_segments);
    let succeeded = !event.failed();
    let scopes = scopes_for(event.repo_key.as_deref(), &ctx.dir_scope_key);

    let event_id = store.with_tx(|tx| {
        // Step 0: the event row's session FK must resolve. Normally the
        // session was already created by a `command_start` (§3 Session:
        // "created on first event"); a minimal placeholder row covers
        // the case where this is genuinely the first event seen for it.
        // A no-op when the session already exists.
        nextcmd_store::sessions::ensure_exists(
            tx,
            &Session::new(event.session_id.clone(), ShellKind::Other, event.completed_ts_ms),
        )?;

        // Step 1: insert the event row.
        let id = nextcmd_store::events::insert(tx, &event)?;
        event.id = Some(id);

        // Step 2: upsert the template.
        nextcmd_store::templates::upsert(
            tx,
            &event.template_id,
            &event.normalized_text,
            slots.len(),
            now_ms,
        )?;

        // Step 3: upsert CommandStat for every applicable scope.
        for scope in &scopes {
            nextcmd_store::stats::upsert_frequency(
                tx,
                scope,
                &event.template_id,
                now_ms,
                config.tau_ms,
                succeeded,
            )?;
        }

        // Step 4: if a previous template exists in this session, bump transitions.
        if let Some(prev_template_id) = &ctx.prev_template_id {
            for scope in &scopes {
                nextcmd_store::stats::upsert_transition(
                    tx,
                    scope,
                    prev_template_id,
                    &event.template_id,
                    now_ms,
                )?;
            }
        }

        // Step 5: slot stats and configured tuple correlations.
        for slot in slots {
            nextcmd_store::slots::upsert_slot(tx, &event.template_id, slot, now_ms)?;
        }
        for positions in &config.slot_tuple_positions {
            let values: Vec<String> = positions
                .iter()
                .filter_map(|pos| slots.iter().find(|s| &s.position == pos))
                .map(|s| s.raw_value.clone())
                .collect();
            if values.len() == positions.len() {
                let tuple_hash = content_hash(&values.join("\u{0}"));
                nextcmd_store::slots::upsert_correlation(
                    tx,
                    &event.template_id,
                    positions,
                    &tuple_hash,
                    &values,
                    now_ms,
                )?;
            }
        }

        // Step 6: project-type stats and transitions for every active project type.
        for project_type in &ctx.active_project_types {
            for scope in &scopes {
                nextcmd_store::project_types::upsert_stat(tx, scope, project_type, now_ms, config.tau_ms)?;
                if let Some(prev_template_id) = &ctx.prev_template_id {
                    nextcmd_store::project_types::upsert_transition(
                        tx,
                        scope,
                        project_type,
                        prev_template_id,
                        &event.template_id,
                        now_ms,
                    )?;
                }
            }
        }

        // Step 7: pipeline segments, adjacent transitions, whole-chain pattern.
        if !pipeline_segments.is_empty() {
            let mut template_chain = Vec::with_capacity(pipeline_segments.len());
            let mut operator_chain = Vec::with_capacity(pipeline_segments.len());
            let mut prev_segment_template: Option<&str> = None;

            for segment in &pipeline_segments {
                nextcmd_store::pipeline::insert_event(
                    tx,
                    &PipelineEvent {
                        parent_event_id: id,
                        position: segment.position,
                        boundary_before: segment.boundary_before,
                        raw_segment: segment.raw.clone(),
                        normalized_text: segment.normalized_text.clone(),
                        template_id: segment.template_id.clone(),
                    },
                )?;

                if let (Some(prev_id), Some(op)) = (prev_segment_template, segment.boundary_before) {
                    for scope in &scopes {
                        nextcmd_store::pipeline::upsert_transition(
                            tx,
                            scope,
                            prev_id,
                            &segment.template_id,
                            op,
                            now_ms,
                        )?;
                    }
                    operator_chain.push(op.as_str());
                }
                template_chain.push(segment.template_id.as_str());
                prev_segment_template = Some(segment.template_id.as_str());
            }

            if template_chain.len() > 1 {
                let pattern_hash = content_hash(&template_chain.join(">"));
                let display = pipeline_segments
                    .iter()
                    .map(|s| s.normalized_text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let chain_str = operator_chain.join(",");
                for scope in &scopes {
                    nextcmd_store::pipeline::upsert_pattern(tx, scope, &pattern_hash, &display, &chain_str, now_ms)?;
                }
            }
        }

        // Step 8: failure recovery, only when the previous event failed
        // and wasn't a signal cancellation the user initiated themselves.
        if ctx.prev_failed() {
            if let (Some(prev_template_id), Some(prev_exit_code)) =
                (&ctx.prev_template_id, ctx.prev_exit_code)
            {
                let exit_class = ExitClass::from_exit_code(prev_exit_code);
                for scope in &scopes {
                    nextcmd_store::recovery::record_outcome(
                        tx,
                        scope,
                        prev_template_id,
                        exit_class,
                        &event.template_id,
                        event.exit_code,
                        now_ms,
                    )?;
                }
            }
        }

        Ok(id)
    })?;

    // Step 9 (cache invalidation) is the cache hierarchy's
    // responsibility, not the store's; the orchestrator invalidates L1
    // for this session and L2 for the repo right after this call
    // returns (§4.4 step 9, §4.6).

    Ok(event_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextcmd_normalize::Normalizer;
    use nextcmd_store::Store;

    fn sample_event(template_id: &str, exit_code: i32) -> CommandEvent {
        CommandEvent {
            id: None,
            session_id: "s1".into(),
            completed_ts_ms: 1_000,
            duration_ms: Some(5),
            exit_code,
            cwd: "/repo".into(),
            normalized_text: "git status".into(),
            template_id: template_id.into(),
            repo_key: Some("r1".into()),
            branch: None,
            repo_name: None,
            repo_root: None,
            ephemeral: false,
        }
    }

    #[test]
    fn write_event_populates_every_applicable_scope() {
        let store = Store::open_in_memory().unwrap();
        let normalizer = Normalizer::default();
        let ctx = WriteContext {
            dir_scope_key: "dirhash".into(),
            ..Default::default()
        };
        let config = WriteConfig::default();

        write_event(&store, "git status", &normalizer, sample_event("t1", 0), &[], &ctx, &config, 1_000).unwrap();

        for scope in [Scope::Global, Scope::dir("dirhash"), Scope::Repo("r1".into())] {
            let stat = store.with_conn(|conn| nextcmd_store::stats::get(conn, &scope, "t1")).unwrap();
            assert!(stat.is_some(), "missing stat for {scope:?}");
        }
    }

    #[test]
    fn write_event_records_transition_from_prior_event() {
        let store = Store::open_in_memory().unwrap();
        let normalizer = Normalizer::default();
        let config = WriteConfig::default();

        let ctx0 = WriteContext { dir_scope_key: "dirhash".into(), ..Default::default() };
        write_event(&store, "git status", &normalizer, sample_event("t1", 0), &[], &ctx0, &config, 1_000).unwrap();

        let ctx1 = WriteContext {
            prev_template_id: Some("t1".into()),
            prev_exit_code: Some(0),
            dir_scope_key: "dirhash".into(),
            active_project_types: Vec::new(),
        };
        write_event(&store, "git add .", &normalizer, sample_event("t2", 0), &[], &ctx1, &config, 2_000).unwrap();

        let transitions = store
            .with_conn(|conn| nextcmd_store::stats::transitions_from(conn, &Scope::Global, "t1"))
            .unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].next_template_id, "t2");
    }

    #[test]
    fn write_event_records_pipeline_segments_for_piped_command() {
        let store = Store::open_in_memory().unwrap();
        let normalizer = Normalizer::default();
        let ctx = WriteContext { dir_scope_key: "dirhash".into(), ..Default::default() };
        let config = WriteConfig::default();

        let event_id = write_event(
            &store,
            "go test ./... | grep FAIL",
            &normalizer,
            sample_event("parent", 0),
            &[],
            &ctx,
            &config,
            1_000,
        )
        .unwrap();

        let segments = store
            .with_conn(|conn| nextcmd_store::pipeline::events_for_parent(conn, event_id))
            .unwrap();
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn write_event_records_failure_recovery_only_after_a_failure() {
        let store = Store::open_in_memory().unwrap();
        let normalizer = Normalizer::default();
        let config = WriteConfig::default();

        let ctx0 = WriteContext { dir_scope_key: "dirhash".into(), ..Default::default() };
        write_event(&store, "git push", &normalizer, sample_event("t1", 1), &[], &ctx0, &config, 1_000).unwrap();

        let ctx1 = WriteContext {
            prev_template_id: Some("t1".into()),
            prev_exit_code: Some(1),
            dir_scope_key: "dirhash".into(),
            active_project_types: Vec::new(),
        };
        write_event(&store, "git pull", &normalizer, sample_event("t2", 0), &[], &ctx1, &config, 2_000).unwrap();

        let recovery = store
            .with_conn(|conn| {
                nextcmd_store::recovery::get(conn, &Scope::Global, "t1", ExitClass::General, "t2")
            })
            .unwrap();
        assert!(recovery.is_some());
    }

    #[test]
    fn write_event_does_not_record_recovery_for_a_user_initiated_cancellation() {
        let store = Store::open_in_memory().unwrap();
        let normalizer = Normalizer::default();
        let config = WriteConfig::default();

        let ctx0 = WriteContext { dir_scope_key: "dirhash".into(), ..Default::default() };
        write_event(&store, "npm run build", &normalizer, sample_event("t1", 130), &[], &ctx0, &config, 1_000).unwrap();

        let ctx1 = WriteContext {
            prev_template_id: Some("t1".into()),
            prev_exit_code: Some(130),
            dir_scope_key: "dirhash".into(),
            active_project_types: Vec::new(),
        };
        write_event(&store, "npm run build", &normalizer, sample_event("t1", 0), &[], &ctx1, &config, 2_000).unwrap();

        let recovery = store
            .with_conn(|conn| nextcmd_store::recovery::get(conn, &Scope::Global, "t1", ExitClass::Sigint, "t1"))
            .unwrap();
        assert!(recovery.is_none(), "a Ctrl-C'd command should not be recorded as a failure needing recovery");
    }
}
