//! Foreign key enforcement across the public write APIs: an event row
//! can't reference a session or template that doesn't exist, and the
//! `command_templates` reference is deferrable, so the insert-then-upsert
//! order `write_event` uses within one transaction is legal.

use nextcmd_store::{Error, Store};
use nextcmd_types::{CommandEvent, PipelineEvent, Session, ShellKind};

fn sample_event(session_id: &str, template_id: &str) -> CommandEvent {
    CommandEvent {
        id: None,
        session_id: session_id.into(),
        completed_ts_ms: 1_000,
        duration_ms: Some(5),
        exit_code: 0,
        cwd: "/repo".into(),
        normalized_text: "git status".into(),
        template_id: template_id.into(),
        repo_key: None,
        branch: None,
        repo_name: None,
        repo_root: None,
        ephemeral: false,
    }
}

#[test]
fn inserting_an_event_for_an_unknown_session_is_rejected() {
    let store = Store::open_in_memory().unwrap();
    store.with_conn(|conn| nextcmd_store::templates::upsert(conn, "t1", "git status", 0, 1_000)).unwrap();

    let err = store.with_conn(|conn| nextcmd_store::events::insert(conn, &sample_event("ghost-session", "t1"))).unwrap_err();
    assert!(matches!(err, Error::Database(_)));
}

#[test]
fn inserting_an_event_with_session_and_template_seeded_succeeds() {
    let store = Store::open_in_memory().unwrap();
    store.with_conn(|conn| nextcmd_store::sessions::ensure_exists(conn, &Session::new("s1", ShellKind::Bash, 1_000))).unwrap();
    store.with_conn(|conn| nextcmd_store::templates::upsert(conn, "t1", "git status", 0, 1_000)).unwrap();

    let id = store.with_conn(|conn| nextcmd_store::events::insert(conn, &sample_event("s1", "t1"))).unwrap();
    assert!(id > 0);
}

/// The `command_events.template_id` reference is deferred until commit,
/// matching `write_event`'s own order: insert the event row (step 1) before
/// upserting its template (step 2), both inside one transaction.
#[test]
fn template_reference_is_deferred_until_the_enclosing_transaction_commits() {
    let store = Store::open_in_memory().unwrap();
    store.with_conn(|conn| nextcmd_store::sessions::ensure_exists(conn, &Session::new("s1", ShellKind::Bash, 1_000))).unwrap();

    let result = store.with_tx(|tx| {
        let id = nextcmd_store::events::insert(tx, &sample_event("s1", "not-yet-created"))?;
        nextcmd_store::templates::upsert(tx, "not-yet-created", "git status", 0, 1_000)?;
        Ok(id)
    });
    assert!(result.is_ok());
}

#[test]
fn a_pipeline_segment_cannot_reference_a_nonexistent_parent_event() {
    let store = Store::open_in_memory().unwrap();

    let err = store
        .with_conn(|conn| {
            nextcmd_store::pipeline::insert_event(
                conn,
                &PipelineEvent {
                    parent_event_id: 999,
                    position: 0,
                    boundary_before: None,
                    raw_segment: "go test ./...".into(),
                    normalized_text: "go test <path>".into(),
                    template_id: "seg0".into(),
                },
            )
        })
        .unwrap_err();
    assert!(matches!(err, Error::Database(_)));
}
