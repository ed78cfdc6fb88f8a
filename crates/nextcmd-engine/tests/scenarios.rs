//! End-to-end scenarios that drive a real event through `write_event`
//! and then rank it with `score`, crossing the engine/store boundary
//! the way the runtime actually does.

use nextcmd_engine::{record_never, score, write_event, ScoreConfig, ScoreRequest, WriteConfig, WriteContext};
use nextcmd_normalize::Normalizer;
use nextcmd_testing::{CommandEventBuilder, Workspace};
use nextcmd_types::{ExitClass, ReasonTag, Scope, Suggestion};

fn write(workspace: &Workspace, normalizer: &Normalizer, template_id: &str, text: &str, ctx: &WriteContext, ts: i64) {
    let event = CommandEventBuilder::new("s1", ts, template_id).normalized_text(text).build();
    write_event(workspace.store(), text, normalizer, event, &[], ctx, &WriteConfig::default(), ts).unwrap();
}

fn has_tag(suggestion: &Suggestion, tag: ReasonTag) -> bool {
    suggestion.reason_tags().any(|t| t == tag)
}

/// S1 — five `git status` and three `git commit` events at the same
/// timestamp; frequency ranking puts the more frequent command first.
#[test]
fn frequency_ranking_orders_by_decayed_count() {
    let workspace = Workspace::new();
    let normalizer = Normalizer::default();
    let ctx = WriteContext { dir_scope_key: "dirhash".into(), ..Default::default() };

    for _ in 0..5 {
        write(&workspace, &normalizer, "git_status", "git status", &ctx, 1_000_000);
    }
    for _ in 0..3 {
        write(&workspace, &normalizer, "git_commit", "git commit", &ctx, 1_000_000);
    }

    let req = ScoreRequest { dir_scope_key: "dirhash".into(), top_k: Some(5), ..Default::default() };
    let suggestions = score(workspace.store(), &normalizer, &req, &ScoreConfig::default(), 1_000_000).unwrap();

    assert_eq!(suggestions[0].command, "git status");
    assert!(has_tag(&suggestions[0], ReasonTag::GlobalFreq));
    assert_eq!(suggestions[1].command, "git commit");
}

/// S2 — `git add .` transitions mostly to `git commit`; the winning
/// transition outranks the minority one.
#[test]
fn transition_winner_outranks_the_minority_transition() {
    let workspace = Workspace::new();
    let normalizer = Normalizer::default();
    let ctx = WriteContext { dir_scope_key: "dirhash".into(), prev_template_id: Some("git_add".into()), ..Default::default() };

    for _ in 0..5 {
        write(&workspace, &normalizer, "git_commit", "git commit", &ctx, 1_000_000);
    }
    for _ in 0..2 {
        write(&workspace, &normalizer, "git_status", "git status", &ctx, 1_000_000);
    }

    let req = ScoreRequest {
        last_template_id: Some("git_add".into()),
        dir_scope_key: "dirhash".into(),
        top_k: Some(5),
        ..Default::default()
    };
    let suggestions = score(workspace.store(), &normalizer, &req, &ScoreConfig::default(), 1_000_000).unwrap();

    assert_eq!(suggestions[0].command, "git commit");
    assert!(has_tag(&suggestions[0], ReasonTag::GlobalTrans));
}

/// S4 — a failing event followed by its fix bumps `FailureRecovery`,
/// which boosts the fix the next time the same command fails.
#[test]
fn recovery_boost_surfaces_the_fix_after_a_repeated_failure() {
    let workspace = Workspace::new();
    let normalizer = Normalizer::default();

    let ctx0 = WriteContext { dir_scope_key: "dirhash".into(), ..Default::default() };
    write(&workspace, &normalizer, "npm_install", "npm install", &ctx0, 1_000);

    let ctx1 = WriteContext {
        prev_template_id: Some("npm_install".into()),
        prev_exit_code: Some(1),
        dir_scope_key: "dirhash".into(),
        active_project_types: Vec::new(),
    };
    write(&workspace, &normalizer, "npm_cache_clean", "npm cache clean --force", &ctx1, 2_000);

    let req = ScoreRequest {
        last_template_id: Some("npm_install".into()),
        last_exit_code: Some(1),
        last_failed: true,
        dir_scope_key: "dirhash".into(),
        top_k: Some(5),
        ..Default::default()
    };
    let suggestions = score(workspace.store(), &normalizer, &req, &ScoreConfig::default(), 3_000).unwrap();

    let recovered = suggestions.iter().find(|s| s.command == "npm cache clean --force").unwrap();
    assert!(has_tag(recovered, ReasonTag::RecoveryBoost));

    let recorded = workspace
        .store()
        .with_conn(|conn| nextcmd_store::recovery::get(conn, &Scope::Global, "npm_install", ExitClass::General, "npm_cache_clean"))
        .unwrap();
    assert!(recorded.is_some());
}

/// S5 — a candidate permanently dismissed scores exactly zero and still
/// carries the dismissal reason, while other candidates are unaffected.
#[test]
fn permanently_dismissed_candidate_scores_zero_but_others_survive() {
    let workspace = Workspace::new();
    let normalizer = Normalizer::default();
    let ctx = WriteContext { dir_scope_key: "dirhash".into(), prev_template_id: Some("prev_cmd".into()), ..Default::default() };

    write(&workspace, &normalizer, "git_status", "git status", &ctx, 1_000);
    write(&workspace, &normalizer, "other_cmd", "ls -la", &ctx, 1_000);

    record_never(workspace.store(), &Scope::Global, "prev_cmd", "git_status", 1_500).unwrap();

    let req = ScoreRequest {
        last_template_id: Some("prev_cmd".into()),
        dir_scope_key: "dirhash".into(),
        top_k: Some(5),
        ..Default::default()
    };
    let suggestions = score(workspace.store(), &normalizer, &req, &ScoreConfig::default(), 2_000).unwrap();

    let dismissed = suggestions.iter().find(|s| s.command == "git status").unwrap();
    assert_eq!(dismissed.score, 0.0);
    assert!(has_tag(dismissed, ReasonTag::DismissalPenalty));

    let other = suggestions.iter().find(|s| s.command == "ls -la").unwrap();
    assert!(other.score > 0.0);
}
