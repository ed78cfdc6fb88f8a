/// Initial schema: every table named in the data model (§3). All
/// tables are created together as migration 1; later migrations only
/// ever add columns, tables, or indexes (§4.3 forward-only, additive).
pub const MIGRATION_1: &str = r#"
CREATE TABLE sessions (
    id TEXT PRIMARY KEY,
    shell TEXT NOT NULL,
    start_ts INTEGER NOT NULL,
    end_ts INTEGER,
    host TEXT,
    user TEXT,
    os TEXT
);

CREATE TABLE command_templates (
    id TEXT PRIMARY KEY,
    normalized_text TEXT NOT NULL,
    slot_count INTEGER NOT NULL,
    first_seen_ms INTEGER NOT NULL,
    last_seen_ms INTEGER NOT NULL
);

CREATE TABLE command_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    completed_ts_ms INTEGER NOT NULL,
    duration_ms INTEGER,
    exit_code INTEGER NOT NULL,
    cwd TEXT NOT NULL,
    normalized_text TEXT NOT NULL,
    template_id TEXT NOT NULL,
    repo_key TEXT,
    branch TEXT,
    repo_name TEXT,
    repo_root TEXT,
    ephemeral INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (session_id) REFERENCES sessions(id),
    FOREIGN KEY (template_id) REFERENCES command_templates(id) DEFERRABLE INITIALLY DEFERRED
);
CREATE INDEX idx_command_events_session ON command_events(session_id, completed_ts_ms);
CREATE INDEX idx_command_events_ts ON command_events(completed_ts_ms);

CREATE TABLE command_stats (
    scope TEXT NOT NULL,
    template_id TEXT NOT NULL,
    score REAL NOT NULL,
    success_count INTEGER NOT NULL DEFAULT 0,
    failure_count INTEGER NOT NULL DEFAULT 0,
    last_seen_ms INTEGER NOT NULL,
    PRIMARY KEY (scope, template_id)
);

CREATE TABLE transition_stats (
    scope TEXT NOT NULL,
    prev_template_id TEXT NOT NULL,
    next_template_id TEXT NOT NULL,
    weight REAL NOT NULL,
    count INTEGER NOT NULL,
    last_seen_ms INTEGER NOT NULL,
    PRIMARY KEY (scope, prev_template_id, next_template_id)
);

CREATE TABLE slot_stats (
    template_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    tag TEXT NOT NULL,
    value TEXT NOT NULL,
    count INTEGER NOT NULL,
    last_seen_ms INTEGER NOT NULL,
    PRIMARY KEY (template_id, position, value)
);

CREATE TABLE slot_correlations (
    template_id TEXT NOT NULL,
    tuple_hash TEXT NOT NULL,
    positions TEXT NOT NULL,
    values_json TEXT NOT NULL,
    count INTEGER NOT NULL,
    last_seen_ms INTEGER NOT NULL,
    PRIMARY KEY (template_id, tuple_hash)
);

CREATE TABLE project_type_stats (
    scope TEXT NOT NULL,
    project_type TEXT NOT NULL,
    score REAL NOT NULL,
    last_seen_ms INTEGER NOT NULL,
    PRIMARY KEY (scope, project_type)
);

CREATE TABLE project_type_transitions (
    scope TEXT NOT NULL,
    project_type TEXT NOT NULL,
    prev_template_id TEXT NOT NULL,
    next_template_id TEXT NOT NULL,
    weight REAL NOT NULL,
    last_seen_ms INTEGER NOT NULL,
    PRIMARY KEY (scope, project_type, prev_template_id, next_template_id)
);

CREATE TABLE pipeline_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_event_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    boundary_before TEXT,
    raw_segment TEXT NOT NULL,
    normalized_text TEXT NOT NULL,
    template_id TEXT NOT NULL,
    FOREIGN KEY (parent_event_id) REFERENCES command_events(id)
);
CREATE INDEX idx_pipeline_events_parent ON pipeline_events(parent_event_id);

CREATE TABLE pipeline_transitions (
    scope TEXT NOT NULL,
    prev_template_id TEXT NOT NULL,
    next_template_id TEXT NOT NULL,
    operator TEXT NOT NULL,
    weight REAL NOT NULL,
    count INTEGER NOT NULL,
    last_seen_ms INTEGER NOT NULL,
    PRIMARY KEY (scope, prev_template_id, next_template_id, operator)
);

CREATE TABLE pipeline_patterns (
    scope TEXT NOT NULL,
    pattern_hash TEXT NOT NULL,
    display TEXT NOT NULL,
    operator_chain TEXT NOT NULL,
    count INTEGER NOT NULL,
    last_seen_ms INTEGER NOT NULL,
    PRIMARY KEY (scope, pattern_hash)
);

CREATE TABLE failure_recovery (
    scope TEXT NOT NULL,
    failed_template_id TEXT NOT NULL,
    exit_class TEXT NOT NULL,
    recovery_template_id TEXT NOT NULL,
    weight REAL NOT NULL,
    count INTEGER NOT NULL,
    success_rate REAL NOT NULL,
    source TEXT NOT NULL,
    last_seen_ms INTEGER NOT NULL,
    PRIMARY KEY (scope, failed_template_id, exit_class, recovery_template_id)
);

CREATE TABLE dismissal_patterns (
    scope TEXT NOT NULL,
    context_template_id TEXT NOT NULL,
    dismissed_template_id TEXT NOT NULL,
    dismissal_count INTEGER NOT NULL,
    last_dismissal_ms INTEGER NOT NULL,
    level TEXT NOT NULL,
    PRIMARY KEY (scope, context_template_id, dismissed_template_id)
);

CREATE TABLE project_tasks (
    repo_key TEXT NOT NULL,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    command TEXT NOT NULL,
    description TEXT,
    discovered_ms INTEGER NOT NULL,
    PRIMARY KEY (repo_key, kind, name)
);

CREATE TABLE suggestion_cache (
    session_id TEXT NOT NULL,
    context_hash TEXT NOT NULL,
    suggestions_json TEXT NOT NULL,
    created_ms INTEGER NOT NULL,
    ttl_ms INTEGER NOT NULL,
    hit_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (session_id, context_hash)
);
"#;
