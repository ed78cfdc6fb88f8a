use crate::error::Result;
use nextcmd_normalize::Normalizer;
use nextcmd_store::Store;
use nextcmd_types::{Reason, ReasonTag, Risk, Scope, Suggestion};
use rusqlite::Connection;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Tunable weights and thresholds for the scorer (§4.5, §6.4
/// `scorer.*`/`amplifier.*` config keys).
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    pub tau_ms: i64,
    pub weight_repo_trans: f64,
    pub weight_dir_trans: f64,
    pub weight_global_trans: f64,
    pub weight_dir_freq: f64,
    pub weight_repo_freq: f64,
    pub weight_global_freq: f64,
    pub weight_project_task: f64,
    pub dangerous_penalty: f64,
    pub workflow_boost_factor: f64,
    pub pipeline_confidence_weight: f64,
    pub recovery_boost_factor: f64,
    pub dismissal_penalty_factor: f64,
    pub default_top_k: usize,
    pub frequency_candidate_limit: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            tau_ms: 7 * 86_400_000,
            weight_repo_trans: 80.0,
            weight_dir_trans: 90.0,
            weight_global_trans: 60.0,
            weight_dir_freq: 40.0,
            weight_repo_freq: 30.0,
            weight_global_freq: 30.0,
            weight_project_task: 20.0,
            dangerous_penalty: -50.0,
            workflow_boost_factor: 1.5,
            pipeline_confidence_weight: 50.0,
            recovery_boost_factor: 2.0,
            dismissal_penalty_factor: 0.3,
            default_top_k: 3,
            frequency_candidate_limit: 25,
        }
    }
}

/// Everything the scorer needs about the request and the surrounding
/// context (§4.5 contract). `workflow_next_template`, if set, is
/// published by the (out of scope) workflow engine: "the last template
/// id is a known step, and this is its next step".
#[derive(Debug, Clone, Default)]
pub struct ScoreRequest {
    pub last_template_id: Option<String>,
    pub last_exit_code: Option<i32>,
    pub last_failed: bool,
    pub repo_key: Option<String>,
    pub dir_scope_key: String,
    pub prefix: Option<String>,
    pub workflow_next_template: Option<String>,
    pub top_k: Option<usize>,
}

struct Candidate {
    template_id: String,
    normalized_text: String,
    score: f64,
    reasons: Vec<Reason>,
}

impl Candidate {
    fn bump(&mut self, tag: ReasonTag, contribution: f64) {
        self.score += contribution;
        self.reasons.push(Reason { tag, contribution });
    }

    fn positive_source_count(&self) -> usize {
        self.reasons
            .iter()
            .filter(|r| r.contribution > 0.0)
            .map(|r| r.tag)
            .collect::<HashSet<_>>()
            .len()
    }

    fn is_dangerous(&self) -> bool {
        self.reasons.iter().any(|r| r.tag == ReasonTag::Dangerous)
    }
}

/// Rank suggestions for one request (§4.5). Read-only: never mutates
/// the store. All reads share one connection acquisition so the whole
/// pass sees a single consistent snapshot.
pub fn score(
    store: &Store,
    normalizer: &Normalizer,
    req: &ScoreRequest,
    config: &ScoreConfig,
    now_ms: i64,
) -> Result<Vec<Suggestion>> {
    let top_k = req.top_k.unwrap_or(config.default_top_k).clamp(1, 10);
    let mut candidates: HashMap<String, Candidate> = HashMap::new();
    let mut text_cache: HashMap<String, String> = HashMap::new();

    store.with_conn(|conn| {
        collect_transitions(conn, req, config, now_ms, &mut candidates, &mut text_cache);
        collect_frequencies(conn, req, config, now_ms, &mut candidates, &mut text_cache);
        collect_project_tasks(conn, normalizer, req, config, &mut candidates);
        apply_dangerous_penalty(conn, config, &mut candidates);
        apply_workflow_boost(req, config, &mut candidates);
        apply_pipeline_confidence(conn, req, config, now_ms, &mut candidates);
        apply_recovery_boost(conn, req, config, &mut candidates);
        apply_dismissal_penalty(conn, req, config, &mut candidates);
        Ok(())
    })?;

    let mut list: Vec<Candidate> = candidates.into_values().collect();

    if let Some(prefix) = req.prefix.as_deref().filter(|p| !p.is_empty()) {
        let prefix = prefix.to_lowercase();
        list.retain(|c| matches_prefix(&c.normalized_text.to_lowercase(), &prefix));
    }

    list.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                confidence_of(b)
                    .partial_cmp(&confidence_of(a))
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.normalized_text.cmp(&b.normalized_text))
            .then_with(|| a.template_id.cmp(&b.template_id))
    });
    list.truncate(top_k);

    Ok(list
        .into_iter()
        .map(|c| {
            let confidence = confidence_of(&c);
            let risk = if c.is_dangerous() {
                Risk::Destructive
            } else {
                Risk::Safe
            };
            Suggestion {
                command: c.normalized_text,
                template_id: Some(c.template_id),
                score: c.score,
                confidence,
                risk,
                reasons: c.reasons,
            }
        })
        .collect())
}

/// Sigmoid of the raw score averaged with the fraction of distinct
/// positive-contribution sources, bounded to [0, 1] (§4.5: "derived
/// from distinct contributing sources and a sigmoid of the combined
/// score"; the exact blend is an implementation choice, recorded in
/// the design notes).
fn confidence_of(c: &Candidate) -> f64 {
    const KNOWN_SOURCES: f64 = 7.0; // six base sources + project_task
    let source_ratio = (c.positive_source_count() as f64 / KNOWN_SOURCES).min(1.0);
    let sigmoid = 1.0 / (1.0 + (-c.score).exp());
    (0.5 * source_ratio + 0.5 * sigmoid).clamp(0.0, 1.0)
}

/// Resolve a template's display text, falling back to the template id
/// itself on any store error (§4.11: individual aggregate query
/// failures are logged and treated as no contribution, never abort the
/// whole request).
fn normalized_text_for(conn: &Connection, cache: &mut HashMap<String, String>, template_id: &str) -> String {
    if let Some(text) = cache.get(template_id) {
        return text.clone();
    }
    let text = match nextcmd_store::templates::get(conn, template_id) {
        Ok(Some(template)) => template.normalized_text,
        Ok(None) => template_id.to_string(),
        Err(err) => {
            tracing::warn!(template_id, error = %err, "template lookup failed during scoring");
            template_id.to_string()
        }
    };
    cache.insert(template_id.to_string(), text.clone());
    text
}

fn candidate_mut<'a>(
    candidates: &'a mut HashMap<String, Candidate>,
    template_id: &str,
    normalized_text: &str,
) -> &'a mut Candidate {
    candidates
        .entry(template_id.to_string())
        .or_insert_with(|| Candidate {
            template_id: template_id.to_string(),
            normalized_text: normalized_text.to_string(),
            score: 0.0,
            reasons: Vec::new(),
        })
}

fn collect_transitions(
    conn: &Connection,
    req: &ScoreRequest,
    config: &ScoreConfig,
    now_ms: i64,
    candidates: &mut HashMap<String, Candidate>,
    text_cache: &mut HashMap<String, String>,
) {
    let Some(last_template_id) = req.last_template_id.as_deref() else {
        return;
    };

    let mut sources: Vec<(Scope, f64, ReasonTag)> = vec![
        (Scope::dir(req.dir_scope_key.clone()), config.weight_dir_trans, ReasonTag::DirTrans),
        (Scope::Global, config.weight_global_trans, ReasonTag::GlobalTrans),
    ];
    if let Some(repo_key) = &req.repo_key {
        sources.push((Scope::Repo(repo_key.clone()), config.weight_repo_trans, ReasonTag::RepoTrans));
    }

    for (scope, weight, tag) in sources {
        match nextcmd_store::stats::transitions_from(conn, &scope, last_template_id) {
            Ok(transitions) => {
                for t in transitions {
                    let raw = t.decayed_weight(now_ms, config.tau_ms);
                    let text = normalized_text_for(conn, text_cache, &t.next_template_id);
                    candidate_mut(candidates, &t.next_template_id, &text).bump(tag, (raw + 1.0).ln() * weight);
                }
            }
            Err(err) => tracing::warn!(?tag, %scope, error = %err, "transition query failed; skipping source"),
        }
    }
}

fn collect_frequencies(
    conn: &Connection,
    req: &ScoreRequest,
    config: &ScoreConfig,
    now_ms: i64,
    candidates: &mut HashMap<String, Candidate>,
    text_cache: &mut HashMap<String, String>,
) {
    let mut sources: Vec<(Scope, f64, ReasonTag)> = vec![
        (Scope::dir(req.dir_scope_key.clone()), config.weight_dir_freq, ReasonTag::DirFreq),
        (Scope::Global, config.weight_global_freq, ReasonTag::GlobalFreq),
    ];
    if let Some(repo_key) = &req.repo_key {
        sources.push((Scope::Repo(repo_key.clone()), config.weight_repo_freq, ReasonTag::RepoFreq));
    }

    for (scope, weight, tag) in sources {
        match nextcmd_store::stats::top_for_scope(conn, &scope, config.frequency_candidate_limit) {
            Ok(stats) => {
                for s in stats {
                    let raw = s.decayed_score(now_ms, config.tau_ms);
                    let text = normalized_text_for(conn, text_cache, &s.template_id);
                    candidate_mut(candidates, &s.template_id, &text).bump(tag, (raw + 1.0).ln() * weight);
                }
            }
            Err(err) => tracing::warn!(?tag, %scope, error = %err, "frequency query failed; skipping source"),
        }
    }
}

fn collect_project_tasks(
    conn: &Connection,
    normalizer: &Normalizer,
    req: &ScoreRequest,
    config: &ScoreConfig,
    candidates: &mut HashMap<String, Candidate>,
) {
    let Some(repo_key) = &req.repo_key else {
        return;
    };
    let tasks = match nextcmd_store::tasks::for_repo(conn, repo_key) {
        Ok(tasks) => tasks,
        Err(err) => {
            tracing::warn!(repo_key, error = %err, "project task query failed; skipping source");
            return;
        }
    };
    for task in tasks {
        let Ok(normalized) = normalizer.normalize(&task.command) else {
            continue;
        };
        candidate_mut(candidates, &normalized.template_id, &normalized.normalized_text)
            .bump(ReasonTag::ProjectTask, (1.0_f64 + 1.0).ln() * config.weight_project_task);
    }
}

/// Dangerous literals survive normalization only in `slot_stats` (the
/// normalized text itself replaces them with a placeholder), so the
/// penalty is judged against each candidate's most common slot-filled
/// rendering rather than its normalized text (§4.4 step 5 comment:
/// slot raw values are "kept for slot-fill suggestions").
fn apply_dangerous_penalty(conn: &Connection, config: &ScoreConfig, candidates: &mut HashMap<String, Candidate>) {
    let ids: Vec<String> = candidates.keys().cloned().collect();
    for id in ids {
        let slot_stats = match nextcmd_store::slots::stats_for(conn, &id) {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!(template_id = %id, error = %err, "slot lookup failed; skipping dangerous check");
                continue;
            }
        };
        let normalized_text = candidates[&id].normalized_text.clone();
        let rendered = crate::dangerous::render_with_top_slots(&normalized_text, &slot_stats);
        if crate::dangerous::is_dangerous(&rendered) {
            candidates
                .get_mut(&id)
                .expect("id came from candidates.keys()")
                .bump(ReasonTag::Dangerous, config.dangerous_penalty);
        }
    }
}

fn apply_workflow_boost(req: &ScoreRequest, config: &ScoreConfig, candidates: &mut HashMap<String, Candidate>) {
    let (Some(_last), Some(next)) = (&req.last_template_id, &req.workflow_next_template) else {
        return;
    };
    if let Some(candidate) = candidates.get_mut(next) {
        let delta = candidate.score * (config.workflow_boost_factor - 1.0);
        candidate.bump(ReasonTag::WorkflowBoost, delta);
    }
}

fn apply_pipeline_confidence(
    conn: &Connection,
    req: &ScoreRequest,
    config: &ScoreConfig,
    now_ms: i64,
    candidates: &mut HashMap<String, Candidate>,
) {
    let Some(last_template_id) = req.last_template_id.as_deref() else {
        return;
    };
    let mut scopes = vec![Scope::dir(req.dir_scope_key.clone()), Scope::Global];
    if let Some(repo_key) = &req.repo_key {
        scopes.push(Scope::Repo(repo_key.clone()));
    }
    for scope in scopes {
        match nextcmd_store::pipeline::transitions_from(conn, &scope, last_template_id) {
            Ok(transitions) => {
                for t in transitions {
                    if let Some(candidate) = candidates.get_mut(&t.next_template_id) {
                        let learned_weight = t.decayed_weight(now_ms, config.tau_ms);
                        candidate.bump(ReasonTag::PipelineConf, config.pipeline_confidence_weight * learned_weight);
                    }
                }
            }
            Err(err) => tracing::warn!(%scope, error = %err, "pipeline transition query failed; skipping amplifier"),
        }
    }
}

fn apply_recovery_boost(
    conn: &Connection,
    req: &ScoreRequest,
    config: &ScoreConfig,
    candidates: &mut HashMap<String, Candidate>,
) {
    if !req.last_failed {
        return;
    }
    let (Some(last_template_id), Some(last_exit_code)) = (&req.last_template_id, req.last_exit_code) else {
        return;
    };
    let exit_class = nextcmd_types::ExitClass::from_exit_code(last_exit_code);

    let mut scopes = vec![Scope::dir(req.dir_scope_key.clone()), Scope::Global];
    if let Some(repo_key) = &req.repo_key {
        scopes.push(Scope::Repo(repo_key.clone()));
    }
    for scope in scopes {
        match nextcmd_store::recovery::candidates_for_failure(conn, &scope, last_template_id, exit_class) {
            Ok(recoveries) => {
                for recovery in recoveries {
                    if let Some(candidate) = candidates.get_mut(&recovery.recovery_template_id) {
                        let delta = candidate.score * (config.recovery_boost_factor - 1.0);
                        candidate.bump(ReasonTag::RecoveryBoost, delta);
                    }
                }
            }
            Err(err) => tracing::warn!(%scope, error = %err, "recovery query failed; skipping amplifier"),
        }
    }
}

fn apply_dismissal_penalty(
    conn: &Connection,
    req: &ScoreRequest,
    config: &ScoreConfig,
    candidates: &mut HashMap<String, Candidate>,
) {
    let Some(last_template_id) = req.last_template_id.as_deref() else {
        return;
    };
    let mut scopes = vec![Scope::dir(req.dir_scope_key.clone()), Scope::Global];
    if let Some(repo_key) = &req.repo_key {
        scopes.push(Scope::Repo(repo_key.clone()));
    }
    let ids: Vec<String> = candidates.keys().cloned().collect();
    for scope in scopes {
        for id in &ids {
            match nextcmd_store::dismissal::get(conn, &scope, last_template_id, id) {
                Ok(Some(pattern)) => {
                    let factor = pattern.level.penalty_factor(config.dismissal_penalty_factor);
                    if factor != 1.0 {
                        if let Some(candidate) = candidates.get_mut(id) {
                            let delta = candidate.score * (factor - 1.0);
                            candidate.bump(ReasonTag::DismissalPenalty, delta);
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => tracing::warn!(%scope, error = %err, "dismissal lookup failed; skipping amplifier"),
            }
        }
    }
}

fn matches_prefix(normalized_text: &str, prefix: &str) -> bool {
    if normalized_text.starts_with(prefix) {
        return true;
    }
    if prefix.len() > 5 {
        return false;
    }
    let head: String = normalized_text.chars().take(prefix.len() + 1).collect();
    levenshtein(&head, prefix) <= 1
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
