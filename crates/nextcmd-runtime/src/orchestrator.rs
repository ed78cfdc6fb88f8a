use crate::cache::CacheHierarchy;
use crate::config::{Config, CANDIDATE_RETRIEVAL_DEADLINE_MS, HARD_TIMEOUT_MS, RANKING_DEADLINE_MS};
use nextcmd_core::{floor_char_boundary, short_hash};
use nextcmd_engine::ScoreRequest;
use nextcmd_normalize::Normalizer;
use nextcmd_store::Store;
use nextcmd_types::wire::{ErrorCode, ErrorEnvelope, ReasonWire, SuggestRequest, SuggestResponse, SuggestionWire};
use nextcmd_types::Suggestion;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Request after §4.9 validation: required fields present, numeric
/// fields clamped.
#[derive(Debug)]
struct ValidatedRequest {
    session_id: String,
    cwd: String,
    buffer: String,
    cursor_pos: usize,
    max_results: u32,
    repo_key: Option<String>,
}

fn validate(req: &SuggestRequest) -> Result<ValidatedRequest, ErrorEnvelope> {
    if req.session_id.is_empty() {
        return Err(ErrorEnvelope::new(ErrorCode::EInvalidArgument, "session_id is required", false));
    }
    if req.cwd.is_empty() {
        return Err(ErrorEnvelope::new(ErrorCode::EInvalidArgument, "cwd is required", false));
    }

    let max_results = if req.max_results == 0 { 10 } else { req.max_results.clamp(1, 50) };

    let cursor_pos = floor_char_boundary(&req.buffer, req.cursor_pos);
    if cursor_pos != req.cursor_pos {
        tracing::warn!(cursor_pos = req.cursor_pos, clamped_to = cursor_pos, buffer_len = req.buffer.len(), "cursor_pos past end of buffer or mid-character, clamping to the nearest char boundary");
    }

    Ok(ValidatedRequest {
        session_id: req.session_id.clone(),
        cwd: req.cwd.clone(),
        buffer: req.buffer.clone(),
        cursor_pos,
        max_results,
        repo_key: req.repo_key.clone(),
    })
}

/// Run `f` on a fresh thread, waiting up to `deadline`. On timeout the
/// caller gets `None` and moves on; the thread is not cancelled, it just
/// runs to completion unobserved (§4.6, §4.9 "return the best partial
/// result observed so far").
fn run_with_deadline<T: Send + 'static>(deadline: Duration, f: impl FnOnce() -> T + Send + 'static) -> Option<T> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(deadline).ok()
}

/// Owns the cache hierarchy and drives the request state machine (§4.9,
/// C9). One instance per daemon; cheap to clone (everything inside is
/// `Arc`).
#[derive(Clone)]
#[derive(Debug)]
pub struct RequestOrchestrator {
    store: Arc<Store>,
    normalizer: Arc<Normalizer>,
    cache: Arc<CacheHierarchy>,
    config: Arc<Config>,
}

impl RequestOrchestrator {
    pub fn new(store: Arc<Store>, config: Arc<Config>) -> Self {
        let cache = Arc::new(CacheHierarchy::new(config.memory_budget_mb));
        Self { store, normalizer: Arc::new(Normalizer::default()), cache, config }
    }

    pub fn cache(&self) -> &CacheHierarchy {
        &self.cache
    }

    /// `New -> Validated -> Cached? -> Return / Compute -> Cache ->
    /// Return / Deadline -> Return-Partial` (§4.9).
    pub fn suggest(&self, req: &SuggestRequest, now_ms: i64) -> SuggestResponse {
        let started = Instant::now();
        let hard_deadline = Duration::from_millis(HARD_TIMEOUT_MS);

        let validated = match validate(req) {
            Ok(v) => v,
            Err(envelope) => return SuggestResponse { suggestions: Vec::new(), error: Some(envelope) },
        };

        let prefix = validated.buffer[..validated.cursor_pos].to_string();
        let context_hash = crate::cache::context_hash(&validated.cwd, &prefix);
        let dir_scope_key = short_hash(&validated.cwd);

        let last_event = self
            .store
            .with_conn(|conn| nextcmd_store::events::last_for_session(conn, &validated.session_id))
            .unwrap_or(None);
        let last_event_id = last_event.as_ref().and_then(|e| e.id).unwrap_or(0);
        let l1_key = crate::cache::l1_key(&validated.session_id, last_event_id, &context_hash);

        let cached = {
            let cache = self.cache.clone();
            let store = self.store.clone();
            let l1_key = l1_key.clone();
            let repo_key = validated.repo_key.clone();
            let session_id = validated.session_id.clone();
            let context_hash = context_hash.clone();
            run_with_deadline(Duration::from_millis(CANDIDATE_RETRIEVAL_DEADLINE_MS), move || {
                cache.get(&store, &l1_key, repo_key.as_deref(), &session_id, &context_hash, now_ms)
            })
            .flatten()
        };

        if let Some(suggestions) = cached {
            return to_response(suggestions, validated.max_results);
        }

        if started.elapsed() >= hard_deadline {
            tracing::warn!("hard timeout exceeded before scoring started; returning partial result");
            return SuggestResponse { suggestions: Vec::new(), error: None };
        }

        let score_req = ScoreRequest {
            last_template_id: last_event.as_ref().map(|e| e.template_id.clone()),
            last_exit_code: last_event.as_ref().map(|e| e.exit_code),
            last_failed: last_event.as_ref().is_some_and(|e| e.exit_code != 0),
            repo_key: validated.repo_key.clone(),
            dir_scope_key,
            prefix: Some(prefix),
            workflow_next_template: None,
            top_k: Some(validated.max_results as usize),
        };

        let suggestions = {
            let store = self.store.clone();
            let normalizer = self.normalizer.clone();
            let score_config = self.config.score_config();
            let score_req = score_req.clone();
            match run_with_deadline(Duration::from_millis(RANKING_DEADLINE_MS), move || {
                nextcmd_engine::score(&store, &normalizer, &score_req, &score_config, now_ms)
            }) {
                Some(Ok(suggestions)) => suggestions,
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "scoring failed; returning partial result");
                    Vec::new()
                }
                None => {
                    tracing::warn!("scoring exceeded the ranking deadline; returning partial result");
                    Vec::new()
                }
            }
        };

        if !suggestions.is_empty() {
            self.cache.set(
                &self.store,
                &l1_key,
                validated.repo_key.as_deref(),
                &validated.session_id,
                &context_hash,
                suggestions.clone(),
                now_ms,
                self.config.cache_ttl_ms,
            );
        }

        to_response(suggestions, validated.max_results)
    }
}

fn to_response(mut suggestions: Vec<Suggestion>, max_results: u32) -> SuggestResponse {
    suggestions.truncate(max_results as usize);
    let wire = suggestions
        .into_iter()
        .map(|s| {
            let source = s
                .reasons
                .iter()
                .max_by(|a, b| a.contribution.abs().total_cmp(&b.contribution.abs()))
                .map(|r| format!("{:?}", r.tag))
                .unwrap_or_default();
            let description = s
                .reasons
                .first()
                .map(|r| r.tag.description().to_string())
                .unwrap_or_default();
            SuggestionWire {
                command: s.command,
                source,
                score: s.score,
                description,
                risk: s.risk,
                reasons: s.reasons.into_iter().map(ReasonWire::from).collect(),
            }
        })
        .collect();
    SuggestResponse { suggestions: wire, error: None }
}
