use lru::LruCache;
use nextcmd_store::Store;
use nextcmd_types::{Suggestion, SuggestionCacheEntry};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Generous entry-count cap for each in-memory layer; the real ceiling
/// is the byte budget enforced after every `Set` (§4.6).
const MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    suggestions: Vec<Suggestion>,
    created_ms: i64,
    ttl_ms: i64,
    bytes: usize,
}

impl Entry {
    fn new(suggestions: Vec<Suggestion>, created_ms: i64, ttl_ms: i64) -> Self {
        let bytes = serde_json::to_vec(&suggestions).map(|v| v.len()).unwrap_or(0);
        Self { suggestions, created_ms, ttl_ms, bytes }
    }

    fn expired(&self, now_ms: i64) -> bool {
        now_ms - self.created_ms > self.ttl_ms
    }
}

/// L1 (per-session hot) + L2 (per-repo warm) in-memory layers, backed by
/// L3 (persistent, via the Store) (§4.6, C7). Tier order on Get:
/// L1 -> L2 -> L3, promoting on every hit below L1.
#[derive(Debug)]
pub struct CacheHierarchy {
    l1: Mutex<LruCache<String, Entry>>,
    l2: Mutex<LruCache<String, Entry>>,
    l1_bytes: AtomicUsize,
    l2_bytes: AtomicUsize,
    memory_budget_bytes: usize,
}

pub fn l1_key(session_id: &str, last_event_id: i64, prefix_hash: &str) -> String {
    format!("{session_id}:{last_event_id}:{prefix_hash}")
}

pub fn context_hash(cwd: &str, buffer: &str) -> String {
    nextcmd_core::content_hash(&format!("{cwd}\u{0}{buffer}"))
}

impl CacheHierarchy {
    pub fn new(memory_budget_mb: u64) -> Self {
        let cap = NonZeroUsize::new(MAX_ENTRIES).expect("MAX_ENTRIES is nonzero");
        Self {
            l1: Mutex::new(LruCache::new(cap)),
            l2: Mutex::new(LruCache::new(cap)),
            l1_bytes: AtomicUsize::new(0),
            l2_bytes: AtomicUsize::new(0),
            memory_budget_bytes: (memory_budget_mb as usize) * 1024 * 1024,
        }
    }

    /// Composite Get (§4.6). On an L2 hit, promote to L1; on an L3 hit,
    /// promote to L2 (if `repo_key` is known) and L1.
    pub fn get(
        &self,
        store: &Store,
        l1_key: &str,
        repo_key: Option<&str>,
        session_id: &str,
        context_hash: &str,
        now_ms: i64,
    ) -> Option<Vec<Suggestion>> {
        if let Some(entry) = self.l1.lock().expect("l1 mutex poisoned").get(l1_key).cloned() {
            if !entry.expired(now_ms) {
                return Some(entry.suggestions);
            }
        }

        if let Some(repo_key) = repo_key {
            let hit = self.l2.lock().expect("l2 mutex poisoned").get(repo_key).cloned();
            if let Some(entry) = hit {
                if !entry.expired(now_ms) {
                    self.put_l1(l1_key, entry.suggestions.clone(), entry.created_ms, entry.ttl_ms);
                    return Some(entry.suggestions);
                }
            }
        }

        let l3 = store
            .with_conn(|conn| nextcmd_store::suggestion_cache::get(conn, session_id, context_hash))
            .ok()
            .flatten();
        if let Some(l3_entry) = l3 {
            if now_ms - l3_entry.created_ms <= l3_entry.ttl_ms {
                let _ = store.with_conn(|conn| nextcmd_store::suggestion_cache::record_hit(conn, session_id, context_hash));
                if let Some(repo_key) = repo_key {
                    self.put_l2(repo_key, l3_entry.suggestions.clone(), l3_entry.created_ms, l3_entry.ttl_ms);
                }
                self.put_l1(l1_key, l3_entry.suggestions.clone(), l3_entry.created_ms, l3_entry.ttl_ms);
                return Some(l3_entry.suggestions);
            }
        }

        None
    }

    /// Set (§4.6): L1/L2 synchronous, L3 fire-and-forget. Enforces the
    /// memory budget afterward.
    pub fn set(
        &self,
        store: &Store,
        l1_key: &str,
        repo_key: Option<&str>,
        session_id: &str,
        context_hash: &str,
        suggestions: Vec<Suggestion>,
        created_ms: i64,
        ttl_ms: i64,
    ) {
        self.put_l1(l1_key, suggestions.clone(), created_ms, ttl_ms);
        if let Some(repo_key) = repo_key {
            self.put_l2(repo_key, suggestions.clone(), created_ms, ttl_ms);
        }

        let entry = SuggestionCacheEntry {
            session_id: session_id.to_string(),
            context_hash: context_hash.to_string(),
            suggestions,
            created_ms,
            ttl_ms,
            hit_count: 0,
        };
        if let Err(err) = store.with_conn(|conn| nextcmd_store::suggestion_cache::set(conn, &entry)) {
            tracing::warn!(error = %err, "L3 cache set failed; non-fatal");
        }

        self.enforce_memory_budget();
    }

    /// Invalidate every L1 entry for a session (§4.6: "on command end for
    /// a session").
    pub fn invalidate_session(&self, session_id: &str) {
        let prefix = format!("{session_id}:");
        let mut l1 = self.l1.lock().expect("l1 mutex poisoned");
        let stale: Vec<String> = l1.iter().filter(|(k, _)| k.starts_with(&prefix)).map(|(k, _)| k.clone()).collect();
        for key in stale {
            if let Some(entry) = l1.pop(&key) {
                self.l1_bytes.fetch_sub(entry.bytes, Ordering::Relaxed);
            }
        }
    }

    /// Invalidate a repo's L2 entry (§4.6: "on repo context change or on
    /// a new event in that repo").
    pub fn invalidate_repo(&self, repo_key: &str) {
        let mut l2 = self.l2.lock().expect("l2 mutex poisoned");
        if let Some(entry) = l2.pop(repo_key) {
            self.l2_bytes.fetch_sub(entry.bytes, Ordering::Relaxed);
        }
    }

    fn put_l1(&self, key: &str, suggestions: Vec<Suggestion>, created_ms: i64, ttl_ms: i64) {
        let entry = Entry::new(suggestions, created_ms, ttl_ms);
        let bytes = entry.bytes;
        let mut l1 = self.l1.lock().expect("l1 mutex poisoned");
        if let Some(old) = l1.push(key.to_string(), entry).map(|(_, v)| v) {
            self.l1_bytes.fetch_sub(old.bytes, Ordering::Relaxed);
        }
        self.l1_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn put_l2(&self, key: &str, suggestions: Vec<Suggestion>, created_ms: i64, ttl_ms: i64) {
        let entry = Entry::new(suggestions, created_ms, ttl_ms);
        let bytes = entry.bytes;
        let mut l2 = self.l2.lock().expect("l2 mutex poisoned");
        if let Some(old) = l2.push(key.to_string(), entry).map(|(_, v)| v) {
            self.l2_bytes.fetch_sub(old.bytes, Ordering::Relaxed);
        }
        self.l2_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Total L1+L2 usage must stay within budget; evict from L2 first,
    /// then L1, each by LRU (§4.6, §8 property 8).
    fn enforce_memory_budget(&self) {
        loop {
            let total = self.l1_bytes.load(Ordering::Relaxed) + self.l2_bytes.load(Ordering::Relaxed);
            if total <= self.memory_budget_bytes {
                return;
            }
            let mut l2 = self.l2.lock().expect("l2 mutex poisoned");
            if let Some((_, entry)) = l2.pop_lru() {
                self.l2_bytes.fetch_sub(entry.bytes, Ordering::Relaxed);
                continue;
            }
            drop(l2);
            let mut l1 = self.l1.lock().expect("l1 mutex poisoned");
            if let Some((_, entry)) = l1.pop_lru() {
                self.l1_bytes.fetch_sub(entry.bytes, Ordering::Relaxed);
                continue;
            }
            return;
        }
    }

    pub fn l1_l2_bytes(&self) -> usize {
        self.l1_bytes.load(Ordering::Relaxed) + self.l2_bytes.load(Ordering::Relaxed)
    }
}

/// Deduplicates in-flight precompute jobs by composite key (§4.6).
pub struct PrecomputeTracker {
    inflight: Mutex<HashSet<String>>,
}

impl Default for PrecomputeTracker {
    fn default() -> Self {
        Self { inflight: Mutex::new(HashSet::new()) }
    }
}

impl PrecomputeTracker {
    /// Returns true only for the first caller for `key`; others must no-op
    /// (§8 property 9).
    pub fn try_acquire(&self, key: &str) -> bool {
        self.inflight.lock().expect("precompute mutex poisoned").insert(key.to_string())
    }

    /// Record completion, success or failure; clears the in-flight marker
    /// so a future request can retry.
    pub fn release(&self, key: &str) {
        self.inflight.lock().expect("precompute mutex poisoned").remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextcmd_types::{Reason, ReasonTag, Risk};

    fn sample_suggestions() -> Vec<Suggestion> {
        vec![Suggestion {
            command: "git status".into(),
            template_id: Some("t1".into()),
            score: 1.5,
            confidence: 0.8,
            risk: Risk::Safe,
            reasons: vec![Reason { tag: ReasonTag::DirFreq, contribution: 1.5 }],
        }]
    }

    #[test]
    fn l1_hit_short_circuits_l2_and_l3() {
        let store = Store::open_in_memory().unwrap();
        let cache = CacheHierarchy::new(50);
        let key = l1_key("s1", 1, "none");
        cache.set(&store, &key, None, "s1", "ctx1", sample_suggestions(), 1_000, 5_000);

        let hit = cache.get(&store, &key, None, "s1", "ctx1", 1_500);
        assert!(hit.is_some());
    }

    #[test]
    fn l2_hit_promotes_to_l1() {
        let store = Store::open_in_memory().unwrap();
        let cache = CacheHierarchy::new(50);
        cache.set(&store, "other-key", Some("r1"), "s1", "ctx1", sample_suggestions(), 1_000, 5_000);

        let new_l1_key = l1_key("s2", 9, "none");
        let hit = cache.get(&store, &new_l1_key, Some("r1"), "s2", "ctx-other", 1_500);
        assert!(hit.is_some());

        let promoted = cache.l1.lock().unwrap().peek(&new_l1_key).cloned();
        assert!(promoted.is_some());
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let store = Store::open_in_memory().unwrap();
        let cache = CacheHierarchy::new(50);
        let key = l1_key("s1", 1, "none");
        cache.set(&store, &key, None, "s1", "ctx1", sample_suggestions(), 1_000, 100);

        let hit = cache.get(&store, &key, None, "s1", "ctx1", 5_000);
        assert!(hit.is_none());
    }

    #[test]
    fn invalidate_session_drops_only_matching_prefix() {
        let store = Store::open_in_memory().unwrap();
        let cache = CacheHierarchy::new(50);
        let key_a = l1_key("s1", 1, "none");
        let key_b = l1_key("s2", 1, "none");
        cache.set(&store, &key_a, None, "s1", "ctx1", sample_suggestions(), 1_000, 5_000);
        cache.set(&store, &key_b, None, "s2", "ctx2", sample_suggestions(), 1_000, 5_000);

        cache.invalidate_session("s1");

        assert!(cache.l1.lock().unwrap().peek(&key_a).is_none());
        assert!(cache.l1.lock().unwrap().peek(&key_b).is_some());
    }

    #[test]
    fn precompute_tracker_yields_exactly_one_success() {
        let tracker = PrecomputeTracker::default();
        assert!(tracker.try_acquire("k1"));
        assert!(!tracker.try_acquire("k1"));
        tracker.release("k1");
        assert!(tracker.try_acquire("k1"));
    }
}
