use crate::suggestion::Suggestion;
use serde::{Deserialize, Serialize};

/// L3 persistent cache row (§3 `SuggestionCacheEntry`, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionCacheEntry {
    pub session_id: String,
    pub context_hash: String,
    pub suggestions: Vec<Suggestion>,
    pub created_ms: i64,
    pub ttl_ms: i64,
    pub hit_count: i64,
}

impl SuggestionCacheEntry {
    pub fn cache_key(session_id: &str, context_hash: &str) -> String {
        format!("{session_id}:{context_hash}")
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.created_ms > self.ttl_ms
    }
}
