use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate partition. Aggregates (§3 of SPEC_FULL.md) are always keyed
/// by one of these three scopes; `global` is the only scope guaranteed to
/// exist for every template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Global,
    /// Repo key: content hash over the remote URL (if any) plus the
    /// canonical repo root.
    Repo(String),
    /// Directory scope key, always prefixed `dir:` in its string form.
    Dir(String),
}

impl Scope {
    pub fn dir(hash: impl Into<String>) -> Self {
        let hash = hash.into();
        let hash = hash.strip_prefix("dir:").map(str::to_string).unwrap_or(hash);
        Scope::Dir(hash)
    }

    /// Canonical string key used in store lookups and cache keys.
    pub fn as_key(&self) -> String {
        match self {
            Scope::Global => "global".to_string(),
            Scope::Repo(key) => key.clone(),
            Scope::Dir(hash) => format!("dir:{hash}"),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_scope_roundtrips_prefix() {
        let s = Scope::dir("abc123");
        assert_eq!(s.as_key(), "dir:abc123");
        let s2 = Scope::dir("dir:abc123");
        assert_eq!(s2.as_key(), "dir:abc123");
    }

    #[test]
    fn global_key_is_literal() {
        assert_eq!(Scope::Global.as_key(), "global");
    }
}
