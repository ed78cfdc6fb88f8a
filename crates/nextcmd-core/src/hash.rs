use sha2::{Digest, Sha256};

/// Stable content hash used for template ids (§4.1) and pipeline pattern
/// hashes (§3 `PipelinePattern`). Truncated to 64 bits / 16 hex chars —
/// plenty of collision resistance for a per-user local store, and
/// compact enough to use as a cache-key component.
pub fn content_hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 8)
}

/// Short hash used for directory scope keys (§3, "Directory scope key").
/// Deliberately shorter and unprefixed; callers add the `dir:` prefix.
pub fn short_hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 6)
}

fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes[..n.min(bytes.len())]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Repo key: content hash over the remote URL (if any) plus the
/// canonical repo root (§3 "Repo key"). Identifies a repository without
/// exposing its path as the key.
pub fn repo_key(remote_url: Option<&str>, canonical_root: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(url) = remote_url {
        hasher.update(url.as_bytes());
    }
    hasher.update(b"\0");
    hasher.update(canonical_root.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 10)
}
