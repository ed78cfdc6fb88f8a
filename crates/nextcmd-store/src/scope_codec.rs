use nextcmd_types::Scope;

/// Decode a stored scope key back into a [`Scope`]. The inverse of
/// [`Scope::as_key`]; storage is the only layer that needs to go back
/// from the flat string key to the typed enum.
pub fn decode(key: &str) -> Scope {
    if key == "global" {
        Scope::Global
    } else if let Some(hash) = key.strip_prefix("dir:") {
        Scope::dir(hash)
    } else {
        Scope::Repo(key.to_string())
    }
}
