use nextcmd_types::SlotTag;
use once_cell::sync::Lazy;
use regex::Regex;

static SHA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{7,40}$").unwrap());
static NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());
static SCP_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.\-]+@[\w.\-]+:.+$").unwrap());

/// Classify one positional (non-flag, non-head, non-subcommand) token
/// into a slot tag (§4.1). Rules are first-match-wins; num is checked
/// before sha so a run of digits never gets hex-guessed, and url is
/// checked before the slash-based path rule so a URL (which always
/// contains a `/`) can actually match `<url>` instead of being
/// swallowed by the broader "contains a slash" path rule. Callers
/// handle `<msg>` separately since it depends on the preceding flag,
/// not the token's own shape.
pub fn classify(token: &str) -> SlotTag {
    if NUM_RE.is_match(token) {
        return SlotTag::Num;
    }
    if SHA_RE.is_match(token) {
        return SlotTag::Sha;
    }
    if is_url_like(token) {
        return SlotTag::Url;
    }
    if is_path_like(token) {
        return SlotTag::Path;
    }
    SlotTag::Arg
}

fn is_path_like(token: &str) -> bool {
    token == "-"
        || token.starts_with("./")
        || token.starts_with("../")
        || token.starts_with('~')
        || token.contains('/')
}

fn is_url_like(token: &str) -> bool {
    token.starts_with("http://") || token.starts_with("https://") || SCP_URL_RE.is_match(token)
}
