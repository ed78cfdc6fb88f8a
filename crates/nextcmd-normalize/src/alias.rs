use std::collections::HashMap;

/// Default bound on alias expansion depth (§4.1).
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Expand `text` against `aliases` (name -> expansion), substituting only
/// the head token, repeatedly up to `max_depth` times. If expansion would
/// cycle (a text we've already produced reappears), the current text is
/// retained rather than looping forever.
pub fn expand(text: &str, aliases: &HashMap<String, String>, max_depth: u32) -> (String, bool) {
    if aliases.is_empty() {
        return (text.to_string(), false);
    }

    let mut current = text.to_string();
    let mut seen = vec![current.clone()];
    let mut expanded = false;

    for _ in 0..max_depth {
        let head = current.split_whitespace().next().unwrap_or_default();
        let Some(replacement) = aliases.get(head) else {
            break;
        };
        let rest = current[head.len()..].to_string();
        let next = format!("{replacement}{rest}");

        if seen.contains(&next) {
            // Cycle detected: keep the current (pre-cycle) text.
            break;
        }

        current = next;
        seen.push(current.clone());
        expanded = true;
    }

    (current, expanded)
}
