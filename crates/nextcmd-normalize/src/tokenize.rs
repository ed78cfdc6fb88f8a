/// Shell-aware tokenization of one command segment. Quote-aware: this is
/// never naive whitespace splitting (§4.1). Backed by `shlex`, the same
/// POSIX-ish tokenizer the corpus reaches for when it needs real shell
/// word-splitting (e.g. `coco-shell-parser`).
///
/// Unterminated quotes fall back to a best-effort whitespace split so a
/// partially typed command (mid-keystroke, before the closing quote) still
/// yields tokens instead of nothing.
pub fn tokenize(segment: &str) -> Vec<String> {
    match shlex::split(segment) {
        Some(tokens) if !tokens.is_empty() => tokens,
        _ => segment.split_whitespace().map(str::to_string).collect(),
    }
}
