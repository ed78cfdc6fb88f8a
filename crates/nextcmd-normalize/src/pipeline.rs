use crate::normalizer::Normalizer;
use nextcmd_types::BoundaryOp;

/// Default cap on stored pipeline segments (§3 "Pipeline entities", §4.2).
pub const DEFAULT_MAX_SEGMENTS: usize = 8;

/// One raw segment produced by [`split`], before the normalizer has
/// touched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub position: u32,
    pub boundary_before: Option<BoundaryOp>,
    pub raw: String,
}

/// Split a raw command into ordered segments on top-level boundary
/// operators `||`, `&&`, `|`, `;` (§4.2). Quotes (single/double) and
/// backslash escapes are respected: a boundary token inside quotes is
/// never treated as a split point. Segment count is capped at
/// `max_segments`; segments beyond the cap are discarded from the tail.
pub fn split(raw: &str, max_segments: usize) -> Vec<RawSegment> {
    let chars: Vec<char> = raw.chars().collect();
    let mut segments = Vec::new();
    let mut seg_start = 0usize;
    let mut pending_boundary: Option<BoundaryOp> = None;

    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0usize;

    let mut push_segment = |start: usize, end: usize, boundary: Option<BoundaryOp>, out: &mut Vec<RawSegment>| {
        let text: String = chars[start..end].iter().collect();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            out.push(RawSegment {
                position: out.len() as u32,
                boundary_before: boundary,
                raw: trimmed.to_string(),
            });
        }
    };

    while i < chars.len() {
        let c = chars[i];
        if in_single {
            if c == '\'' {
                in_single = false;
            }
            i += 1;
            continue;
        }
        if in_double {
            if c == '\\' && i + 1 < chars.len() {
                i += 2;
                continue;
            }
            if c == '"' {
                in_double = false;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' => {
                in_single = true;
                i += 1;
            }
            '"' => {
                in_double = true;
                i += 1;
            }
            '\\' if i + 1 < chars.len() => {
                i += 2;
            }
            '|' | '&' | ';' => {
                let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
                let (op, width) = if let Some(op) = BoundaryOp::from_token(&two) {
                    (op, 2)
                } else {
                    let one = c.to_string();
                    match BoundaryOp::from_token(&one) {
                        Some(op) => (op, 1),
                        None => {
                            // Lone `&` (background operator) is not a
                            // recognized boundary; treat as ordinary text.
                            i += 1;
                            continue;
                        }
                    }
                };
                push_segment(seg_start, i, pending_boundary, &mut segments);
                pending_boundary = Some(op);
                i += width;
                seg_start = i;
            }
            _ => {
                i += 1;
            }
        }
    }
    push_segment(seg_start, chars.len(), pending_boundary, &mut segments);

    if segments.len() > max_segments {
        segments.truncate(max_segments);
    }
    segments
}

/// A pipeline segment after the normalizer has been reapplied to it
/// (§4.2, last sentence). `parent_event_id` is filled in by the store
/// once the parent `CommandEvent` row id is known.
#[derive(Debug, Clone)]
pub struct NormalizedSegment {
    pub position: u32,
    pub boundary_before: Option<BoundaryOp>,
    pub raw: String,
    pub normalized_text: String,
    pub template_id: String,
}

/// Split `raw` into segments and reapply the normalizer to each one.
/// Segments that fail to normalize (empty after alias expansion) are
/// dropped rather than aborting the whole batch.
pub fn split_and_normalize(
    raw: &str,
    normalizer: &Normalizer,
    max_segments: usize,
) -> Vec<NormalizedSegment> {
    split(raw, max_segments)
        .into_iter()
        .filter_map(|seg| {
            let normalized = normalizer.normalize(&seg.raw).ok()?;
            Some(NormalizedSegment {
                position: seg.position,
                boundary_before: seg.boundary_before,
                raw: seg.raw,
                normalized_text: normalized.normalized_text,
                template_id: normalized.template_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_pipe() {
        let segs = split("go test ./... | grep FAIL", DEFAULT_MAX_SEGMENTS);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].boundary_before, None);
        assert_eq!(segs[0].raw, "go test ./...");
        assert_eq!(segs[1].boundary_before, Some(BoundaryOp::Pipe));
        assert_eq!(segs[1].raw, "grep FAIL");
    }

    #[test]
    fn does_not_split_inside_quotes() {
        let segs = split("echo 'a && b' | cat", DEFAULT_MAX_SEGMENTS);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].raw, "echo 'a && b'");
    }

    #[test]
    fn prefers_two_char_operators_over_one_char() {
        let segs = split("make build && make test", DEFAULT_MAX_SEGMENTS);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].boundary_before, Some(BoundaryOp::And));
    }

    #[test]
    fn caps_segment_count_from_the_tail() {
        let raw = "a; b; c; d; e; f; g; h; i; j";
        let segs = split(raw, 8);
        assert_eq!(segs.len(), 8);
        assert_eq!(segs.last().unwrap().raw, "h");
    }

    #[test]
    fn lone_ampersand_is_not_a_boundary() {
        let segs = split("long_running_job &", DEFAULT_MAX_SEGMENTS);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].raw, "long_running_job &");
    }

    #[test]
    fn split_and_normalize_reapplies_normalizer_per_segment() {
        let normalizer = Normalizer::default();
        let segs = split_and_normalize("go test ./... | grep FAIL", &normalizer, DEFAULT_MAX_SEGMENTS);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].position, 0);
        assert_eq!(segs[0].boundary_before, None);
        assert_eq!(segs[0].normalized_text, "go test <path>");
        assert_eq!(segs[1].position, 1);
        assert_eq!(segs[1].boundary_before, Some(BoundaryOp::Pipe));
        assert_eq!(segs[1].normalized_text, "grep <arg>");
        assert_ne!(segs[0].template_id, segs[1].template_id);
    }
}
