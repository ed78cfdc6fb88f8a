use serde::{Deserialize, Serialize};

/// Typed slot placeholder a raw argument was replaced with (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotTag {
    Path,
    Num,
    Sha,
    Url,
    Msg,
    Arg,
}

impl SlotTag {
    pub fn placeholder(self) -> &'static str {
        match self {
            SlotTag::Path => "<path>",
            SlotTag::Num => "<num>",
            SlotTag::Sha => "<sha>",
            SlotTag::Url => "<url>",
            SlotTag::Msg => "<msg>",
            SlotTag::Arg => "<arg>",
        }
    }
}

/// One slot extracted from a raw command: its position in the token
/// stream, the tag it was classified as, and the original raw value
/// (kept for slot-fill suggestions, §4.4 step 5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub position: usize,
    pub tag: SlotTag,
    pub raw_value: String,
}

/// Canonical form of a command with slots replaced by typed
/// placeholders. Key is `id`, a stable content hash of `normalized_text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub id: String,
    pub normalized_text: String,
    pub slot_count: usize,
    pub first_seen_ms: i64,
    pub last_seen_ms: i64,
}

impl CommandTemplate {
    /// Upsert semantics applied to an existing row: preserve
    /// `first_seen_ms`, advance `last_seen_ms` monotonically (§8 property 2).
    pub fn merge_seen(&mut self, event_ts_ms: i64) {
        self.first_seen_ms = self.first_seen_ms.min(event_ts_ms);
        self.last_seen_ms = self.last_seen_ms.max(event_ts_ms);
    }
}

/// Output of the normalizer's cheap first pass (§4.1): a normalized
/// form and template id without full slot extraction, plus whether
/// alias expansion changed the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreNorm {
    pub normalized_text: String,
    pub template_id: String,
    pub alias_expanded: bool,
}

/// Full normalization result: normalized text, template id, and the
/// slots recognized within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCommand {
    pub normalized_text: String,
    pub template_id: String,
    pub slots: Vec<Slot>,
}
