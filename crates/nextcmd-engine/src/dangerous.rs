use nextcmd_types::SlotStat;
use std::collections::BTreeMap;

/// Closed list of destructive command shapes (§4.5: "a closed list of
/// patterns"). Matched against the rendered (slot-filled) command text,
/// lowercased, by substring.
const DANGEROUS_PATTERNS: &[&str] = &[
    "rm -rf /",
    "rm -fr /",
    "rm -rf /*",
    "dd if=/dev/zero",
    "of=/dev/sda",
    "of=/dev/nvme",
    "chmod -r 777 /",
    "chmod 777 /",
    "chown -r",
    "mkfs",
    ":(){ :|:& };:",
];

/// Substitute each slot placeholder in `normalized_text` with the most
/// frequently observed raw value at that position (§4.4 step 5: slot
/// raw values are "kept for slot-fill suggestions"). Placeholders with
/// no recorded value are left as-is.
pub fn render_with_top_slots(normalized_text: &str, slot_stats: &[SlotStat]) -> String {
    let mut top_by_position: BTreeMap<usize, (&str, i64)> = BTreeMap::new();
    for stat in slot_stats {
        let entry = top_by_position.entry(stat.position).or_insert((stat.value.as_str(), stat.count));
        if stat.count > entry.1 {
            *entry = (stat.value.as_str(), stat.count);
        }
    }
    let mut values = top_by_position.into_values().map(|(v, _)| v);

    normalized_text
        .split(' ')
        .map(|token| {
            if is_placeholder(token) {
                values.next().unwrap_or(token)
            } else {
                token
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_placeholder(token: &str) -> bool {
    matches!(token, "<path>" | "<num>" | "<sha>" | "<url>" | "<msg>" | "<arg>")
}

pub fn is_dangerous(rendered_command: &str) -> bool {
    let lower = rendered_command.to_lowercase();
    DANGEROUS_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextcmd_types::SlotStat;

    fn stat(position: usize, value: &str, count: i64) -> SlotStat {
        SlotStat {
            template_id: "t1".into(),
            position,
            value: value.into(),
            count,
            last_seen_ms: 0,
        }
    }

    #[test]
    fn renders_top_slot_values_into_placeholders() {
        let rendered = render_with_top_slots("rm <arg> <path>", &[stat(1, "-rf", 5), stat(2, "/", 9)]);
        assert_eq!(rendered, "rm -rf /");
    }

    #[test]
    fn root_deletion_is_flagged_dangerous() {
        let rendered = render_with_top_slots("rm <arg> <path>", &[stat(1, "-rf", 5), stat(2, "/", 9)]);
        assert!(is_dangerous(&rendered));
    }

    #[test]
    fn deleting_a_project_subdirectory_is_not_dangerous() {
        let rendered = render_with_top_slots("rm <arg> <path>", &[stat(1, "-rf", 5), stat(2, "./build", 9)]);
        assert!(!is_dangerous(&rendered));
    }

    #[test]
    fn fork_bomb_survives_as_a_literal_head_token() {
        assert!(is_dangerous(":(){ :|:& };:"));
    }
}
