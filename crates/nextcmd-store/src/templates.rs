use crate::error::Result;
use nextcmd_types::CommandTemplate;
use rusqlite::{params, Connection, OptionalExtension};

/// Upsert a template: preserve `first_seen_ms`, advance `last_seen_ms`
/// monotonically (§4.4 step 2, §8 property 2).
pub fn upsert(
    conn: &Connection,
    id: &str,
    normalized_text: &str,
    slot_count: usize,
    event_ts_ms: i64,
) -> Result<()> {
    let mut template = get(conn, id)?.unwrap_or(CommandTemplate {
        id: id.to_string(),
        normalized_text: normalized_text.to_string(),
        slot_count,
        first_seen_ms: event_ts_ms,
        last_seen_ms: event_ts_ms,
    });
    template.merge_seen(event_ts_ms);

    conn.execute(
        "INSERT INTO command_templates (id, normalized_text, slot_count, first_seen_ms, last_seen_ms)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
             first_seen_ms = ?4,
             last_seen_ms = ?5",
        params![
            template.id,
            template.normalized_text,
            template.slot_count as i64,
            template.first_seen_ms,
            template.last_seen_ms,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<CommandTemplate>> {
    let template = conn
        .query_row(
            "SELECT id, normalized_text, slot_count, first_seen_ms, last_seen_ms
             FROM command_templates WHERE id = ?1",
            params![id],
            |row| {
                Ok(CommandTemplate {
                    id: row.get(0)?,
                    normalized_text: row.get(1)?,
                    slot_count: row.get::<_, i64>(2)? as usize,
                    first_seen_ms: row.get(3)?,
                    last_seen_ms: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(template)
}
