use crate::error::Result;
use nextcmd_types::{Slot, SlotCorrelation, SlotStat};
use rusqlite::{params, Connection};

/// Upsert the per-position value distribution for one template (§4.4
/// step 5, first half).
pub fn upsert_slot(conn: &Connection, template_id: &str, slot: &Slot, now_ms: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO slot_stats (template_id, position, tag, value, count, last_seen_ms)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)
         ON CONFLICT(template_id, position, value) DO UPDATE SET
             count = count + 1, last_seen_ms = ?5",
        params![
            template_id,
            slot.position as i64,
            format!("{:?}", slot.tag),
            slot.raw_value,
            now_ms,
        ],
    )?;
    Ok(())
}

/// Upsert a configured tuple's co-occurrence (§4.4 step 5, second half).
/// `tuple_hash` keys the row; `values` is the tuple's raw values in
/// `positions` order, stored as JSON.
pub fn upsert_correlation(
    conn: &Connection,
    template_id: &str,
    positions: &[usize],
    tuple_hash: &str,
    values: &[String],
    now_ms: i64,
) -> Result<()> {
    let positions_json = serde_json::to_string(positions).map_err(|e| {
        crate::error::Error::Query(format!("failed to encode slot positions: {e}"))
    })?;
    let values_json = serde_json::to_string(values)
        .map_err(|e| crate::error::Error::Query(format!("failed to encode slot values: {e}")))?;

    conn.execute(
        "INSERT INTO slot_correlations (template_id, tuple_hash, positions, values_json, count, last_seen_ms)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)
         ON CONFLICT(template_id, tuple_hash) DO UPDATE SET
             count = count + 1, last_seen_ms = ?5, values_json = ?4",
        params![template_id, tuple_hash, positions_json, values_json, now_ms],
    )?;
    Ok(())
}

pub fn correlations_for(conn: &Connection, template_id: &str) -> Result<Vec<SlotCorrelation>> {
    let mut stmt = conn.prepare_cached(
        "SELECT template_id, tuple_hash, positions, values_json, count, last_seen_ms
         FROM slot_correlations WHERE template_id = ?1",
    )?;
    let rows = stmt.query_map(params![template_id], |row| {
        let positions_json: String = row.get(2)?;
        let values_json: String = row.get(3)?;
        let positions: Vec<usize> = serde_json::from_str(&positions_json).unwrap_or_default();
        let values: Vec<String> = serde_json::from_str(&values_json).unwrap_or_default();
        Ok(SlotCorrelation {
            template_id: row.get(0)?,
            tuple_hash: row.get(1)?,
            positions,
            values,
            count: row.get(4)?,
            last_seen_ms: row.get(5)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn stats_for(conn: &Connection, template_id: &str) -> Result<Vec<SlotStat>> {
    let mut stmt = conn.prepare_cached(
        "SELECT template_id, position, value, count, last_seen_ms
         FROM slot_stats WHERE template_id = ?1",
    )?;
    let rows = stmt.query_map(params![template_id], |row| {
        Ok(SlotStat {
            template_id: row.get(0)?,
            position: row.get::<_, i64>(1)? as usize,
            value: row.get(2)?,
            count: row.get(3)?,
            last_seen_ms: row.get(4)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use nextcmd_types::SlotTag;

    #[test]
    fn slot_value_counts_accumulate() {
        let store = Store::open_in_memory().unwrap();
        let slot = Slot {
            position: 1,
            tag: SlotTag::Path,
            raw_value: "./src".to_string(),
        };
        store.with_conn(|conn| upsert_slot(conn, "t1", &slot, 100)).unwrap();
        store.with_conn(|conn| upsert_slot(conn, "t1", &slot, 200)).unwrap();

        let stats = store.with_conn(|conn| stats_for(conn, "t1")).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].last_seen_ms, 200);
    }

    #[test]
    fn correlation_round_trips_values() {
        let store = Store::open_in_memory().unwrap();
        let values = vec!["a".to_string(), "b".to_string()];
        store
            .with_conn(|conn| upsert_correlation(conn, "t1", &[0, 1], "hash1", &values, 100))
            .unwrap();

        let correlations = store.with_conn(|conn| correlations_for(conn, "t1")).unwrap();
        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].values, values);
        assert_eq!(correlations[0].positions, vec![0, 1]);
    }
}
