use anyhow::Result;
use nextcmd_sdk::Client;

pub fn handle(client: &Client, tau_ms: i64) -> Result<()> {
    let report = client.rebuild_aggregates(tau_ms)?;
    println!("rebuilt aggregates from {} events", report.events_replayed);
    Ok(())
}
