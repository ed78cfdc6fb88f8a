use anyhow::Result;
use is_terminal::IsTerminal;
use nextcmd_sdk::Client;
use owo_colors::OwoColorize;

pub fn handle(client: &Client) -> Result<()> {
    let status = client.status()?;
    let color = std::io::stdout().is_terminal();

    let label = |s: &str| if color { s.bold().to_string() } else { s.to_string() };

    println!("{} {}", label("data dir:"), status.data_dir.map(|p| p.display().to_string()).unwrap_or_else(|| "(in-memory)".into()));
    println!("{} {}", label("sessions:"), status.session_count);
    println!("{} {}", label("events:"), status.event_count);
    println!("{} {}", label("cached suggestions:"), status.cached_suggestion_count);

    Ok(())
}
