use anyhow::Result;
use is_terminal::IsTerminal;
use nextcmd_sdk::Client;
use nextcmd_types::wire::SuggestRequest;
use nextcmd_types::Risk;
use owo_colors::OwoColorize;

#[allow(clippy::too_many_arguments)]
pub fn handle(
    client: &Client,
    session_id: String,
    cwd: Option<String>,
    buffer: String,
    cursor_pos: Option<usize>,
    limit: u32,
    explain: bool,
) -> Result<()> {
    let cwd = match cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir()?.display().to_string(),
    };
    let cursor_pos = cursor_pos.unwrap_or(buffer.len());
    let color = std::io::stdout().is_terminal();

    let response = client.suggest(&SuggestRequest {
        session_id,
        cwd,
        buffer,
        cursor_pos,
        max_results: limit,
        repo_key: None,
        include_low_confidence: false,
    });

    if let Some(err) = &response.error {
        eprintln!("{}: {}", "error".red(), err.message);
        return Ok(());
    }

    if response.suggestions.is_empty() {
        println!("(no suggestions)");
        return Ok(());
    }

    for suggestion in &response.suggestions {
        let command = if color && suggestion.risk == Risk::Destructive {
            suggestion.command.red().to_string()
        } else {
            suggestion.command.clone()
        };
        println!("{:>6.3}  {}  [{}]", suggestion.score, command, suggestion.source);
        if explain {
            for reason in &suggestion.reasons {
                println!("        {:+.3} {} — {}", reason.contribution, reason.kind, reason.description);
            }
        }
    }

    Ok(())
}
