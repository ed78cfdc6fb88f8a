use crate::args::{Cli, Commands};
use crate::handlers;
use crate::logging;
use anyhow::Result;
use clap::CommandFactory;
use nextcmd_runtime::Config;
use nextcmd_sdk::Client;

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    let data_dir = match &cli.data_dir {
        Some(path) => nextcmd_core::path::expand_tilde(path),
        None => nextcmd_core::path::resolve_data_dir(None)?,
    };
    let config = Config::load_from(&data_dir.join("config.toml"))?;
    let tau_ms = config.tau_ms;
    let client = Client::connect_with_config(data_dir, config)?;

    if cli.rebuild_aggregates {
        return handlers::rebuild::handle(&client, tau_ms);
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Status => handlers::status::handle(&client),
        Commands::Suggest { session_id, cwd, buffer, cursor_pos, limit, explain } => {
            handlers::suggest::handle(&client, session_id, cwd, buffer, cursor_pos, limit, explain)
        }
    }
}
