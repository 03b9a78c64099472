//! Strata CLI: the `strata` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands, ConfigCommands};

fn main() {
    let cli = Cli::parse();
    support::init_tracing(cli.verbose);

    match cli.command {
        Commands::Config {
            command: ConfigCommands::Get { path, config, json },
        } => commands::config::get(path, config, json),

        Commands::Resolve {
            kind,
            name,
            layer,
            exact,
            all,
            json,
        } => commands::resolve::run(commands::resolve::Args {
            kind,
            name,
            layer,
            exact,
            all,
            json,
        }),

        Commands::Dispatch {
            controller,
            action,
            layer,
            role,
            params,
            json,
        } => commands::dispatch::run(commands::dispatch::Args {
            controller,
            action,
            layer,
            role,
            params,
            json,
        }),
    }
}
