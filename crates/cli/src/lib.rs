pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "parley",
    about = "Parley relay operator CLI",
    long_about = "Inspect configuration, check startup readiness, and preview the Mattermost to Freshchat identity mapping.",
    after_help = "Examples:\n  parley doctor --json\n  parley config\n  parley mapping"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and the Freshchat signing key")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Fetch both rosters and print the username to agent id mapping as JSON")]
    Mapping,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Mapping => commands::mapping::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
