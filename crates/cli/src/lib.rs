pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "dappazon",
    about = "Dappazon chat gateway operator CLI",
    long_about = "Inspect configuration, check provider readiness, read the live catalog, and run chat turns.",
    after_help = "Examples:\n  dappazon doctor --json\n  dappazon catalog\n  dappazon ask \"Cho xem Drone\""
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
    #[command(about = "Validate config, provider credentials, and ledger connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Read the catalog snapshot from the ledger and print it as JSON")]
    Catalog,
    #[command(about = "Print the system prompt the next chat turn would use")]
    Prompt,
    #[command(about = "Run one chat turn against the configured providers")]
    Ask {
        #[arg(help = "User message to send")]
        message: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Catalog => commands::catalog::run(),
        Command::Prompt => commands::prompt::run(),
        Command::Ask { message } => commands::ask::run(&message),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
