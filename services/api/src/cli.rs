use std::path::PathBuf;

use crate::demo::{run_demo, run_skills_import, DemoArgs, SkillsImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hiretop::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "HireTop",
    about = "Run the HireTop hiring API or walk through its hiring workflow from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Manage the skill catalog
    Skills {
        #[command(subcommand)]
        command: SkillsCommand,
    },
    /// Run an end-to-end hiring demo: profile, offer, application, acceptance
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum SkillsCommand {
    /// Parse a `name,category` CSV export and print the resulting catalog
    Import(SkillsImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the skill catalog from a `name,category` CSV instead of the standard set
    #[arg(long)]
    pub(crate) skills: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Skills {
            command: SkillsCommand::Import(args),
        } => run_skills_import(args),
        Command::Demo(args) => run_demo(args),
    }
}
