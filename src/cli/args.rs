//! Command-line arguments

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::draft::DraftCommands;
use crate::cli::commands::form::{NewArgs, UpdateArgs};
use crate::cli::commands::list::ListArgs;
use crate::cli::commands::session::SessionCommands;
use crate::cli::commands::show::ShowArgs;

#[derive(Parser, Debug)]
#[command(
    name = "lims",
    version,
    about = "Laboratory information management console",
    long_about = "Browse and maintain hospital laboratory master data, patients, \
                  and billing from the command line. Sign in once with \
                  `lims session login`; every command then uses the stored token and role.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Base URL of the LIMS API
    #[arg(long, global = true, env = "LIMS_API_URL")]
    pub api_url: Option<String>,

    /// Suppress notifications; print only requested data
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table on a terminal, TSV when piped
    Auto,
    Table,
    Tsv,
    Csv,
    Json,
    /// Record ids only, one per line
    Id,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and inspect stored session values
    #[command(subcommand)]
    Session(SessionCommands),

    /// Forget the stored session
    Logout,

    /// Show the menu of the signed-in role's application
    Menu,

    /// List records of an entity
    List(ListArgs),

    /// Show one record
    Show(ShowArgs),

    /// Create a record
    New(NewArgs),

    /// Update a record
    Update(UpdateArgs),

    /// Compose an investigation with results and line items before submitting
    #[command(subcommand)]
    Draft(DraftCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
