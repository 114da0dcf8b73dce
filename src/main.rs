use clap::Parser;
use miette::Result;

use lims::cli::commands::{completions, draft, form, list, logout, menu, session, show};
use lims::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    lims::logging::init(cli.global.verbose);
    let global = &cli.global;

    match cli.command {
        Commands::Session(cmd) => session::run(cmd, global),
        Commands::Logout => logout::run(global),
        Commands::Menu => menu::run(global),
        Commands::List(args) => list::run(args, global).await,
        Commands::Show(args) => show::run(args, global).await,
        Commands::New(args) => form::run_new(args, global).await,
        Commands::Update(args) => form::run_update(args, global).await,
        Commands::Draft(cmd) => draft::run(cmd, global).await,
        Commands::Completions(args) => completions::run(args),
    }
}
