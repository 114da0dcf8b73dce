//! `lims show` command - one record's fields

use console::style;
use miette::Result;

use crate::cli::context::AppContext;
use crate::cli::output::{effective_format, print_json};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::EntityKind;
use crate::core::record::{cell_for, RawRecord};
use crate::core::role::Access;
use crate::core::route::Route;

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Record id
    pub id: String,
}

pub async fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let role = ctx.authorize(&Route::Show(args.entity, args.id.clone()))?;
    let config = args.entity.config();

    let client = ctx.client()?;
    let record = client.get_one(config, &args.id).await.map_err(|e| {
        miette::miette!("{}", e.user_message(&format!("Failed to fetch {} {}", config.name, args.id)))
    })?;

    match effective_format(global.output) {
        OutputFormat::Json => print_json(record.as_map())?,
        OutputFormat::Id => println!("{}", record.id().unwrap_or(args.id)),
        OutputFormat::Table => {
            print_pretty(&record, args.entity);
            if role.access(args.entity) == Some(Access::ReadWrite) && !global.quiet {
                let update = Route::Update(args.entity, args.id);
                eprintln!("{} Update: {}", style("→").dim(), style(update.command()).cyan());
            }
        }
        _ => {
            for (key, value) in record.scalar_fields() {
                println!("{}\t{}", key, value);
            }
        }
    }
    Ok(())
}

fn print_pretty(record: &RawRecord, kind: EntityKind) {
    let config = kind.config();
    println!(
        "{} {}",
        style(config.title()).bold(),
        style(record.id().unwrap_or_default()).cyan()
    );
    println!("{}", style("─".repeat(50)).dim());

    let width = config.columns.iter().map(|c| c.label.len()).max().unwrap_or(0);
    for column in config.columns {
        let value = cell_for(record, column.source).to_string();
        if !value.is_empty() {
            println!("{:width$}  {}", style(column.label).bold(), value, width = width);
        }
    }

    let fields = record.scalar_fields();
    if !fields.is_empty() {
        println!();
        println!("{}", style("All fields").dim());
        for (key, value) in fields {
            println!("  {}: {}", key, value);
        }
    }
}
