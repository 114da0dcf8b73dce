//! `lims list` command - paginated, searchable entity lists

use console::style;
use miette::Result;

use crate::cli::context::AppContext;
use crate::cli::output::{effective_format, notify};
use crate::cli::table::TableFormatter;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::EntityKind;
use crate::core::pagination::PAGE_SIZE_OPTIONS;
use crate::core::route::Route;
use crate::core::search::SearchScope;
use crate::table::{SortDirection, SortState};
use crate::views::{ListView, Notification};

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Entity to list
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Page to show
    #[arg(long, short = 'p', default_value_t = 1)]
    pub page: usize,

    /// Rows per page (5, 10, 20, 50, or 100)
    #[arg(long, short = 'n', value_parser = parse_page_size)]
    pub limit: Option<usize>,

    /// Case-insensitive filter over the list's search fields
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Send the search to the server so it covers every page
    #[arg(long)]
    pub remote_search: bool,

    /// Sort by column key, ascending unless --desc is given
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, short = 'r')]
    pub desc: bool,

    /// Show every field of these record ids below the table
    #[arg(long, short = 'x', value_delimiter = ',')]
    pub expand: Vec<String>,
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    let size: usize = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if PAGE_SIZE_OPTIONS.contains(&size) {
        Ok(size)
    } else {
        Err(format!("choose one of {:?}", PAGE_SIZE_OPTIONS))
    }
}

/// Sort chosen on the command line; an explicit column sorts ascending
/// unless `--desc` is given
fn requested_sort(
    current: &SortState,
    column: Option<&str>,
    desc: bool,
) -> Option<(String, SortDirection)> {
    let direction = if desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    match column {
        Some(key) => Some((key.to_string(), direction)),
        None if desc => current.column.clone().map(|key| (key, direction)),
        None => None,
    }
}

pub async fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let route = Route::List(args.entity);
    let role = ctx.authorize(&route)?;
    let config = args.entity.config();

    if let Some(key) = &args.sort {
        if !config.columns.iter().any(|c| c.key == key) {
            let keys: Vec<&str> = config.columns.iter().map(|c| c.key).collect();
            return Err(miette::miette!(
                "Unknown sort column '{}'. Columns for {}: {}",
                key,
                config.name_plural,
                keys.join(", ")
            ));
        }
    }

    let scope = if args.remote_search {
        SearchScope::Server
    } else {
        ctx.config.search_scope
    };
    let limit = args.limit.unwrap_or(ctx.config.page_size);
    let mut view = ListView::new(args.entity, limit, scope).start_at(args.page);
    if let Some(term) = &args.search {
        view.set_search(term);
    }

    let client = ctx.client()?;
    view.fetch(&client).await;
    if let Some(error) = view.error() {
        return Err(miette::miette!("{}", error));
    }

    let mut table = view.table();
    if let Some((key, direction)) = requested_sort(table.sort(), args.sort.as_deref(), args.desc) {
        table = table.with_default_sort(&key, direction);
    }
    for id in &args.expand {
        if !table.toggle_details(id) {
            tracing::warn!(id = %id, "no row with this id on the page");
        }
    }

    let format = effective_format(global.output);
    TableFormatter::new(&table, config.name_plural).output(format)?;

    if format == OutputFormat::Table && !global.quiet {
        if args.page > view.pagination().current_page {
            let message = format!(
                "Only {} page(s); showing page {}",
                view.pagination().total_pages,
                view.pagination().current_page
            );
            notify(&Notification::info(message), global);
        }
        if role.guard(&view.add_new()).is_ok() {
            eprintln!(
                "{} Add new: {}",
                style("→").dim(),
                style(view.add_new().command()).cyan()
            );
        }
    }
    Ok(())
}
