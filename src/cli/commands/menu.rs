//! `lims menu` command - the signed-in role's application

use console::style;
use miette::Result;
use serde_json::json;

use crate::cli::context::AppContext;
use crate::cli::output::{effective_format, print_json};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::role::Access;
use crate::core::route::Route;

pub fn run(global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let role = ctx.authorize(&Route::Home)?;
    let menu = role.menu();

    let access_label = |route: &Route| match route.entity().and_then(|k| role.access(k)) {
        Some(Access::ReadWrite) => "read/write",
        Some(Access::ReadOnly) => "read only",
        None => "",
    };

    match effective_format(global.output) {
        OutputFormat::Json => {
            let items: Vec<_> = menu
                .iter()
                .map(|item| {
                    json!({
                        "label": item.label,
                        "route": item.route.to_string(),
                        "command": item.route.command(),
                        "access": access_label(&item.route),
                    })
                })
                .collect();
            print_json(&json!({
                "role": role.to_string(),
                "app": role.app_name(),
                "menu": items,
            }))?;
        }
        OutputFormat::Table => {
            println!("{}", style(role.app_name()).bold());
            if let Some(hospital) = ctx.session.get(crate::core::session::KEY_HOSPITAL_NAME) {
                println!("{}", style(hospital).dim());
            }
            println!();
            let width = menu.iter().map(|i| i.label.len()).max().unwrap_or(0);
            for item in &menu {
                println!(
                    "  {:width$}  {:<22} {}",
                    item.label,
                    style(item.route.command()).cyan(),
                    style(access_label(&item.route)).dim(),
                    width = width
                );
            }
        }
        _ => {
            for item in &menu {
                println!("{}\t{}\t{}", item.label, item.route, item.route.command());
            }
        }
    }
    Ok(())
}
