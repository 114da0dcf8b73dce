//! `lims session` command - sign-in state

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::{Map, Value};

use crate::cli::context::AppContext;
use crate::cli::output::{effective_format, print_json};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::role::Role;
use crate::core::session::{Login, KEY_AUTH_TOKEN};

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Store a bearer token and role issued by the LIMS sign-in service
    Login(LoginArgs),

    /// Show stored session values
    Show,
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Bearer token sent with every request
    #[arg(long, env = "LIMS_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Role whose application to open
    #[arg(long, short = 'r', value_enum)]
    pub role: Role,

    /// Role type reported by the sign-in service
    #[arg(long)]
    pub role_type: Option<String>,

    #[arg(long)]
    pub user_id: Option<String>,

    #[arg(long)]
    pub hospital_id: Option<String>,

    #[arg(long)]
    pub hospital_name: Option<String>,

    #[arg(long)]
    pub nodal_id: Option<String>,

    #[arg(long)]
    pub nodal_name: Option<String>,
}

pub fn run(cmd: SessionCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SessionCommands::Login(args) => run_login(args, global),
        SessionCommands::Show => run_show(global),
    }
}

fn run_login(args: LoginArgs, global: &GlobalOpts) -> Result<()> {
    if args.token.trim().is_empty() {
        return Err(miette::miette!("Token must not be empty"));
    }
    let mut ctx = AppContext::load(global)?;
    let role = args.role;
    ctx.session.login(Login {
        token: args.token,
        role,
        role_type: args.role_type,
        user_id: args.user_id,
        hospital_id: args.hospital_id,
        hospital_name: args.hospital_name,
        nodal_id: args.nodal_id,
        nodal_name: args.nodal_name,
    });
    ctx.session.save().into_diagnostic()?;
    tracing::info!(%role, "signed in");

    if !global.quiet {
        println!(
            "{} Signed in as {} ({})",
            style("✓").green(),
            style(role).cyan(),
            role.app_name()
        );
        println!("   Run {} to see your menu", style("lims menu").yellow());
    }
    Ok(())
}

/// Token shown with only its last four characters
fn mask(token: &str) -> String {
    let count = token.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let entries: Vec<(&str, String)> = ctx
        .session
        .entries()
        .map(|(k, v)| {
            let shown = if k == KEY_AUTH_TOKEN { mask(v) } else { v.to_string() };
            (k, shown)
        })
        .collect();

    match effective_format(global.output) {
        OutputFormat::Json => {
            let map: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v)))
                .collect();
            print_json(&map)?;
        }
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("Not signed in.");
                return Ok(());
            }
            let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (key, value) in entries {
                println!("{:width$}  {}", style(key).bold(), value, width = width);
            }
        }
        _ => {
            for (key, value) in entries {
                println!("{}\t{}", key, value);
            }
        }
    }
    Ok(())
}
