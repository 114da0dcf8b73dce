//! `lims draft` command - compose an investigation before one submit
//!
//! Drafts live on disk until submitted or discarded, so a long investigation
//! with many results can be built up across several invocations.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::json;

use crate::cli::commands::form::report_outcome;
use crate::cli::context::AppContext;
use crate::cli::helpers::{parse_assignments, truncate_str};
use crate::cli::output::{effective_format, print_json};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::draft::{DraftPath, InvestigationDraft, ResultDraft};
use crate::core::entity::EntityKind;
use crate::core::route::Route;
use crate::views::form::submit_investigation;
use crate::views::SubmitOutcome;

#[derive(Subcommand, Debug)]
pub enum DraftCommands {
    /// Start a new investigation draft
    New {
        /// Investigation fields as name=value (repeatable)
        #[arg(long = "set", short = 's', value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Start from an existing investigation; submitting updates it
        #[arg(long, value_name = "ID")]
        update: Option<String>,
    },

    /// List saved drafts
    List,

    /// Show a draft's fields and nested items
    Show {
        /// Draft id or unique prefix
        id: String,
    },

    /// Set investigation fields
    Set {
        id: String,

        #[arg(long = "set", short = 's', value_name = "NAME=VALUE", required = true)]
        set: Vec<String>,
    },

    /// Append an item (e.g. results, results/0/normal-values, consumables)
    Add {
        id: String,

        /// Collection path
        path: String,

        #[arg(long = "set", short = 's', value_name = "NAME=VALUE")]
        set: Vec<String>,
    },

    /// Change fields of one item (e.g. results/0/reflex-tests/1)
    Edit {
        id: String,

        /// Item path
        path: String,

        #[arg(long = "set", short = 's', value_name = "NAME=VALUE", required = true)]
        set: Vec<String>,
    },

    /// Delete one item; later items shift down
    Remove {
        id: String,

        /// Item path
        path: String,
    },

    /// Validate and send the whole draft as one request
    Submit { id: String },

    /// Delete a draft without submitting
    Discard { id: String },
}

pub async fn run(cmd: DraftCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::load(global)?;
    ctx.authorize(&Route::Add(EntityKind::Investigation))?;
    let store = ctx.drafts();

    match cmd {
        DraftCommands::New { set, update } => {
            let mut draft = match update {
                Some(target) => {
                    ctx.authorize(&Route::Update(EntityKind::Investigation, target.clone()))?;
                    prefill(&ctx, &target).await?
                }
                None => InvestigationDraft::new(),
            };
            set_fields(&mut draft, &set)?;
            store.save(&draft).into_diagnostic()?;
            tracing::info!(id = %draft.id, "draft created");

            if effective_format(global.output) == OutputFormat::Id {
                println!("{}", draft.id);
            } else if !global.quiet {
                println!(
                    "{} Created draft {}",
                    style("✓").green(),
                    style(&draft.id).cyan()
                );
                println!(
                    "   Add results with {}",
                    style(format!("lims draft add {} results --set name=...", draft.id)).yellow()
                );
            }
        }

        DraftCommands::List => {
            let drafts = store.list().into_diagnostic()?;
            match effective_format(global.output) {
                OutputFormat::Json => {
                    let items: Vec<_> = drafts
                        .iter()
                        .map(|d| {
                            json!({
                                "id": d.id,
                                "title": d.title(),
                                "target": d.target_id,
                                "results": d.results.len(),
                                "updated": d.updated.to_rfc3339(),
                            })
                        })
                        .collect();
                    print_json(&items)?;
                }
                OutputFormat::Id => {
                    for d in &drafts {
                        println!("{}", d.id);
                    }
                }
                OutputFormat::Table => {
                    if drafts.is_empty() {
                        println!("No drafts.");
                        return Ok(());
                    }
                    for d in &drafts {
                        println!(
                            "{}  {:<30} {} result(s)  {}",
                            style(&d.id).cyan(),
                            truncate_str(d.title(), 30),
                            d.results.len(),
                            style(d.updated.format("%Y-%m-%d %H:%M")).dim()
                        );
                    }
                }
                _ => {
                    for d in &drafts {
                        println!(
                            "{}\t{}\t{}\t{}",
                            d.id,
                            d.title(),
                            d.results.len(),
                            d.updated.to_rfc3339()
                        );
                    }
                }
            }
        }

        DraftCommands::Show { id } => {
            let draft = store.load(&id).into_diagnostic()?;
            match effective_format(global.output) {
                OutputFormat::Json => print_json(&json!({
                    "id": draft.id,
                    "target": draft.target_id,
                    "payload": draft.payload(),
                    "errors": draft.validate(),
                }))?,
                OutputFormat::Id => println!("{}", draft.id),
                _ => print_tree(&draft),
            }
        }

        DraftCommands::Set { id, set } => {
            let mut draft = store.load(&id).into_diagnostic()?;
            set_fields(&mut draft, &set)?;
            draft.updated = chrono::Utc::now();
            store.save(&draft).into_diagnostic()?;
            done(global, format!("Updated {}", draft.id));
        }

        DraftCommands::Add { id, path, set } => {
            let mut draft = store.load(&id).into_diagnostic()?;
            let path: DraftPath = path.parse().into_diagnostic()?;
            let pairs = parse_assignments(&set)?;
            let added = draft.add(&path, &pairs).into_diagnostic()?;
            store.save(&draft).into_diagnostic()?;
            if effective_format(global.output) == OutputFormat::Id {
                println!("{}", added);
            } else {
                done(global, format!("Added {}", added));
            }
        }

        DraftCommands::Edit { id, path, set } => {
            let mut draft = store.load(&id).into_diagnostic()?;
            let path: DraftPath = path.parse().into_diagnostic()?;
            let pairs = parse_assignments(&set)?;
            draft.edit(&path, &pairs).into_diagnostic()?;
            store.save(&draft).into_diagnostic()?;
            done(global, format!("Updated {}", path));
        }

        DraftCommands::Remove { id, path } => {
            let mut draft = store.load(&id).into_diagnostic()?;
            let path: DraftPath = path.parse().into_diagnostic()?;
            draft.remove(&path).into_diagnostic()?;
            store.save(&draft).into_diagnostic()?;
            done(global, format!("Removed {}", path));
        }

        DraftCommands::Submit { id } => {
            let draft = store.load(&id).into_diagnostic()?;
            let client = ctx.client()?;
            let outcome = submit_investigation(&client, &draft, &ctx.config).await;
            let saved = matches!(outcome, SubmitOutcome::Saved { .. });
            report_outcome(outcome, EntityKind::Investigation.config().name, global).await?;
            if saved {
                store.discard(&draft.id).into_diagnostic()?;
                tracing::info!(id = %draft.id, "draft submitted and removed");
            }
        }

        DraftCommands::Discard { id } => {
            let draft = store.load(&id).into_diagnostic()?;
            store.discard(&draft.id).into_diagnostic()?;
            done(global, format!("Discarded {}", draft.id));
        }
    }
    Ok(())
}

fn done(global: &GlobalOpts, message: String) {
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
}

fn set_fields(draft: &mut InvestigationDraft, set: &[String]) -> Result<()> {
    let fields = EntityKind::Investigation.config().fields;
    for (name, value) in parse_assignments(set)? {
        draft
            .form
            .set_field(fields, &name, &value)
            .map_err(|e| miette::miette!("{}", e))?;
    }
    Ok(())
}

/// Draft that updates an existing investigation, nested items included
async fn prefill(ctx: &AppContext, id: &str) -> Result<InvestigationDraft> {
    let config = EntityKind::Investigation.config();
    let client = ctx.client()?;
    let record = client.get_one(config, id).await.map_err(|e| {
        miette::miette!("{}", e.user_message(&format!("Failed to fetch {} {}", config.name, id)))
    })?;
    InvestigationDraft::from_record(id, &record).into_diagnostic()
}

fn print_tree(draft: &InvestigationDraft) {
    let title = match &draft.target_id {
        Some(target) => format!("Investigation draft {} (updates {})", draft.id, target),
        None => format!("Investigation draft {}", draft.id),
    };
    println!("{}", style(title).bold());
    println!("{}", style("─".repeat(50)).dim());

    for (name, value) in draft.form.iter() {
        println!("  {}: {}", style(name).bold(), value);
    }

    for (i, result) in draft.results.iter().enumerate() {
        print_result(i, result);
    }
    for (i, acc) in draft.accreditations.iter().enumerate() {
        let valid = acc.valid_till.map(|d| d.to_string()).unwrap_or_default();
        println!(
            "{} {} {} {}",
            style(format!("accreditations/{}", i)).cyan(),
            acc.body,
            acc.certificate_no.as_deref().unwrap_or_default(),
            style(valid).dim()
        );
    }
    for (i, item) in draft.consumables.iter().enumerate() {
        println!(
            "{} {} x{}{}",
            style(format!("consumables/{}", i)).cyan(),
            item.name,
            item.quantity,
            if item.billable { " (billable)" } else { "" }
        );
    }

    let errors = draft.validate();
    if !errors.is_empty() {
        println!();
        for error in errors {
            println!("{} {}", style("!").yellow(), error);
        }
    }
}

fn print_result(i: usize, result: &ResultDraft) {
    println!(
        "{} {} {}",
        style(format!("results/{}", i)).cyan(),
        result.name,
        style(result.unit.as_deref().unwrap_or_default()).dim()
    );
    for (j, nv) in result.normal_values.iter().enumerate() {
        println!(
            "  {} {:?} age {}-{} range {}-{}",
            style(format!("normal-values/{}", j)).dim(),
            nv.gender,
            opt(nv.age_min),
            opt(nv.age_max),
            opt(nv.min_value),
            opt(nv.max_value)
        );
    }
    for (j, mc) in result.mandatory_conditions.iter().enumerate() {
        println!(
            "  {} {}",
            style(format!("mandatory-conditions/{}", j)).dim(),
            mc.condition
        );
    }
    for (j, rt) in result.reflex_tests.iter().enumerate() {
        println!(
            "  {} {}",
            style(format!("reflex-tests/{}", j)).dim(),
            rt.test_name
        );
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "*".into())
}
