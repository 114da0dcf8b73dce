//! `lims new` and `lims update` commands - create and edit records

use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use miette::{IntoDiagnostic, Result};
use serde_json::Value;

use crate::cli::context::AppContext;
use crate::cli::helpers::parse_assignments;
use crate::cli::output::{effective_format, notify, print_json};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::EntityKind;
use crate::core::form::{parse_bool, FieldKind, FieldSpec};
use crate::core::record::RawRecord;
use crate::views::{FormView, Notification, SubmitOutcome};

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Field values as name=value (repeatable)
    #[arg(long = "set", short = 's', value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    #[arg(value_enum)]
    pub entity: EntityKind,

    /// Record id
    pub id: String,

    /// Field values as name=value (repeatable)
    #[arg(long = "set", short = 's', value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Prompt for every field, prefilled with current values
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

pub async fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let view = FormView::create(args.entity, &ctx.config);
    ctx.authorize(&view.route())?;
    run_form(&ctx, view, &args.set, args.interactive, global).await
}

pub async fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::load(global)?;
    let view = FormView::update(args.entity, &args.id, &ctx.config);
    ctx.authorize(&view.route())?;
    run_form(&ctx, view, &args.set, args.interactive, global).await
}

async fn run_form(
    ctx: &AppContext,
    mut view: FormView,
    set: &[String],
    interactive: bool,
    global: &GlobalOpts,
) -> Result<()> {
    let pairs = parse_assignments(set)?;
    if pairs.is_empty() && !interactive {
        return Err(miette::miette!(
            "Nothing to submit. Pass --set name=value or --interactive. Fields: {}",
            field_names(view.config().fields)
        ));
    }

    let client = ctx.client()?;
    for notification in view.load_lookups(&client).await {
        notify(&notification, global);
    }
    let name = view.config().name;
    view.load_existing(&client)
        .await
        .map_err(|e| miette::miette!("{}", e.user_message(&format!("Failed to fetch {}", name))))?;

    for (key, value) in &pairs {
        view.set(key, value)
            .map_err(|e| miette::miette!("{}", e))?;
    }
    if interactive {
        prompt_fields(&mut view)?;
    }

    let outcome = view.submit(&client).await;
    report_outcome(outcome, name, global).await
}

/// Print a submit outcome and wait out the redirect delay on a terminal
pub(crate) async fn report_outcome(
    outcome: SubmitOutcome,
    name: &str,
    global: &GlobalOpts,
) -> Result<()> {
    match outcome {
        SubmitOutcome::Invalid(errors) => {
            for error in &errors {
                notify(&Notification::error(error.to_string()), global);
            }
            Err(miette::miette!(
                "{} invalid field(s); nothing was sent",
                errors.len()
            ))
        }
        SubmitOutcome::Saved {
            notification,
            redirect,
            delay,
            response,
        } => {
            notify(&notification, global);
            match effective_format(global.output) {
                OutputFormat::Json => print_json(&response)?,
                OutputFormat::Id => {
                    if let Some(id) = saved_id(&response) {
                        println!("{}", id);
                    }
                }
                _ => {}
            }
            if Term::stderr().is_term() && !global.quiet {
                eprintln!(
                    "{} Returning to {} ({})",
                    style("→").dim(),
                    redirect,
                    style(redirect.command()).cyan()
                );
                tokio::time::sleep(delay).await;
            }
            Ok(())
        }
        SubmitOutcome::Failed(notifications) => {
            for notification in &notifications {
                notify(notification, global);
            }
            Err(miette::miette!("Failed to save {}", name))
        }
    }
}

/// Id of the saved record from a create or update response
fn saved_id(response: &Value) -> Option<String> {
    let record = response.get("data").unwrap_or(response).clone();
    RawRecord::from_value(record).and_then(|r| r.id())
}

fn field_names(fields: &[FieldSpec]) -> String {
    fields
        .iter()
        .filter(|f| !f.is_composite())
        .map(|f| if f.required { format!("{}*", f.name) } else { f.name.to_string() })
        .collect::<Vec<_>>()
        .join(", ")
}

fn prompt_fields(view: &mut FormView) -> Result<()> {
    let theme = ColorfulTheme::default();
    let fields = view.config().fields;

    for field in fields.iter().filter(|f| !f.is_composite()) {
        let current = view
            .draft()
            .get(field.name)
            .or(field.default)
            .unwrap_or_default()
            .to_string();
        let prompt = if field.required {
            format!("{} *", field.label)
        } else {
            field.label.to_string()
        };

        let value = match field.kind {
            FieldKind::Toggle => {
                let on = parse_bool(&current).unwrap_or(true);
                let choice = Select::with_theme(&theme)
                    .with_prompt(&prompt)
                    .items(&["Yes", "No"])
                    .default(if on { 0 } else { 1 })
                    .interact()
                    .into_diagnostic()?;
                (choice == 0).to_string()
            }
            FieldKind::Select(kind) if !view.options(kind).is_empty() => {
                let options = view.options(kind);
                let labels: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                let default = options.iter().position(|o| o.value == current).unwrap_or(0);
                let choice = Select::with_theme(&theme)
                    .with_prompt(&prompt)
                    .items(&labels)
                    .default(default)
                    .interact()
                    .into_diagnostic()?;
                options[choice].value.clone()
            }
            _ => Input::<String>::with_theme(&theme)
                .with_prompt(&prompt)
                .with_initial_text(current)
                .allow_empty(!field.required)
                .interact_text()
                .into_diagnostic()?,
        };

        view.set(field.name, value.trim())
            .map_err(|e| miette::miette!("{}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_saved_id_reads_wrapped_and_bare() {
        assert_eq!(saved_id(&json!({"data": {"_id": "abc"}})), Some("abc".to_string()));
        assert_eq!(saved_id(&json!({"id": 7})), Some("7".to_string()));
        assert_eq!(saved_id(&json!({"message": "ok"})), None);
    }

    #[test]
    fn test_field_names_mark_required() {
        let names = field_names(EntityKind::Department.config().fields);
        assert!(names.contains("dptname*"));
        assert!(names.contains("isactive"));
        assert!(!names.contains("isactive*"));
    }
}
