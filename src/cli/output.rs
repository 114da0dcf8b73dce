//! Output formatting utilities

use console::{style, Term};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::views::{Level, Notification};

/// Resolve `Auto` against whether stdout is a terminal
pub fn effective_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if Term::stdout().is_term() {
                OutputFormat::Table
            } else {
                OutputFormat::Tsv
            }
        }
        other => other,
    }
}

/// Print a notification to stderr, styled by level
pub fn notify(notification: &Notification, global: &GlobalOpts) {
    if global.quiet && !notification.is_error() {
        return;
    }
    match notification.level {
        Level::Success => eprintln!("{} {}", style("✓").green(), notification.message),
        Level::Info => eprintln!("{} {}", style("•").cyan(), notification.message),
        Level::Error => eprintln!("{} {}", style("✗").red(), notification.message),
    }
}

/// Pretty JSON to stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}
