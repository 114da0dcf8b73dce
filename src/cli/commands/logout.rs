//! `lims logout` command

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::context::AppContext;
use crate::cli::GlobalOpts;

/// Clear every stored session value and any unsubmitted drafts
pub fn run(global: &GlobalOpts) -> Result<()> {
    let mut ctx = AppContext::load(global)?;
    ctx.session.clear();
    ctx.session.save().into_diagnostic()?;
    ctx.drafts().clear_all().into_diagnostic()?;
    tracing::info!("session and drafts cleared");

    if !global.quiet {
        println!("{} Signed out", style("✓").green());
    }
    Ok(())
}
