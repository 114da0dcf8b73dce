//! Shared helper functions for CLI commands

use miette::Result;

use crate::core::form::parse_assignment;

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a value for one TSV cell
pub fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

/// Parse repeated `--set name=value` arguments
pub fn parse_assignments(values: &[String]) -> Result<Vec<(String, String)>> {
    values
        .iter()
        .map(|v| parse_assignment(v).map_err(|e| miette::miette!("Invalid --set '{}': {}", v, e.message)))
        .collect()
}
