//! Search over list rows

use serde::{Deserialize, Serialize};

use crate::table::TableRow;

/// Where a list search is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Filter only the page already fetched
    #[default]
    Page,
    /// Also send the term to the backend as a `search` query parameter
    Server,
}

/// Case-insensitive substring match over the given display fields
///
/// A blank term matches every row.
pub fn matches(row: &TableRow, fields: &[&str], term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .any(|field| row.get(field).to_string().to_lowercase().contains(&needle))
}

/// Rows of `rows` matching `term` in at least one of `fields`, in original order
pub fn filter_rows<'a>(rows: &'a [TableRow], fields: &[&str], term: &str) -> Vec<&'a TableRow> {
    rows.iter().filter(|row| matches(row, fields, term)).collect()
}
