//! Table rendering for list output
//!
//! Renders a [`TableView`] as a boxed table, TSV, CSV, JSON, or bare ids.
//! Sorting, paging, and expanded rows come from the view; this module only
//! turns the visible rows into text.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::helpers::{escape_tsv, truncate_str};
use crate::cli::OutputFormat;
use crate::table::{TableRow, TableView};

/// Widest cell in table format before truncation
const MAX_CELL_WIDTH: usize = 40;

pub struct TableFormatter<'a> {
    table: &'a TableView,
    /// Plural entity name for the footer (e.g., "departments")
    entity_plural: &'a str,
}

impl<'a> TableFormatter<'a> {
    pub fn new(table: &'a TableView, entity_plural: &'a str) -> Self {
        Self {
            table,
            entity_plural,
        }
    }

    /// Print in `format` to stdout
    pub fn output(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table | OutputFormat::Auto => {
                println!("{}", self.render_table());
                println!("{}", style(self.footer()).dim());
            }
            OutputFormat::Tsv => print!("{}", self.render_tsv()),
            OutputFormat::Csv => print!("{}", self.render_csv()?),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&self.render_json()).into_diagnostic()?;
                println!("{}", json);
            }
            OutputFormat::Id => {
                for row in self.table.visible_rows() {
                    println!("{}", row.id);
                }
            }
        }
        Ok(())
    }

    /// Header labels, the sorted column marked with its direction
    fn headers(&self) -> Vec<String> {
        let sort = self.table.sort();
        self.table
            .columns()
            .iter()
            .map(|c| {
                if sort.column.as_deref() == Some(c.key.as_str()) {
                    format!("{} {}", c.label, sort.direction.arrow())
                } else {
                    c.label.clone()
                }
            })
            .collect()
    }

    pub fn render_table(&self) -> String {
        let rows = self.table.visible_rows();
        if rows.is_empty() {
            return format!("No {} found.", self.entity_plural);
        }

        let mut builder = Builder::default();
        let mut header = vec!["ID".to_string()];
        header.extend(self.headers());
        builder.push_record(header);
        for row in &rows {
            let mut record = vec![row.id.clone()];
            record.extend(
                row.values(self.table.columns())
                    .iter()
                    .map(|v| truncate_str(v, MAX_CELL_WIDTH)),
            );
            builder.push_record(record);
        }
        let mut table = builder.build();
        table.with(Style::rounded());

        let mut out = table.to_string();
        for row in rows.iter().filter(|r| self.table.is_expanded(&r.id)) {
            out.push('\n');
            out.push_str(&render_details(row));
        }
        out
    }

    /// "Page 1 of 3 · 24 departments"
    pub fn footer(&self) -> String {
        format!(
            "Page {} of {} · {} {} · {} per page",
            self.table.current_page(),
            self.table.page_count(),
            self.table.total_items(),
            self.entity_plural,
            self.table.items_per_page()
        )
    }

    pub fn render_tsv(&self) -> String {
        let mut out = String::new();
        let mut header = vec!["id".to_string()];
        header.extend(self.table.columns().iter().map(|c| c.key.clone()));
        out.push_str(&header.join("\t"));
        out.push('\n');
        for row in self.table.visible_rows() {
            let mut cells = vec![escape_tsv(&row.id)];
            cells.extend(row.values(self.table.columns()).iter().map(|v| escape_tsv(v)));
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        out
    }

    pub fn render_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["id".to_string()];
        header.extend(self.table.columns().iter().map(|c| c.key.clone()));
        writer.write_record(&header).into_diagnostic()?;
        for row in self.table.visible_rows() {
            let mut record = vec![row.id.clone()];
            record.extend(row.values(self.table.columns()));
            writer.write_record(&record).into_diagnostic()?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| miette::miette!("CSV output failed: {}", e))?;
        String::from_utf8(bytes).into_diagnostic()
    }

    /// Visible rows plus paging totals
    pub fn render_json(&self) -> Value {
        let rows: Vec<Value> = self
            .table
            .visible_rows()
            .into_iter()
            .map(|row| {
                let mut obj = Map::new();
                obj.insert("id".into(), Value::String(row.id.clone()));
                for column in self.table.columns() {
                    obj.insert(column.key.clone(), Value::String(row.get(&column.key).to_string()));
                }
                if self.table.is_expanded(&row.id) {
                    let details: Map<String, Value> = row
                        .details()
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    obj.insert("details".into(), Value::Object(details));
                }
                Value::Object(obj)
            })
            .collect();

        serde_json::json!({
            "page": self.table.current_page(),
            "totalPages": self.table.page_count(),
            "totalItems": self.table.total_items(),
            "limit": self.table.items_per_page(),
            "data": rows,
        })
    }
}

/// Indented key/value block shown under an expanded row
fn render_details(row: &TableRow) -> String {
    let width = row.details().iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = format!("{} {}\n", style("▸").cyan(), style(&row.id).bold());
    for (key, value) in row.details() {
        out.push_str(&format!("    {:width$}  {}\n", key, value, width = width));
    }
    out
}
