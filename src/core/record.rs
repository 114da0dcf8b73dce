//! Raw backend records and their mapping to display rows

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::core::entity::{EntityConfig, FieldSource};
use crate::table::{CellValue, TableRow};

/// A JSON object as returned by the backend
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wrap a JSON value; `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Follow a nested object path
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(*first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    /// Record id from `id` or `_id`, numeric or string
    pub fn id(&self) -> Option<String> {
        match self.0.get("id").or_else(|| self.0.get("_id"))? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Top-level scalar fields as display pairs, for detail rows
    pub fn scalar_fields(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter_map(|(k, v)| scalar_text(v).map(|text| (k.clone(), text)))
            .collect()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp to a calendar date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok())
}

fn flag_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => crate::core::form::parse_bool(s),
        _ => None,
    }
}

/// Resolve one column of a raw record to a display cell
pub fn cell_for(record: &RawRecord, source: FieldSource) -> CellValue {
    match source {
        FieldSource::Field(field) => record
            .get(field)
            .and_then(scalar_text)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Empty),
        FieldSource::Path(path) => record
            .get_path(path)
            .and_then(scalar_text)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Empty),
        FieldSource::Flag { field, on, off } => match record.get(field).and_then(flag_value) {
            Some(true) => CellValue::text(on),
            Some(false) => CellValue::text(off),
            None => CellValue::Empty,
        },
        FieldSource::Date(field) => match record.get(field) {
            Some(Value::String(s)) => parse_date(s)
                .map(CellValue::Date)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
            _ => CellValue::Empty,
        },
        FieldSource::Number(field) => match record.get(field) {
            Some(Value::Number(n)) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Empty),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or_else(|_| CellValue::Text(s.clone())),
            _ => CellValue::Empty,
        },
    }
}

/// Map a raw record to the display row of its entity's list view
///
/// `position` stands in for the id when the backend omits one.
pub fn map_record(config: &EntityConfig, record: &RawRecord, position: usize) -> TableRow {
    let id = record.id().unwrap_or_else(|| format!("#{}", position + 1));
    let row = config
        .columns
        .iter()
        .fold(TableRow::new(id), |row, column| {
            row.cell(column.key, cell_for(record, column.source))
        });
    row.with_details(record.scalar_fields())
}

/// Map a fetched page, warning about duplicated ids
pub fn map_records(config: &EntityConfig, records: &[RawRecord]) -> Vec<TableRow> {
    let rows: Vec<TableRow> = records
        .iter()
        .enumerate()
        .map(|(i, record)| map_record(config, record, i))
        .collect();
    for id in ensure_unique_ids(&rows) {
        tracing::warn!(entity = config.name, id = %id, "duplicate id within one page");
    }
    rows
}

/// Ids that occur more than once, in first-repeat order
pub fn ensure_unique_ids(rows: &[TableRow]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut repeated = Vec::new();
    for row in rows {
        if !seen.insert(row.id.as_str()) && !repeated.contains(&row.id.as_str()) {
            repeated.push(row.id.as_str());
        }
    }
    repeated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityKind;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_active_flag_literals() {
        let config = EntityKind::Department.config();
        let active = map_record(config, &record(json!({"id": 1, "isactive": true})), 0);
        let inactive = map_record(config, &record(json!({"id": 2, "isactive": false})), 1);
        assert_eq!(active.get("status").to_string(), "Active");
        assert_eq!(inactive.get("status").to_string(), "Inactive");
    }

    #[test]
    fn test_nested_path_flattened() {
        let config = EntityKind::SubDepartment.config();
        let row = map_record(
            config,
            &record(json!({
                "id": "a1",
                "subdptname": "Serology",
                "department": {"id": 4, "dptname": "Microbiology"}
            })),
            0,
        );
        assert_eq!(row.id, "a1");
        assert_eq!(row.get("department").to_string(), "Microbiology");
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let config = EntityKind::SubDepartment.config();
        let row = map_record(config, &record(json!({"id": 1, "department": null})), 0);
        assert_eq!(row.get("department"), &CellValue::Empty);
        assert_eq!(row.get("name").to_string(), "");
    }

    #[test]
    fn test_dates_and_numbers() {
        let config = EntityKind::Investigation.config();
        let row = map_record(
            config,
            &record(json!({"_id": "x", "normalprice": "250.5"})),
            0,
        );
        assert_eq!(row.id, "x");
        assert_eq!(row.get("price"), &CellValue::Number(250.5));

        assert_eq!(
            parse_date("2024-03-05T10:15:00.000Z"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(parse_date("2024-03-05"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_missing_id_uses_position() {
        let config = EntityKind::Color.config();
        let rows = map_records(
            config,
            &[record(json!({"colorname": "Red"})), record(json!({"colorname": "Blue"}))],
        );
        assert_eq!(rows[0].id, "#1");
        assert_eq!(rows[1].id, "#2");
    }

    #[test]
    fn test_duplicate_ids_reported_once() {
        let config = EntityKind::Role.config();
        let rows = map_records(
            config,
            &[
                record(json!({"id": 1})),
                record(json!({"id": 2})),
                record(json!({"id": 1})),
                record(json!({"id": 1})),
            ],
        );
        assert_eq!(ensure_unique_ids(&rows), vec!["1"]);
    }

    #[test]
    fn test_scalar_fields_skip_objects() {
        let rec = record(json!({"id": 1, "name": "A", "department": {"id": 2}, "tags": []}));
        let fields = rec.scalar_fields();
        assert_eq!(
            fields,
            vec![
                ("id".to_string(), "1".to_string()),
                ("name".to_string(), "A".to_string())
            ]
        );
    }
}
