//! Wire shapes of the LIMS REST API

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::entity::EntityConfig;
use crate::core::form::FieldError;
use crate::core::pagination::PageMeta;
use crate::core::record::RawRecord;

/// Body of a list endpoint
///
/// Paginated endpoints wrap records with totals; older endpoints return a
/// bare array of every record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse {
    Paged { data: Vec<Value>, meta: PageMeta },
    Wrapped { data: Vec<Value> },
    Bare(Vec<Value>),
}

impl ListResponse {
    /// Records and totals; totals are absent for unpaginated bodies
    pub fn into_parts(self) -> (Vec<Value>, Option<PageMeta>) {
        match self {
            ListResponse::Paged { data, meta } => (data, Some(meta)),
            ListResponse::Wrapped { data } | ListResponse::Bare(data) => (data, None),
        }
    }
}

/// Error body of a failed request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

/// One choice of a select input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupOption {
    /// Record id submitted in the payload
    pub value: String,
    pub label: String,
}

impl LookupOption {
    /// Build from a record of the looked-up entity
    pub fn from_record(config: &EntityConfig, record: &RawRecord) -> Option<Self> {
        let value = record.id()?;
        let label = match record.get(config.option_label) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => value.clone(),
        };
        Some(Self { value, label })
    }
}

impl std::fmt::Display for LookupOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.value)
    }
}
