//! Form drafts, field descriptors, and validation
//!
//! A `FormDraft` holds the raw text a user typed for each input. Validation
//! and payload assembly read the entity's `FieldSpec`s; nothing about a
//! specific entity lives here.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::core::entity::EntityKind;
use crate::core::record::RawRecord;

static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").unwrap());
static PIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6}$").unwrap());
static ALPHA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z .'-]*$").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Extra format checks applied to non-empty values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Integer,
    Decimal,
    /// 10-digit mobile number
    Mobile,
    /// 6-digit PIN code
    PinCode,
    /// Letters, spaces, and simple name punctuation
    Alphabetic,
    Email,
    /// `#rgb` or `#rrggbb`
    HexColor,
}

impl Rule {
    fn check(self, value: &str) -> Option<&'static str> {
        let ok = match self {
            Rule::Integer => value.parse::<i64>().is_ok(),
            Rule::Decimal => value.parse::<f64>().is_ok_and(f64::is_finite),
            Rule::Mobile => MOBILE_RE.is_match(value),
            Rule::PinCode => PIN_RE.is_match(value),
            Rule::Alphabetic => ALPHA_RE.is_match(value),
            Rule::Email => EMAIL_RE.is_match(value),
            Rule::HexColor => HEX_RE.is_match(value),
        };
        if ok {
            return None;
        }
        Some(match self {
            Rule::Integer => "must be a whole number",
            Rule::Decimal => "must be a number",
            Rule::Mobile => "must be a 10-digit mobile number",
            Rule::PinCode => "must be a 6-digit PIN code",
            Rule::Alphabetic => "must contain letters only",
            Rule::Email => "must be a valid email address",
            Rule::HexColor => "must be a hex color such as #ff0000",
        })
    }
}

/// Payload field assembled from other inputs
#[derive(Debug, PartialEq, Eq)]
pub struct CompositeSpec {
    /// Input names substituted into the template
    pub parts: &'static [&'static str],
    /// Template with `{part}` placeholders
    pub template: &'static str,
}

impl CompositeSpec {
    /// Fill the template; missing parts count as "0"
    pub fn compose(&self, draft: &FormDraft) -> Option<String> {
        if self.parts.iter().all(|p| draft.get(p).is_none()) {
            return None;
        }
        let mut out = self.template.to_string();
        for part in self.parts {
            let value = draft.get(part).unwrap_or("0");
            out = out.replace(&format!("{{{}}}", part), value);
        }
        Some(out)
    }

    /// Recover part values from a composed string, matching numbers in order
    pub fn split(&self, composed: &str) -> Vec<(&'static str, String)> {
        self.parts
            .iter()
            .copied()
            .zip(NUMBER_RE.find_iter(composed).map(|m| m.as_str().to_string()))
            .collect()
    }
}

/// How an input is encoded into the request payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    /// `YYYY-MM-DD`
    Date,
    /// Boolean switch
    Toggle,
    /// Id chosen from another entity's records
    Select(EntityKind),
    /// Computed from other inputs, never typed directly
    Composite(&'static CompositeSpec),
}

/// One input of a form
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Input name used on the command line (`--set name=value`)
    pub name: &'static str,
    pub label: &'static str,
    /// Backend field name; `None` for inputs that only feed composites
    pub api_field: Option<&'static str>,
    pub kind: FieldKind,
    pub required: bool,
    pub rules: &'static [Rule],
    /// Value used when the draft has none
    pub default: Option<&'static str>,
}

impl FieldSpec {
    const fn base(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            api_field: Some(name),
            kind,
            required: false,
            rules: &[],
            default: None,
        }
    }

    pub const fn text(name: &'static str, label: &'static str, api: &'static str) -> Self {
        Self::base(name, label, FieldKind::Text).api(api)
    }

    pub const fn integer(name: &'static str, label: &'static str) -> Self {
        Self::base(name, label, FieldKind::Integer)
    }

    pub const fn decimal(name: &'static str, label: &'static str, api: &'static str) -> Self {
        Self::base(name, label, FieldKind::Decimal).api(api)
    }

    pub const fn date(name: &'static str, label: &'static str, api: &'static str) -> Self {
        Self::base(name, label, FieldKind::Date).api(api)
    }

    pub const fn toggle(name: &'static str, label: &'static str, api: &'static str) -> Self {
        Self::base(name, label, FieldKind::Toggle).api(api)
    }

    pub const fn select(
        name: &'static str,
        label: &'static str,
        api: &'static str,
        lookup: EntityKind,
    ) -> Self {
        Self::base(name, label, FieldKind::Select(lookup)).api(api)
    }

    pub const fn composite(
        name: &'static str,
        label: &'static str,
        api: &'static str,
        spec: &'static CompositeSpec,
    ) -> Self {
        Self::base(name, label, FieldKind::Composite(spec)).api(api)
    }

    pub const fn api(self, api: &'static str) -> Self {
        Self {
            api_field: Some(api),
            ..self
        }
    }

    pub const fn input_only(self) -> Self {
        Self {
            api_field: None,
            ..self
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn rules(self, rules: &'static [Rule]) -> Self {
        Self { rules, ..self }
    }

    pub const fn default_value(self, value: &'static str) -> Self {
        Self {
            default: Some(value),
            ..self
        }
    }

    /// Entity whose records fill this select input
    pub fn lookup(&self) -> Option<EntityKind> {
        match self.kind {
            FieldKind::Select(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, FieldKind::Composite(_))
    }
}

/// Validation failure for one input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Parse `true/false/yes/no/1/0/on/off`
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Split a `name=value` assignment
pub fn parse_assignment(input: &str) -> Result<(String, String), FieldError> {
    match input.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(FieldError::new(input, "expected name=value")),
    }
}

/// In-memory values of a form before submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormDraft {
    values: BTreeMap<String, String>,
}

impl FormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-empty value of an input
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an input after checking it exists and is typed directly
    pub fn set_field(
        &mut self,
        fields: &[FieldSpec],
        name: &str,
        value: &str,
    ) -> Result<(), FieldError> {
        let field = fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FieldError::new(name, "unknown field"))?;
        if field.is_composite() {
            return Err(FieldError::new(name, "computed from other fields"));
        }
        self.set(name, value);
        Ok(())
    }

    /// Prefill from a fetched record, reversing the payload mapping
    pub fn from_record(fields: &[FieldSpec], record: &RawRecord) -> Self {
        let mut draft = Self::new();
        for field in fields {
            let Some(api) = field.api_field else { continue };
            let Some(value) = record.get(api) else { continue };
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Object(obj) => match obj.get("id").or_else(|| obj.get("_id")) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => continue,
                },
                Value::Array(_) => continue,
            };
            match field.kind {
                FieldKind::Composite(spec) => {
                    for (part, value) in spec.split(&text) {
                        draft.set(part, value);
                    }
                }
                FieldKind::Date => {
                    // Timestamps come back as RFC 3339; inputs take the date part
                    draft.set(field.name, text.get(..10).unwrap_or(&text).to_string());
                }
                _ => draft.set(field.name, text),
            }
        }
        draft
    }

    /// Check every field, returning all failures in field order
    pub fn validate(&self, fields: &[FieldSpec]) -> Vec<FieldError> {
        let mut errors = Vec::new();

        for (name, _) in self.iter() {
            if !fields.iter().any(|f| f.name == name) {
                errors.push(FieldError::new(name, "unknown field"));
            }
        }

        for field in fields {
            if field.is_composite() {
                continue;
            }
            let value = self.get(field.name).or(field.default);
            let Some(value) = value.map(str::trim) else {
                if field.required {
                    errors.push(FieldError::new(
                        field.name,
                        format!("{} is required", field.label),
                    ));
                }
                continue;
            };

            let kind_error = match field.kind {
                FieldKind::Integer => Rule::Integer.check(value),
                FieldKind::Decimal => Rule::Decimal.check(value),
                FieldKind::Date => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .err()
                    .map(|_| "must be a date in YYYY-MM-DD format"),
                FieldKind::Toggle => parse_bool(value).is_none().then_some("must be true or false"),
                _ => None,
            };
            if let Some(message) = kind_error {
                errors.push(FieldError::new(field.name, format!("{} {}", field.label, message)));
                continue;
            }

            if let Some(message) = field.rules.iter().find_map(|rule| rule.check(value)) {
                errors.push(FieldError::new(field.name, format!("{} {}", field.label, message)));
            }
        }

        errors
    }

    /// Build the request body, mapping every field to its backend name
    ///
    /// Call after `validate` succeeds; unparseable numbers become `null`.
    pub fn payload(&self, fields: &[FieldSpec]) -> Value {
        let mut body = Map::new();
        for field in fields {
            let Some(api) = field.api_field else { continue };
            let raw = self.get(field.name).or(field.default).map(str::trim);
            let value = match field.kind {
                FieldKind::Text | FieldKind::Date => {
                    Value::String(raw.unwrap_or_default().to_string())
                }
                FieldKind::Integer => raw
                    .and_then(|v| v.parse::<i64>().ok())
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                FieldKind::Decimal => raw
                    .and_then(|v| v.parse::<f64>().ok())
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                FieldKind::Toggle => Value::Bool(raw.and_then(parse_bool).unwrap_or(false)),
                FieldKind::Select(_) => match raw {
                    Some(v) => v
                        .parse::<i64>()
                        .map(Value::from)
                        .unwrap_or_else(|_| Value::String(v.to_string())),
                    None => Value::Null,
                },
                FieldKind::Composite(spec) => spec
                    .compose(self)
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            };
            body.insert(api.to_string(), value);
        }
        Value::Object(body)
    }
}
