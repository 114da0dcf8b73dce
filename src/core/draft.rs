//! Investigation drafts
//!
//! An investigation is composed as one tree before a single submit: the
//! top-level form, its results (each with normal value ranges, mandatory
//! conditions, and reflex tests), and accreditation and consumable line
//! items. Sub-editors address nodes by [`DraftPath`] such as
//! `results/0/normal-values/1`. The whole tree is persisted as one file
//! keyed by the draft id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

use crate::core::entity::EntityKind;
use crate::core::form::{parse_bool, FieldError, FormDraft};
use crate::core::record::RawRecord;

const DRAFTS_DIR: &str = "drafts";

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Invalid draft path '{0}'. Expected e.g. results, results/0, results/0/normal-values/1")]
    InvalidPath(String),

    #[error("{0} needs an index")]
    MissingIndex(String),

    #[error("{0} is a single item; drop the trailing index to add")]
    UnexpectedIndex(String),

    #[error("Nothing at {0}")]
    NotFound(String),

    #[error("Unknown field '{field}' for {node}")]
    UnknownField { node: &'static str, field: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Cannot read {field} of the existing investigation: {message}")]
    Nested { field: &'static str, message: String },

    #[error("No draft with id {0}")]
    NoSuchDraft(String),

    #[error("Draft file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn invalid(field: &str, message: impl Into<String>) -> DraftError {
    DraftError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<Option<T>, DraftError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| invalid(field, format!("'{}' is not a number", value)))
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Field-level editing shared by every node type
pub trait DraftNode: Default + Clone {
    const NAME: &'static str;

    /// Set one field from its text form
    fn apply(&mut self, field: &str, value: &str) -> Result<(), DraftError>;

    /// Problems that block submission, prefixed with the node's path
    fn check(&self, path: &str) -> Vec<FieldError>;

    /// Build a node from `field=value` pairs
    fn from_pairs(pairs: &[(String, String)]) -> Result<Self, DraftError> {
        let mut node = Self::default();
        node.apply_all(pairs)?;
        Ok(node)
    }

    fn apply_all(&mut self, pairs: &[(String, String)]) -> Result<(), DraftError> {
        for (field, value) in pairs {
            self.apply(field, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Any,
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" | "all" | "both" | "" => Ok(Gender::Any),
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(invalid("gender", format!("'{}' is not any, male, or female", other))),
        }
    }
}

/// Reference range for one demographic band
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalValue {
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Free-text range for non-numeric results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DraftNode for NormalValue {
    const NAME: &'static str = "normal value";

    fn apply(&mut self, field: &str, value: &str) -> Result<(), DraftError> {
        match field {
            "gender" => self.gender = value.parse()?,
            "age_min" => self.age_min = parse_number(field, value)?,
            "age_max" => self.age_max = parse_number(field, value)?,
            "min" => self.min_value = parse_number(field, value)?,
            "max" => self.max_value = parse_number(field, value)?,
            "text" => self.text = optional(value),
            _ => {
                return Err(DraftError::UnknownField {
                    node: Self::NAME,
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }

    fn check(&self, path: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let (Some(lo), Some(hi)) = (self.age_min, self.age_max) {
            if lo > hi {
                errors.push(FieldError::new(path, "age_min is greater than age_max"));
            }
        }
        if let (Some(lo), Some(hi)) = (self.min_value, self.max_value) {
            if lo > hi {
                errors.push(FieldError::new(path, "min is greater than max"));
            }
        }
        if self.min_value.is_none() && self.max_value.is_none() && self.text.is_none() {
            errors.push(FieldError::new(path, "needs min, max, or text"));
        }
        errors
    }
}

/// Condition that must hold before a result is reported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MandatoryCondition {
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl DraftNode for MandatoryCondition {
    const NAME: &'static str = "mandatory condition";

    fn apply(&mut self, field: &str, value: &str) -> Result<(), DraftError> {
        match field {
            "condition" => self.condition = value.trim().to_string(),
            "value" => self.value = optional(value),
            _ => {
                return Err(DraftError::UnknownField {
                    node: Self::NAME,
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }

    fn check(&self, path: &str) -> Vec<FieldError> {
        if self.condition.is_empty() {
            vec![FieldError::new(path, "condition is required")]
        } else {
            Vec::new()
        }
    }
}

/// Follow-up test ordered when a result meets a condition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReflexTest {
    pub test_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl DraftNode for ReflexTest {
    const NAME: &'static str = "reflex test";

    fn apply(&mut self, field: &str, value: &str) -> Result<(), DraftError> {
        match field {
            "test" | "test_name" => self.test_name = value.trim().to_string(),
            "condition" => self.condition = optional(value),
            _ => {
                return Err(DraftError::UnknownField {
                    node: Self::NAME,
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }

    fn check(&self, path: &str) -> Vec<FieldError> {
        if self.test_name.is_empty() {
            vec![FieldError::new(path, "test is required")]
        } else {
            Vec::new()
        }
    }
}

/// One reported result of an investigation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResultDraft {
    #[serde(rename = "resultname")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default)]
    pub normal_values: Vec<NormalValue>,
    #[serde(default)]
    pub mandatory_conditions: Vec<MandatoryCondition>,
    #[serde(default)]
    pub reflex_tests: Vec<ReflexTest>,
}

impl DraftNode for ResultDraft {
    const NAME: &'static str = "result";

    fn apply(&mut self, field: &str, value: &str) -> Result<(), DraftError> {
        match field {
            "name" => self.name = value.trim().to_string(),
            "unit" => self.unit = optional(value),
            "formula" => self.formula = optional(value),
            _ => {
                return Err(DraftError::UnknownField {
                    node: Self::NAME,
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }

    fn check(&self, path: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(FieldError::new(path, "name is required"));
        }
        for (i, nv) in self.normal_values.iter().enumerate() {
            errors.extend(nv.check(&format!("{}/normal-values/{}", path, i)));
        }
        for (i, mc) in self.mandatory_conditions.iter().enumerate() {
            errors.extend(mc.check(&format!("{}/mandatory-conditions/{}", path, i)));
        }
        for (i, rt) in self.reflex_tests.iter().enumerate() {
            errors.extend(rt.check(&format!("{}/reflex-tests/{}", path, i)));
        }
        errors
    }
}

/// Accreditation held for the investigation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Accreditation {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_till: Option<NaiveDate>,
}

impl DraftNode for Accreditation {
    const NAME: &'static str = "accreditation";

    fn apply(&mut self, field: &str, value: &str) -> Result<(), DraftError> {
        match field {
            "body" => self.body = value.trim().to_string(),
            "certificate" | "certificate_no" => self.certificate_no = optional(value),
            "valid_till" => {
                self.valid_till = match optional(value) {
                    Some(v) => Some(
                        NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                            .map_err(|_| invalid(field, "expected YYYY-MM-DD"))?,
                    ),
                    None => None,
                }
            }
            _ => {
                return Err(DraftError::UnknownField {
                    node: Self::NAME,
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }

    fn check(&self, path: &str) -> Vec<FieldError> {
        if self.body.is_empty() {
            vec![FieldError::new(path, "body is required")]
        } else {
            Vec::new()
        }
    }
}

/// Consumable used per test run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Consumable {
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub billable: bool,
}

impl DraftNode for Consumable {
    const NAME: &'static str = "consumable";

    fn apply(&mut self, field: &str, value: &str) -> Result<(), DraftError> {
        match field {
            "name" => self.name = value.trim().to_string(),
            "quantity" => self.quantity = parse_number(field, value)?.unwrap_or(0),
            "billable" => {
                self.billable =
                    parse_bool(value).ok_or_else(|| invalid(field, "expected true or false"))?
            }
            _ => {
                return Err(DraftError::UnknownField {
                    node: Self::NAME,
                    field: field.to_string(),
                })
            }
        }
        Ok(())
    }

    fn check(&self, path: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(FieldError::new(path, "name is required"));
        }
        if self.quantity == 0 {
            errors.push(FieldError::new(path, "quantity must be at least 1"));
        }
        errors
    }
}

/// Repeatable collections inside a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Results,
    NormalValues,
    MandatoryConditions,
    ReflexTests,
    Accreditations,
    Consumables,
}

impl Collection {
    fn segment(self) -> &'static str {
        match self {
            Collection::Results => "results",
            Collection::NormalValues => "normal-values",
            Collection::MandatoryConditions => "mandatory-conditions",
            Collection::ReflexTests => "reflex-tests",
            Collection::Accreditations => "accreditations",
            Collection::Consumables => "consumables",
        }
    }

    fn nested(segment: &str) -> Option<Self> {
        match segment {
            "normal-values" => Some(Collection::NormalValues),
            "mandatory-conditions" => Some(Collection::MandatoryConditions),
            "reflex-tests" => Some(Collection::ReflexTests),
            _ => None,
        }
    }

    fn top_level(segment: &str) -> Option<Self> {
        match segment {
            "results" => Some(Collection::Results),
            "accreditations" => Some(Collection::Accreditations),
            "consumables" => Some(Collection::Consumables),
            _ => None,
        }
    }
}

/// Address of a collection or one item within a draft tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftPath {
    /// Owning result for nested collections
    pub result: Option<usize>,
    pub collection: Collection,
    /// Item index; `None` addresses the collection itself
    pub index: Option<usize>,
}

impl FromStr for DraftPath {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DraftError::InvalidPath(s.to_string());
        let segments: Vec<&str> = s.trim_matches('/').split('/').collect();
        let index = |seg: &str| seg.parse::<usize>().map_err(|_| err());

        match segments.as_slice() {
            [top] => Ok(DraftPath {
                result: None,
                collection: Collection::top_level(top).ok_or_else(err)?,
                index: None,
            }),
            [top, i] => Ok(DraftPath {
                result: None,
                collection: Collection::top_level(top).ok_or_else(err)?,
                index: Some(index(i)?),
            }),
            ["results", r, nested] => Ok(DraftPath {
                result: Some(index(r)?),
                collection: Collection::nested(nested).ok_or_else(err)?,
                index: None,
            }),
            ["results", r, nested, i] => Ok(DraftPath {
                result: Some(index(r)?),
                collection: Collection::nested(nested).ok_or_else(err)?,
                index: Some(index(i)?),
            }),
            _ => Err(err()),
        }
    }
}

impl std::fmt::Display for DraftPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(r) = self.result {
            write!(f, "results/{}/", r)?;
        }
        write!(f, "{}", self.collection.segment())?;
        if let Some(i) = self.index {
            write!(f, "/{}", i)?;
        }
        Ok(())
    }
}

fn add_to<T: DraftNode>(list: &mut Vec<T>, pairs: &[(String, String)]) -> Result<usize, DraftError> {
    list.push(T::from_pairs(pairs)?);
    Ok(list.len() - 1)
}

fn edit_in<T: DraftNode>(
    list: &mut [T],
    index: usize,
    pairs: &[(String, String)],
    path: &DraftPath,
) -> Result<(), DraftError> {
    let node = list
        .get_mut(index)
        .ok_or_else(|| DraftError::NotFound(path.to_string()))?;
    // Apply to a copy so a bad pair leaves the node untouched
    let mut updated = node.clone();
    updated.apply_all(pairs)?;
    *node = updated;
    Ok(())
}

fn remove_from<T>(list: &mut Vec<T>, index: usize, path: &DraftPath) -> Result<(), DraftError> {
    if index >= list.len() {
        return Err(DraftError::NotFound(path.to_string()));
    }
    list.remove(index);
    Ok(())
}

fn nested<T: DeserializeOwned>(record: &RawRecord, field: &'static str) -> Result<Vec<T>, DraftError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| DraftError::Nested {
            field,
            message: e.to_string(),
        }),
    }
}

/// Whole investigation being composed before submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationDraft {
    pub id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Record being edited; `None` creates a new investigation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default)]
    pub form: FormDraft,
    #[serde(default)]
    pub results: Vec<ResultDraft>,
    #[serde(default)]
    pub accreditations: Vec<Accreditation>,
    #[serde(default)]
    pub consumables: Vec<Consumable>,
}

impl InvestigationDraft {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new().to_string(),
            created: now,
            updated: now,
            target_id: None,
            form: FormDraft::new(),
            results: Vec::new(),
            accreditations: Vec::new(),
            consumables: Vec::new(),
        }
    }

    /// Draft that updates an existing investigation, nested items included
    ///
    /// Fails rather than dropping items, since submitting replaces every
    /// nested collection on the server.
    pub fn from_record(target_id: &str, record: &RawRecord) -> Result<Self, DraftError> {
        let mut draft = Self::new();
        draft.target_id = Some(target_id.to_string());
        draft.form = FormDraft::from_record(EntityKind::Investigation.config().fields, record);
        draft.results = nested(record, "results")?;
        draft.accreditations = nested(record, "accreditations")?;
        draft.consumables = nested(record, "consumables")?;
        Ok(draft)
    }

    fn result_mut(&mut self, path: &DraftPath) -> Result<&mut ResultDraft, DraftError> {
        let r = path.result.ok_or_else(|| DraftError::InvalidPath(path.to_string()))?;
        self.results
            .get_mut(r)
            .ok_or_else(|| DraftError::NotFound(format!("results/{}", r)))
    }

    /// Append a node to the collection at `path`; returns the new node's path
    pub fn add(
        &mut self,
        path: &DraftPath,
        pairs: &[(String, String)],
    ) -> Result<DraftPath, DraftError> {
        if path.index.is_some() {
            return Err(DraftError::UnexpectedIndex(path.to_string()));
        }
        let index = match path.collection {
            Collection::Results => add_to(&mut self.results, pairs)?,
            Collection::Accreditations => add_to(&mut self.accreditations, pairs)?,
            Collection::Consumables => add_to(&mut self.consumables, pairs)?,
            Collection::NormalValues => add_to(&mut self.result_mut(path)?.normal_values, pairs)?,
            Collection::MandatoryConditions => {
                add_to(&mut self.result_mut(path)?.mandatory_conditions, pairs)?
            }
            Collection::ReflexTests => add_to(&mut self.result_mut(path)?.reflex_tests, pairs)?,
        };
        self.touch();
        Ok(DraftPath {
            index: Some(index),
            ..*path
        })
    }

    /// Update fields of the node at `path`
    pub fn edit(&mut self, path: &DraftPath, pairs: &[(String, String)]) -> Result<(), DraftError> {
        let index = path
            .index
            .ok_or_else(|| DraftError::MissingIndex(path.to_string()))?;
        match path.collection {
            Collection::Results => edit_in(&mut self.results, index, pairs, path)?,
            Collection::Accreditations => edit_in(&mut self.accreditations, index, pairs, path)?,
            Collection::Consumables => edit_in(&mut self.consumables, index, pairs, path)?,
            Collection::NormalValues => {
                edit_in(&mut self.result_mut(path)?.normal_values, index, pairs, path)?
            }
            Collection::MandatoryConditions => edit_in(
                &mut self.result_mut(path)?.mandatory_conditions,
                index,
                pairs,
                path,
            )?,
            Collection::ReflexTests => {
                edit_in(&mut self.result_mut(path)?.reflex_tests, index, pairs, path)?
            }
        }
        self.touch();
        Ok(())
    }

    /// Delete the node at `path`; later siblings shift down by one
    pub fn remove(&mut self, path: &DraftPath) -> Result<(), DraftError> {
        let index = path
            .index
            .ok_or_else(|| DraftError::MissingIndex(path.to_string()))?;
        match path.collection {
            Collection::Results => remove_from(&mut self.results, index, path)?,
            Collection::Accreditations => remove_from(&mut self.accreditations, index, path)?,
            Collection::Consumables => remove_from(&mut self.consumables, index, path)?,
            Collection::NormalValues => {
                remove_from(&mut self.result_mut(path)?.normal_values, index, path)?
            }
            Collection::MandatoryConditions => {
                remove_from(&mut self.result_mut(path)?.mandatory_conditions, index, path)?
            }
            Collection::ReflexTests => {
                remove_from(&mut self.result_mut(path)?.reflex_tests, index, path)?
            }
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated = Utc::now();
    }

    /// Form and tree errors that block submission
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = self.form.validate(EntityKind::Investigation.config().fields);
        for (i, result) in self.results.iter().enumerate() {
            errors.extend(result.check(&format!("results/{}", i)));
        }
        for (i, acc) in self.accreditations.iter().enumerate() {
            errors.extend(acc.check(&format!("accreditations/{}", i)));
        }
        for (i, item) in self.consumables.iter().enumerate() {
            errors.extend(item.check(&format!("consumables/{}", i)));
        }
        errors
    }

    /// Request body: the mapped form fields plus the nested arrays
    pub fn payload(&self) -> Value {
        let mut body = self.form.payload(EntityKind::Investigation.config().fields);
        if let Value::Object(map) = &mut body {
            map.insert("results".into(), serde_json::to_value(&self.results).unwrap_or_default());
            map.insert(
                "accreditations".into(),
                serde_json::to_value(&self.accreditations).unwrap_or_default(),
            );
            map.insert(
                "consumables".into(),
                serde_json::to_value(&self.consumables).unwrap_or_default(),
            );
        }
        body
    }

    /// Short title for listings
    pub fn title(&self) -> &str {
        self.form.get("testname").unwrap_or("(untitled)")
    }
}

impl Default for InvestigationDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory of saved drafts, one JSON file per draft id
#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            dir: state_dir.join(DRAFTS_DIR),
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub fn save(&self, draft: &InvestigationDraft) -> Result<(), DraftError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(draft).map_err(|e| DraftError::Corrupt {
            path: self.path_for(&draft.id),
            message: e.to_string(),
        })?;
        fs::write(self.path_for(&draft.id), content)?;
        Ok(())
    }

    /// Load by full id or unique id prefix
    pub fn load(&self, id: &str) -> Result<InvestigationDraft, DraftError> {
        let resolved = self.resolve(id)?;
        let path = self.path_for(&resolved);
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| DraftError::Corrupt {
            path,
            message: e.to_string(),
        })
    }

    pub fn discard(&self, id: &str) -> Result<(), DraftError> {
        let resolved = self.resolve(id)?;
        fs::remove_file(self.path_for(&resolved))?;
        Ok(())
    }

    /// Remove every saved draft
    pub fn clear_all(&self) -> Result<(), DraftError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Saved drafts, most recently updated first
    pub fn list(&self) -> Result<Vec<InvestigationDraft>, DraftError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut drafts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                match fs::read_to_string(&path)
                    .ok()
                    .and_then(|c| serde_json::from_str::<InvestigationDraft>(&c).ok())
                {
                    Some(draft) => drafts.push(draft),
                    None => tracing::warn!(path = %path.display(), "skipping unreadable draft"),
                }
            }
        }
        drafts.sort_by(|a, b| b.updated.cmp(&a.updated));
        Ok(drafts)
    }

    fn resolve(&self, id: &str) -> Result<String, DraftError> {
        if self.path_for(id).exists() {
            return Ok(id.to_string());
        }
        let upper = id.to_uppercase();
        let matches: Vec<String> = self
            .list()?
            .into_iter()
            .map(|d| d.id)
            .filter(|d| d.starts_with(&upper))
            .collect();
        match matches.as_slice() {
            [only] => Ok(only.clone()),
            _ => Err(DraftError::NoSuchDraft(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn path(s: &str) -> DraftPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_paths() {
        assert_eq!(
            path("results"),
            DraftPath {
                result: None,
                collection: Collection::Results,
                index: None
            }
        );
        assert_eq!(
            path("results/2/normal-values/1"),
            DraftPath {
                result: Some(2),
                collection: Collection::NormalValues,
                index: Some(1)
            }
        );
        assert_eq!(path("/consumables/0/").to_string(), "consumables/0");
        assert!("results/x".parse::<DraftPath>().is_err());
        assert!("accreditations/0/normal-values".parse::<DraftPath>().is_err());
        assert!("widgets".parse::<DraftPath>().is_err());
    }

    #[test]
    fn test_build_tree_by_path() {
        let mut draft = InvestigationDraft::new();
        let r0 = draft
            .add(&path("results"), &pairs(&[("name", "Haemoglobin"), ("unit", "g/dL")]))
            .unwrap();
        assert_eq!(r0.to_string(), "results/0");

        let nv = draft
            .add(
                &path("results/0/normal-values"),
                &pairs(&[("gender", "male"), ("min", "13"), ("max", "17")]),
            )
            .unwrap();
        assert_eq!(nv.to_string(), "results/0/normal-values/0");

        draft
            .add(&path("results/0/reflex-tests"), &pairs(&[("test", "Peripheral smear")]))
            .unwrap();
        draft
            .edit(&path("results/0/normal-values/0"), &pairs(&[("max", "17.5")]))
            .unwrap();

        let result = &draft.results[0];
        assert_eq!(result.normal_values[0].max_value, Some(17.5));
        assert_eq!(result.normal_values[0].gender, Gender::Male);
        assert_eq!(result.reflex_tests[0].test_name, "Peripheral smear");
    }

    #[test]
    fn test_nested_add_requires_existing_result() {
        let mut draft = InvestigationDraft::new();
        let err = draft
            .add(&path("results/0/normal-values"), &pairs(&[("min", "1")]))
            .unwrap_err();
        assert!(matches!(err, DraftError::NotFound(_)));
    }

    #[test]
    fn test_index_rules() {
        let mut draft = InvestigationDraft::new();
        assert!(matches!(
            draft.add(&path("results/0"), &[]),
            Err(DraftError::UnexpectedIndex(_))
        ));
        assert!(matches!(
            draft.edit(&path("results"), &[]),
            Err(DraftError::MissingIndex(_))
        ));
        assert!(matches!(
            draft.remove(&path("results/3")),
            Err(DraftError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_shifts_siblings() {
        let mut draft = InvestigationDraft::new();
        for name in ["A", "B", "C"] {
            draft.add(&path("consumables"), &pairs(&[("name", name), ("quantity", "1")])).unwrap();
        }
        draft.remove(&path("consumables/1")).unwrap();
        let names: Vec<_> = draft.consumables.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_bad_value_leaves_node_intact() {
        let mut draft = InvestigationDraft::new();
        draft
            .add(&path("results"), &pairs(&[("name", "Glucose")]))
            .unwrap();
        draft
            .add(&path("results/0/normal-values"), &pairs(&[("min", "70"), ("max", "110")]))
            .unwrap();

        let err = draft
            .edit(&path("results/0/normal-values/0"), &pairs(&[("min", "low")]))
            .unwrap_err();
        assert!(matches!(err, DraftError::InvalidValue { .. }));
        assert_eq!(draft.results[0].normal_values[0].min_value, Some(70.0));

        let err = draft
            .edit(&path("results/0"), &pairs(&[("colour", "red")]))
            .unwrap_err();
        assert!(matches!(err, DraftError::UnknownField { node: "result", .. }));
    }

    #[test]
    fn test_validate_reports_node_paths() {
        let mut draft = InvestigationDraft::new();
        draft.form.set("testname", "CBC");
        draft.form.set("testcode", "CBC01");
        draft.form.set("department", "1");
        draft.form.set("specimen", "2");
        draft.form.set("normalprice", "300");
        draft.add(&path("results"), &pairs(&[("name", "WBC")])).unwrap();
        draft
            .add(&path("results/0/normal-values"), &pairs(&[("min", "11"), ("max", "4")]))
            .unwrap();

        let errors = draft.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "results/0/normal-values/0");
    }

    #[test]
    fn test_payload_nests_tree() {
        let mut draft = InvestigationDraft::new();
        draft.form.set("testname", "Lipid profile");
        draft.form.set("tat_hours", "6");
        draft.add(&path("results"), &pairs(&[("name", "LDL"), ("unit", "mg/dL")])).unwrap();
        draft
            .add(&path("results/0/normal-values"), &pairs(&[("max", "100")]))
            .unwrap();
        draft
            .add(&path("accreditations"), &pairs(&[("body", "NABL"), ("valid_till", "2026-12-31")]))
            .unwrap();

        let body = draft.payload();
        assert_eq!(body["testname"], json!("Lipid profile"));
        assert_eq!(body["tat"], json!("6 hour 0 min"));
        assert_eq!(body["results"][0]["resultname"], json!("LDL"));
        assert_eq!(body["results"][0]["normalValues"][0]["maxValue"], json!(100.0));
        assert_eq!(body["results"][0]["normalValues"][0]["gender"], json!("any"));
        assert_eq!(body["accreditations"][0]["validTill"], json!("2026-12-31"));
        assert_eq!(body["consumables"], json!([]));
    }

    #[test]
    fn test_store_round_trip_and_prefix_lookup() {
        let tmp = TempDir::new().unwrap();
        let store = DraftStore::new(tmp.path());
        assert!(store.list().unwrap().is_empty());

        let mut draft = InvestigationDraft::new();
        draft.form.set("testname", "ESR");
        draft.add(&path("results"), &pairs(&[("name", "ESR")])).unwrap();
        store.save(&draft).unwrap();

        let loaded = store.load(&draft.id[..10]).unwrap();
        assert_eq!(loaded, draft);
        assert_eq!(store.list().unwrap().len(), 1);

        store.discard(&draft.id).unwrap();
        assert!(matches!(store.load(&draft.id), Err(DraftError::NoSuchDraft(_))));
    }

    #[test]
    fn test_from_record_keeps_nested_items_with_missing_fields() {
        let record = RawRecord::from_value(json!({
            "id": 5,
            "testname": "Lipid profile",
            "results": [{
                "resultname": "HDL",
                "normalValues": [{"minValue": 40.0}]
            }],
            "consumables": [{"name": "Tube"}]
        }))
        .unwrap();

        let draft = InvestigationDraft::from_record("5", &record).unwrap();
        assert_eq!(draft.target_id.as_deref(), Some("5"));
        assert_eq!(draft.form.get("testname"), Some("Lipid profile"));
        assert_eq!(draft.results[0].normal_values[0].gender, Gender::Any);
        assert_eq!(draft.results[0].normal_values[0].min_value, Some(40.0));
        assert_eq!(draft.consumables[0].quantity, 0);
        assert!(draft.accreditations.is_empty());
    }

    #[test]
    fn test_from_record_rejects_unreadable_nested_items() {
        let record = RawRecord::from_value(json!({
            "results": [{"resultname": "HDL"}],
            "consumables": [{"name": "Tube", "quantity": "two"}]
        }))
        .unwrap();

        match InvestigationDraft::from_record("5", &record) {
            Err(DraftError::Nested { field, .. }) => assert_eq!(field, "consumables"),
            other => panic!("expected Nested error, got {:?}", other),
        }
    }

    #[test]
    fn test_clear_all_removes_every_draft() {
        let tmp = TempDir::new().unwrap();
        let store = DraftStore::new(tmp.path());
        store.clear_all().unwrap();

        store.save(&InvestigationDraft::new()).unwrap();
        store.save(&InvestigationDraft::new()).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);

        store.clear_all().unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
