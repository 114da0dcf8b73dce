//! Generic form view
//!
//! Creates or updates one record. Select inputs are filled from lookups that
//! load independently; a failed lookup leaves its options empty and yields a
//! notification while the rest of the form stays usable. A submit that fails
//! validation never reaches the network, and a submit the server rejects
//! keeps the draft so it can be retried.

use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::api::{ApiClient, ApiError, LookupOption};
use crate::core::config::Config;
use crate::core::draft::InvestigationDraft;
use crate::core::entity::{EntityConfig, EntityKind};
use crate::core::form::{FieldError, FieldKind, FormDraft};
use crate::core::route::Route;
use crate::views::Notification;

/// Whether the form posts a new record or updates an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update(String),
}

/// Result of pressing submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent
    Invalid(Vec<FieldError>),
    /// The server accepted the record
    Saved {
        notification: Notification,
        /// List view to return to after `delay`
        redirect: Route,
        delay: Duration,
        response: Value,
    },
    /// The server rejected the request; one notification per field error
    Failed(Vec<Notification>),
}

#[derive(Debug)]
pub struct FormView {
    config: &'static EntityConfig,
    mode: FormMode,
    draft: FormDraft,
    options: BTreeMap<EntityKind, Vec<LookupOption>>,
    lookup_limit: usize,
    redirect_delay: Duration,
}

impl FormView {
    pub fn new(kind: EntityKind, mode: FormMode, settings: &Config) -> Self {
        Self {
            config: kind.config(),
            mode,
            draft: FormDraft::new(),
            options: BTreeMap::new(),
            lookup_limit: settings.lookup_limit,
            redirect_delay: Duration::from_millis(settings.redirect_delay_ms),
        }
    }

    pub fn create(kind: EntityKind, settings: &Config) -> Self {
        Self::new(kind, FormMode::Create, settings)
    }

    pub fn update(kind: EntityKind, id: impl Into<String>, settings: &Config) -> Self {
        Self::new(kind, FormMode::Update(id.into()), settings)
    }

    pub fn config(&self) -> &'static EntityConfig {
        self.config
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    /// Loaded options for a lookup; empty if it failed or was not loaded
    pub fn options(&self, kind: EntityKind) -> &[LookupOption] {
        self.options.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Route of this form
    pub fn route(&self) -> Route {
        match &self.mode {
            FormMode::Create => Route::Add(self.config.kind),
            FormMode::Update(id) => Route::Update(self.config.kind, id.clone()),
        }
    }

    /// Fetch every lookup the form needs, in parallel
    ///
    /// Returns one error notification per failed lookup.
    pub async fn load_lookups(&mut self, client: &ApiClient) -> Vec<Notification> {
        let kinds = self.config.lookups();
        let mut notifications = Vec::new();
        for (kind, result) in client.lookup_all(&kinds, self.lookup_limit).await {
            match result {
                Ok(options) => {
                    self.options.insert(kind, options);
                }
                Err(e) => {
                    let fallback = format!("Failed to fetch {}", kind.config().name_plural);
                    notifications.push(Notification::error(e.user_message(&fallback)));
                }
            }
        }
        notifications
    }

    /// Prefill the draft from the record being updated
    pub async fn load_existing(&mut self, client: &ApiClient) -> Result<(), ApiError> {
        if let FormMode::Update(id) = &self.mode {
            let record = client.get_one(self.config, id).await?;
            self.draft = FormDraft::from_record(self.config.fields, &record);
        }
        Ok(())
    }

    /// Set one input
    ///
    /// For select inputs with loaded options, an option label is accepted in
    /// place of the id.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let value = match self.config.field(name).map(|f| f.kind) {
            Some(FieldKind::Select(kind)) => self
                .options(kind)
                .iter()
                .find(|o| o.value == value || o.label.eq_ignore_ascii_case(value))
                .map(|o| o.value.clone())
                .unwrap_or_else(|| value.to_string()),
            _ => value.to_string(),
        };
        self.draft.set_field(self.config.fields, name, &value)
    }

    pub fn validate(&self) -> Vec<FieldError> {
        self.draft.validate(self.config.fields)
    }

    /// Body the next submit would send
    pub fn payload(&self) -> Value {
        self.draft.payload(self.config.fields)
    }

    /// Validate, then POST or PUT the payload once
    pub async fn submit(&mut self, client: &ApiClient) -> SubmitOutcome {
        let errors = self.validate();
        if !errors.is_empty() {
            return SubmitOutcome::Invalid(errors);
        }
        let body = self.payload();
        let outcome = send(client, self.config, &self.mode, &body, self.redirect_delay).await;
        if matches!(outcome, SubmitOutcome::Saved { .. }) {
            self.draft.clear();
        }
        outcome
    }
}

/// Submit a whole investigation draft as one request
pub async fn submit_investigation(
    client: &ApiClient,
    draft: &InvestigationDraft,
    settings: &Config,
) -> SubmitOutcome {
    let errors = draft.validate();
    if !errors.is_empty() {
        return SubmitOutcome::Invalid(errors);
    }
    let mode = match &draft.target_id {
        Some(id) => FormMode::Update(id.clone()),
        None => FormMode::Create,
    };
    send(
        client,
        EntityKind::Investigation.config(),
        &mode,
        &draft.payload(),
        Duration::from_millis(settings.redirect_delay_ms),
    )
    .await
}

async fn send(
    client: &ApiClient,
    config: &EntityConfig,
    mode: &FormMode,
    body: &Value,
    delay: Duration,
) -> SubmitOutcome {
    let (result, verb) = match mode {
        FormMode::Create => (client.create(config, body).await, "created"),
        FormMode::Update(id) => (client.update(config, id, body).await, "updated"),
    };
    match result {
        Ok(response) => {
            tracing::info!(entity = config.name, "{} {}", config.name, verb);
            SubmitOutcome::Saved {
                notification: Notification::success(format!(
                    "{} {} successfully",
                    config.title(),
                    verb
                )),
                redirect: Route::List(config.kind),
                delay,
                response,
            }
        }
        Err(e) => {
            tracing::warn!(entity = config.name, error = %e, "submit failed");
            SubmitOutcome::Failed(failure_notifications(&e, config, mode))
        }
    }
}

fn failure_notifications(e: &ApiError, config: &EntityConfig, mode: &FormMode) -> Vec<Notification> {
    if !e.field_errors().is_empty() {
        return e
            .field_errors()
            .iter()
            .map(|fe| Notification::error(fe.to_string()))
            .collect();
    }
    let action = match mode {
        FormMode::Create => "create",
        FormMode::Update(_) => "update",
    };
    let fallback = format!("Failed to {} {}", action, config.name);
    vec![Notification::error(e.user_message(&fallback))]
}
