//! Per-command application context
//!
//! Loads configuration and the session once, and gates every route through
//! the signed-in role before any network work happens.

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::api::ApiClient;
use crate::cli::GlobalOpts;
use crate::core::config::{self, Config};
use crate::core::draft::DraftStore;
use crate::core::role::Role;
use crate::core::route::Route;
use crate::core::session::{SessionError, SessionStore};

pub struct AppContext {
    pub config: Config,
    pub session: SessionStore,
    state_dir: PathBuf,
}

impl AppContext {
    pub fn load(global: &GlobalOpts) -> Result<Self> {
        let mut config = Config::load();
        if let Some(url) = &global.api_url {
            config.api_url = url.clone();
        }
        let state_dir = config::state_dir();
        let session = SessionStore::open(&state_dir).into_diagnostic()?;
        tracing::debug!(api_url = %config.api_url, state_dir = %state_dir.display(), "context loaded");
        Ok(Self {
            config,
            session,
            state_dir,
        })
    }

    /// Role of the signed-in user; fails when no token is stored
    pub fn role(&self) -> Result<Role> {
        if self.session.token().is_none() {
            return Err(SessionError::NotSignedIn).into_diagnostic();
        }
        self.session.role().into_diagnostic()
    }

    /// Check `route` against the signed-in role's application
    pub fn authorize(&self, route: &Route) -> Result<Role> {
        let role = self.role()?;
        role.guard(route).into_diagnostic()?;
        Ok(role)
    }

    /// Authenticated client for the configured API
    pub fn client(&self) -> Result<ApiClient> {
        let client = ApiClient::http(&self.config).into_diagnostic()?;
        Ok(client.with_token(self.session.token()))
    }

    pub fn drafts(&self) -> DraftStore {
        DraftStore::new(&self.state_dir)
    }
}
