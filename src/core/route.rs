//! Navigation targets
//!
//! Views return a `Route` instead of navigating themselves. Records travel to
//! edit views by id in the route, never through shared session keys.

use crate::core::entity::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Role home with the sidebar menu
    Home,
    /// List view of an entity
    List(EntityKind),
    /// Create form of an entity
    Add(EntityKind),
    /// Update form for one record
    Update(EntityKind, String),
    /// Detail view for one record
    Show(EntityKind, String),
}

impl Route {
    /// Equivalent `lims` command line for this route
    pub fn command(&self) -> String {
        match self {
            Route::Home => "lims menu".to_string(),
            Route::List(kind) => format!("lims list {}", kind.config().slug),
            Route::Add(kind) => format!("lims new {}", kind.config().slug),
            Route::Update(kind, id) => format!("lims update {} {}", kind.config().slug, id),
            Route::Show(kind, id) => format!("lims show {} {}", kind.config().slug, id),
        }
    }

    pub fn entity(&self) -> Option<EntityKind> {
        match self {
            Route::Home => None,
            Route::List(kind) | Route::Add(kind) => Some(*kind),
            Route::Update(kind, _) | Route::Show(kind, _) => Some(*kind),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::List(kind) => write!(f, "/{}", kind.config().list_path),
            Route::Add(kind) => write!(f, "/add-{}", kind.config().slug),
            Route::Update(kind, id) => write!(f, "/update-{}/{}", kind.config().slug, id),
            Route::Show(kind, id) => write!(f, "/{}/{}", kind.config().list_path, id),
        }
    }
}
