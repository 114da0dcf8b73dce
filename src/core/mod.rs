//! Core module - fundamental types and utilities

pub mod config;
pub mod draft;
pub mod entity;
pub mod form;
pub mod pagination;
pub mod record;
pub mod role;
pub mod route;
pub mod search;
pub mod sequence;
pub mod session;

pub use config::{Config, ConfigError};
pub use draft::{DraftError, DraftPath, DraftStore, InvestigationDraft};
pub use entity::{EntityConfig, EntityKind, FieldSource};
pub use form::{FieldError, FieldKind, FieldSpec, FormDraft, Rule};
pub use pagination::{PageMeta, PaginationState, PAGE_SIZE_OPTIONS};
pub use record::RawRecord;
pub use role::{Access, Role, RoleError};
pub use route::Route;
pub use search::SearchScope;
pub use sequence::{RequestSequencer, Ticket};
pub use session::{SessionError, SessionStore};
