//! Remote data client for the LIMS REST API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{ApiClient, FetchedPage, ListQuery};
pub use error::ApiError;
pub use models::{ErrorBody, ListResponse, LookupOption};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
