//! CLI command implementations

pub mod completions;
pub mod draft;
pub mod form;
pub mod list;
pub mod logout;
pub mod menu;
pub mod session;
pub mod show;
