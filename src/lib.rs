//! LIMS Console: terminal front-end for a hospital Laboratory Information
//! Management System.
//!
//! Staff browse and maintain master data (departments, hospitals, instruments,
//! investigations, roles, colors, reports) and register patients and billing
//! against the LIMS REST API. Every entity goes through the same generic list
//! view and form view, parameterized by a static entity configuration.

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod table;
pub mod views;
