//! Box selection and packaging savings estimation.
//!
//! The catalog and material tables are loaded once, then shared read-only by
//! every request.

pub mod api;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod model;
pub mod optimizer;
pub mod savings;
pub mod service;
pub mod types;
