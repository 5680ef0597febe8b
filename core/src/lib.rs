//! Meal catalog storage and weekly plan assignment.
//!
//! The catalog lives behind [`store::CatalogStore`], implemented for SQLite
//! ([`db::Database`]) and for a single JSON file ([`json_store::JsonStore`]).
//! Weekly plans are ephemeral and held in a caller-owned [`session::Session`].

pub mod db;
pub mod error;
pub mod json_store;
pub mod legacy;
pub mod models;
pub mod plan;
pub mod service;
pub mod session;
pub mod store;

pub use error::{CatalogError, Result};
pub use service::{PlannedDay, Planner};
