//! Data layer module
//!
//! Entity store for users, content and engagement relations:
//! - SQLite database operations
//! - Row models and query/patch types

mod database;
mod models;

pub use database::Database;
pub use models::*;

#[cfg(test)]
mod database_test;
