mod repository;
mod session;

pub use repository::*;
pub use session::*;

/// SQL migration for the initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Dates are stored as ISO-8601 text so that string order is date order.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
