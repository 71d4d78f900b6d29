//! Nepali election data pipeline: raw government datasets are loaded into
//! SQLite, joined into candidate and constituency tables carrying analytic
//! tags, checked for consistency and exported as JSON for the dashboard.

pub mod config;
pub mod database;
pub mod derive;
pub mod enrich;
pub mod export;
pub mod formats;
pub mod model;
pub mod normalize;
pub mod query;
pub mod tags;
pub mod validation;
