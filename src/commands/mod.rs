mod derive;
mod enrich;
mod export;
mod info;
mod load;
mod query;
mod validate;

pub use derive::derive;
pub use enrich::enrich;
pub use export::export;
pub use info::info;
pub use load::load;
pub use query::{query, QueryCommand};
pub use validate::validate;

use nepal_election::config::ConfigError;
use nepal_election::database::DatabaseError;
use nepal_election::derive::DeriveError;
use nepal_election::enrich::EnrichError;
use nepal_election::export::ExportError;
use nepal_election::query::QueryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Derive(#[from] DeriveError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Enrich(#[from] EnrichError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no derived tables in {0}; run `derive` first")]
    NotDerived(String),
    #[error("{0} validation errors")]
    ValidationFailed(usize),
    #[error("{0} candidates failed")]
    EnrichFailed(usize),
}

pub type Result<T> = std::result::Result<T, CommandError>;
