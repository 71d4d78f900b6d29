pub mod dimensions;
pub mod ingestion;
pub mod metrics;
pub mod schema;

use crate::formats::FormatError;
use crate::model::raw::MissingField;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Data integrity error: {0}")]
    Integrity(String),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("{table} row {row}: {source}")]
    MissingField {
        table: &'static str,
        row: usize,
        #[source]
        source: MissingField,
    },
    #[error("{table} row {row}: {source}")]
    Payload {
        table: String,
        row: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("required dataset {dataset} not found in {dir}")]
    MissingDataset { dataset: &'static str, dir: PathBuf },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Handle to the embedded election database. Cheap to clone.
#[derive(Clone)]
pub struct ElectionDatabase {
    pool: SqlitePool,
}

impl ElectionDatabase {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        Self::connect(options, SqlitePoolOptions::new()).await
    }

    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Integrity(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect(options, SqlitePoolOptions::new()).await
    }

    /// Single-connection in-memory database; every pooled connection to
    /// `:memory:` would otherwise see its own empty database.
    pub async fn create_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::connect(options, pool_options).await
    }

    async fn connect(options: SqliteConnectOptions, pool_options: SqlitePoolOptions) -> Result<Self> {
        let pool = pool_options.connect_with(options).await?;
        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<()> {
        schema::create_schema(&self.pool).await?;
        metrics::create_metrics_table(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Deserialize every `payload` of a table in row order.
    pub async fn read_payloads<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let sql = format!("SELECT payload FROM {} ORDER BY row_index", table);
        let payloads: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        payloads
            .iter()
            .enumerate()
            .map(|(row, payload)| {
                serde_json::from_str(payload).map_err(|source| DatabaseError::Payload {
                    table: table.to_string(),
                    row,
                    source,
                })
            })
            .collect()
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_has_schema() {
        let db = ElectionDatabase::create_in_memory().await.unwrap();
        schema::verify_schema(db.pool()).await.unwrap();
        assert_eq!(db.count_rows("states").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_database_is_created_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("election.sqlite");
        let db = ElectionDatabase::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(db.count_rows("dim_parties").await.unwrap(), 0);
    }
}
