//! Table definitions for raw datasets, derived dimensions and load bookkeeping.

use crate::database::ingestion::Dataset;
use crate::database::{DatabaseError, Result};
use sqlx::SqlitePool;

pub const DIM_FPTP_CANDIDATES: &str = "dim_current_fptp_candidates";
pub const DIM_PR_CANDIDATES: &str = "dim_current_proportional_candidates";
pub const DIM_CONSTITUENCY_PROFILE: &str = "dim_constituency_profile";
pub const DIM_PARTIES: &str = "dim_parties";

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // One table per raw dataset; each row is the typed record as JSON.
    for dataset in Dataset::ALL {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                row_index INTEGER PRIMARY KEY,
                payload TEXT NOT NULL
            )
            "#,
            dataset.table()
        );
        sqlx::query(&sql).execute(pool).await?;
    }

    // Fingerprints of the files each dataset was last loaded from
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS raw_files (
            dataset TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            file_hash TEXT NOT NULL,
            file_size INTEGER,
            row_count INTEGER NOT NULL,
            loaded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dim_current_fptp_candidates (
            row_index INTEGER PRIMARY KEY,
            candidate_id INTEGER NOT NULL,
            candidate_name TEXT NOT NULL,
            political_party_name TEXT NOT NULL,
            party_id INTEGER,
            party_display_order INTEGER,
            state_id INTEGER NOT NULL,
            district_id INTEGER NOT NULL,
            constituency_id INTEGER NOT NULL,
            gender TEXT,
            age_group TEXT,
            tags TEXT NOT NULL,
            payload TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dim_current_proportional_candidates (
            row_index INTEGER PRIMARY KEY,
            serial_no INTEGER NOT NULL,
            candidate_name TEXT NOT NULL,
            political_party_name TEXT NOT NULL,
            party_id INTEGER,
            party_display_order INTEGER,
            inclusive_group TEXT,
            gender TEXT,
            rank_position INTEGER NOT NULL,
            tags TEXT NOT NULL,
            payload TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dim_constituency_profile (
            row_index INTEGER PRIMARY KEY,
            state_id INTEGER NOT NULL,
            state_name TEXT NOT NULL,
            district_id INTEGER NOT NULL,
            district_name TEXT NOT NULL,
            constituency_id INTEGER NOT NULL,
            tags TEXT NOT NULL,
            payload TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dim_parties (
            row_index INTEGER PRIMARY KEY,
            party_id INTEGER NOT NULL,
            current_party_name TEXT NOT NULL,
            party_display_order INTEGER,
            payload TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    let indexes = vec![
        "CREATE INDEX IF NOT EXISTS idx_fptp_geo ON dim_current_fptp_candidates(state_id, district_id, constituency_id)",
        "CREATE INDEX IF NOT EXISTS idx_fptp_party ON dim_current_fptp_candidates(party_id)",
        "CREATE INDEX IF NOT EXISTS idx_fptp_candidate ON dim_current_fptp_candidates(candidate_id)",
        "CREATE INDEX IF NOT EXISTS idx_pr_party ON dim_current_proportional_candidates(party_id)",
        "CREATE INDEX IF NOT EXISTS idx_pr_group ON dim_current_proportional_candidates(inclusive_group)",
        "CREATE INDEX IF NOT EXISTS idx_constituency_geo ON dim_constituency_profile(state_id, district_id, constituency_id)",
        "CREATE INDEX IF NOT EXISTS idx_parties_id ON dim_parties(party_id)",
        "CREATE INDEX IF NOT EXISTS idx_raw_files_hash ON raw_files(file_hash)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}

/// Verify database schema integrity
pub async fn verify_schema(pool: &SqlitePool) -> Result<()> {
    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(pool)
            .await?;

    let expected_tables = Dataset::ALL
        .iter()
        .map(|d| d.table())
        .chain([
            "raw_files",
            "processing_metrics",
            DIM_FPTP_CANDIDATES,
            DIM_PR_CANDIDATES,
            DIM_CONSTITUENCY_PROFILE,
            DIM_PARTIES,
        ]);

    for expected in expected_tables {
        if !tables.iter().any(|name| name == expected) {
            return Err(DatabaseError::Integrity(format!(
                "Missing table: {}",
                expected
            )));
        }
    }

    Ok(())
}
