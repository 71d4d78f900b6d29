//! Derived dimension tables. Filter columns are denormalized next to the full
//! JSON record so the query layer can filter in SQL and still return the
//! complete row.

use crate::database::ingestion::Dataset;
use crate::database::schema::{
    DIM_CONSTITUENCY_PROFILE, DIM_FPTP_CANDIDATES, DIM_PARTIES, DIM_PR_CANDIDATES,
};
use crate::database::{DatabaseError, ElectionDatabase, Result};
use crate::derive::DerivedTables;
use log::info;
use serde::Serialize;
use sqlx::{Sqlite, Transaction};

fn payload<T: Serialize>(table: &str, row: usize, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| DatabaseError::Payload {
        table: table.to_string(),
        row,
        source,
    })
}

async fn clear(tx: &mut Transaction<'_, Sqlite>, table: &str) -> Result<()> {
    sqlx::query(&format!("DELETE FROM {}", table))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Replace every dimension table with the given derivation output.
pub async fn store_tables(db: &ElectionDatabase, tables: &DerivedTables) -> Result<()> {
    let mut tx = db.pool().begin().await?;

    clear(&mut tx, DIM_FPTP_CANDIDATES).await?;
    for (row, c) in tables.fptp_candidates.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO dim_current_fptp_candidates (
                row_index, candidate_id, candidate_name, political_party_name, party_id,
                party_display_order, state_id, district_id, constituency_id, gender,
                age_group, tags, payload
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row as i64)
        .bind(c.candidate_id)
        .bind(&c.candidate_name)
        .bind(&c.political_party_name)
        .bind(c.party_id)
        .bind(c.party_display_order)
        .bind(c.state_id)
        .bind(c.district_id)
        .bind(c.constituency_id)
        .bind(&c.gender)
        .bind(&c.age_group)
        .bind(payload(DIM_FPTP_CANDIDATES, row, &c.tags)?)
        .bind(payload(DIM_FPTP_CANDIDATES, row, c)?)
        .execute(&mut *tx)
        .await?;
    }

    clear(&mut tx, DIM_PR_CANDIDATES).await?;
    for (row, c) in tables.pr_candidates.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO dim_current_proportional_candidates (
                row_index, serial_no, candidate_name, political_party_name, party_id,
                party_display_order, inclusive_group, gender, rank_position, tags, payload
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row as i64)
        .bind(c.serial_no)
        .bind(&c.candidate_name)
        .bind(&c.political_party_name)
        .bind(c.party_id)
        .bind(c.party_display_order)
        .bind(&c.inclusive_group)
        .bind(&c.gender)
        .bind(c.rank_position)
        .bind(payload(DIM_PR_CANDIDATES, row, &c.tags)?)
        .bind(payload(DIM_PR_CANDIDATES, row, c)?)
        .execute(&mut *tx)
        .await?;
    }

    clear(&mut tx, DIM_CONSTITUENCY_PROFILE).await?;
    for (row, p) in tables.constituencies.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO dim_constituency_profile (
                row_index, state_id, state_name, district_id, district_name,
                constituency_id, tags, payload
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row as i64)
        .bind(p.state_id)
        .bind(&p.state_name)
        .bind(p.district_id)
        .bind(&p.district_name)
        .bind(p.constituency_id)
        .bind(payload(DIM_CONSTITUENCY_PROFILE, row, &p.tags)?)
        .bind(payload(DIM_CONSTITUENCY_PROFILE, row, p)?)
        .execute(&mut *tx)
        .await?;
    }

    clear(&mut tx, DIM_PARTIES).await?;
    for (row, p) in tables.parties.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO dim_parties (row_index, party_id, current_party_name, party_display_order, payload)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(row as i64)
        .bind(p.party_id)
        .bind(&p.current_party_name)
        .bind(p.party_display_order)
        .bind(payload(DIM_PARTIES, row, p)?)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(
        "stored {} FPTP, {} PR, {} constituency and {} party rows",
        tables.fptp_candidates.len(),
        tables.pr_candidates.len(),
        tables.constituencies.len(),
        tables.parties.len()
    );
    Ok(())
}

/// Read the dimension tables back. Party symbols come straight from the raw
/// symbol table, which is already in its exported shape.
pub async fn load_tables(db: &ElectionDatabase) -> Result<DerivedTables> {
    Ok(DerivedTables {
        fptp_candidates: db.read_payloads(DIM_FPTP_CANDIDATES).await?,
        pr_candidates: db.read_payloads(DIM_PR_CANDIDATES).await?,
        constituencies: db.read_payloads(DIM_CONSTITUENCY_PROFILE).await?,
        parties: db.read_payloads(DIM_PARTIES).await?,
        party_symbols: db.read_payloads(Dataset::PartySymbols.table()).await?,
    })
}

/// Whether `derive` has been run against this database.
pub async fn has_dimensions(db: &ElectionDatabase) -> Result<bool> {
    Ok(db.count_rows(DIM_FPTP_CANDIDATES).await? > 0
        || db.count_rows(DIM_CONSTITUENCY_PROFILE).await? > 0)
}
