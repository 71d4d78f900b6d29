/// Bulk loading of raw datasets into their SQLite tables
use crate::database::metrics::{MetricsCollector, PipelineStage};
use crate::database::{DatabaseError, ElectionDatabase, Result};
use crate::derive::SourceData;
use crate::formats::{self, SourceFormat};
use crate::model::raw::{
    ConstituencyCountRow, DistrictRow, FamilyLinkRow, FptpCandidateRow, MissingField,
    ParliamentMemberRow, PartySeedRow, PartySymbolRow, PastFptpResultRow, PrCandidateRow,
    PrPartyVoteRow, StateRow,
};
use colored::*;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

/// Every dataset the loader knows about. Each one owns a raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    States,
    Districts,
    Constituency,
    CurrentFptpCandidates,
    CurrentPrCandidates,
    Past2079Fptp,
    Past2079Pr,
    Past2074Fptp,
    Past2074Pr,
    ParliamentMembers,
    PartySymbols,
    PoliticalParties,
    PoliticalFamilies,
}

impl Dataset {
    pub const ALL: [Dataset; 13] = [
        Dataset::States,
        Dataset::Districts,
        Dataset::Constituency,
        Dataset::CurrentFptpCandidates,
        Dataset::CurrentPrCandidates,
        Dataset::Past2079Fptp,
        Dataset::Past2079Pr,
        Dataset::Past2074Fptp,
        Dataset::Past2074Pr,
        Dataset::ParliamentMembers,
        Dataset::PartySymbols,
        Dataset::PoliticalParties,
        Dataset::PoliticalFamilies,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Dataset::States => "states",
            Dataset::Districts => "districts",
            Dataset::Constituency => "constituency",
            Dataset::CurrentFptpCandidates => "current_first_past_the_post_candidates",
            Dataset::CurrentPrCandidates => "current_proportional_election_candidates",
            Dataset::Past2079Fptp => "past_2079_first_past_the_post_election_result",
            Dataset::Past2079Pr => "past_2079_proportional_election_result",
            Dataset::Past2074Fptp => "past_2074_first_past_the_post_election_result",
            Dataset::Past2074Pr => "past_2074_proportional_election_result",
            Dataset::ParliamentMembers => "parliament_members",
            Dataset::PartySymbols => "political_party_symbols",
            Dataset::PoliticalParties => "political_parties",
            Dataset::PoliticalFamilies => "political_families",
        }
    }

    /// File stems accepted for this dataset, the table name first.
    pub fn stems(self) -> &'static [&'static str] {
        match self {
            Dataset::States => &["states"],
            Dataset::Districts => &["districts"],
            Dataset::Constituency => &["constituency"],
            Dataset::CurrentFptpCandidates => &[
                "current_first_past_the_post_candidates",
                "current_candidates",
            ],
            Dataset::CurrentPrCandidates => &["current_proportional_election_candidates"],
            Dataset::Past2079Fptp => &[
                "past_2079_first_past_the_post_election_result",
                "pratakhya_election_result",
            ],
            Dataset::Past2079Pr => &[
                "past_2079_proportional_election_result",
                "2079_proportional_election_result",
            ],
            Dataset::Past2074Fptp => &[
                "past_2074_first_past_the_post_election_result",
                "2074_first_past_the_post_election_result",
            ],
            Dataset::Past2074Pr => &[
                "past_2074_proportional_election_result",
                "2074_proportional_election_result",
            ],
            Dataset::ParliamentMembers => &["parliament_members"],
            Dataset::PartySymbols => &["political_party_symbols"],
            Dataset::PoliticalParties => &["political_parties", "parties"],
            Dataset::PoliticalFamilies => &["political_families"],
        }
    }

    pub fn required(self) -> bool {
        matches!(
            self,
            Dataset::States
                | Dataset::Districts
                | Dataset::Constituency
                | Dataset::CurrentFptpCandidates
                | Dataset::Past2079Fptp
        )
    }

    /// First existing file for this dataset in `dir`, trying stems in order
    /// and extensions in preference order.
    pub fn locate(self, dir: &Path) -> Option<PathBuf> {
        self.stems().iter().find_map(|stem| {
            SourceFormat::EXTENSIONS
                .iter()
                .map(|(ext, _)| dir.join(format!("{}.{}", stem, ext)))
                .find(|path| path.is_file())
        })
    }

    /// Parse rows into typed records and re-serialize them as stored payloads.
    fn payloads(self, rows: Vec<Value>) -> Result<Vec<String>> {
        use crate::model::raw::{
            ConstituencyCountRecord, DistrictRecord, FamilyLinkRecord, FptpCandidateRecord,
            ParliamentMemberRecord, PartySeedRecord, PartySymbolRecord, PastFptpResultRecord,
            PrCandidateRecord, PrPartyVoteRecord, StateRecord,
        };

        let table = self.table();
        match self {
            Dataset::States => typed::<StateRow, StateRecord>(table, rows, |_| true),
            Dataset::Districts => typed::<DistrictRow, DistrictRecord>(table, rows, |_| true),
            Dataset::Constituency => {
                typed::<ConstituencyCountRow, ConstituencyCountRecord>(table, rows, |_| true)
            }
            Dataset::CurrentFptpCandidates => {
                typed::<FptpCandidateRow, FptpCandidateRecord>(table, rows, |_| true)
            }
            Dataset::CurrentPrCandidates => {
                typed::<PrCandidateRow, PrCandidateRecord>(table, rows, |_| true)
            }
            Dataset::Past2079Fptp | Dataset::Past2074Fptp => {
                typed::<PastFptpResultRow, PastFptpResultRecord>(table, rows, |_| true)
            }
            Dataset::Past2079Pr | Dataset::Past2074Pr => {
                typed::<PrPartyVoteRow, PrPartyVoteRecord>(table, rows, |_| true)
            }
            Dataset::ParliamentMembers => typed::<ParliamentMemberRow, ParliamentMemberRecord>(
                table,
                rows,
                ParliamentMemberRow::is_house_member,
            ),
            Dataset::PartySymbols => {
                typed::<PartySymbolRow, PartySymbolRecord>(table, rows, |_| true)
            }
            Dataset::PoliticalParties => {
                typed::<PartySeedRow, PartySeedRecord>(table, rows, |_| true)
            }
            Dataset::PoliticalFamilies => {
                typed::<FamilyLinkRow, FamilyLinkRecord>(table, rows, |_| true)
            }
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

fn typed<R, T>(table: &'static str, rows: Vec<Value>, keep: impl Fn(&R) -> bool) -> Result<Vec<String>>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = MissingField> + Serialize,
{
    let mut payloads = Vec::with_capacity(rows.len());
    for (row_index, value) in rows.into_iter().enumerate() {
        let row: R = serde_json::from_value(value).map_err(|source| DatabaseError::Payload {
            table: table.to_string(),
            row: row_index,
            source,
        })?;
        if !keep(&row) {
            continue;
        }
        let record = T::try_from(row).map_err(|source| DatabaseError::MissingField {
            table,
            row: row_index,
            source,
        })?;
        let payload = serde_json::to_string(&record).map_err(|source| DatabaseError::Payload {
            table: table.to_string(),
            row: row_index,
            source,
        })?;
        payloads.push(payload);
    }
    Ok(payloads)
}

/// Hex SHA-1 of a file's bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { rows: usize },
    Unchanged,
    Missing,
    /// The file is gone; rows from an earlier load were cleared.
    Removed { rows: usize },
}

#[derive(Debug, Default)]
pub struct LoadSummary {
    pub data_dir: PathBuf,
    pub outcomes: Vec<(Dataset, LoadOutcome)>,
    pub total_rows: u64,
    pub total_duration_ms: u64,
}

impl LoadSummary {
    pub fn loaded(&self) -> usize {
        self.count(|o| matches!(o, LoadOutcome::Loaded { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| *o == LoadOutcome::Unchanged)
    }

    pub fn missing(&self) -> usize {
        self.count(|o| *o == LoadOutcome::Missing)
    }

    pub fn removed(&self) -> usize {
        self.count(|o| matches!(o, LoadOutcome::Removed { .. }))
    }

    fn count(&self, predicate: impl Fn(&LoadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

pub struct DatasetLoader {
    db: ElectionDatabase,
    metrics: MetricsCollector,
}

impl DatasetLoader {
    pub fn new(db: ElectionDatabase) -> Self {
        let metrics = MetricsCollector::new(db.pool().clone());
        Self { db, metrics }
    }

    /// Load every known dataset found in `data_dir`.
    pub async fn load_dir(&mut self, data_dir: &Path, force: bool) -> Result<LoadSummary> {
        println!(
            "🚀 Loading datasets from {}",
            data_dir.display().to_string().bright_cyan()
        );

        let total_key = format!("load_{}", data_dir.display());
        self.metrics.start_stage(&total_key);

        // Step 1: Locate every dataset before touching the database
        self.metrics.start_stage("discovery");
        let mut located = Vec::with_capacity(Dataset::ALL.len());
        for dataset in Dataset::ALL {
            match dataset.locate(data_dir) {
                Some(path) => located.push((dataset, Some(path))),
                None if dataset.required() => {
                    return Err(DatabaseError::MissingDataset {
                        dataset: dataset.table(),
                        dir: data_dir.to_path_buf(),
                    })
                }
                None => located.push((dataset, None)),
            }
        }
        let found = located.iter().filter(|(_, p)| p.is_some()).count();
        self.metrics
            .end_stage("discovery", PipelineStage::Discovery, None, Some(found as u64))
            .await?;

        // Step 2: Load each dataset in its own transaction
        let mut summary = LoadSummary {
            data_dir: data_dir.to_path_buf(),
            ..LoadSummary::default()
        };
        for (dataset, path) in located {
            let outcome = match path {
                Some(path) => self.load_dataset(dataset, &path, force).await?,
                None => self.clear_dataset(dataset).await?,
            };
            match &outcome {
                LoadOutcome::Loaded { rows } => {
                    summary.total_rows += *rows as u64;
                    println!(
                        "  ✅ {} {} rows",
                        dataset.table().bright_yellow(),
                        rows.to_string().bright_green()
                    );
                }
                LoadOutcome::Unchanged => {
                    println!("  ⏭️  {} unchanged", dataset.table().bright_yellow())
                }
                LoadOutcome::Removed { rows } => println!(
                    "  🗑️  {} file removed, cleared {} rows",
                    dataset.table().bright_yellow(),
                    rows.to_string().bright_red()
                ),
                LoadOutcome::Missing => {}
            }
            summary.outcomes.push((dataset, outcome));
        }

        // Step 3: Finalize
        let total = self
            .metrics
            .end_stage(
                &total_key,
                PipelineStage::Complete,
                None,
                Some(summary.total_rows),
            )
            .await?;
        summary.total_duration_ms = total.duration_ms;

        self.print_load_summary(&summary);
        Ok(summary)
    }

    async fn load_dataset(&mut self, dataset: Dataset, path: &Path, force: bool) -> Result<LoadOutcome> {
        let bytes = formats::read_bytes(path)?;
        let file_hash = fingerprint(&bytes);

        if !force && self.stored_hash(dataset).await?.as_deref() == Some(file_hash.as_str()) {
            info!("{} unchanged since last load, skipping", path.display());
            return Ok(LoadOutcome::Unchanged);
        }

        let read_key = format!("{}_read", dataset);
        self.metrics.start_stage(&read_key);
        let rows = formats::read_rows(path)?;
        let payloads = dataset.payloads(rows)?;
        self.metrics
            .end_stage(
                &read_key,
                PipelineStage::FileReading,
                Some(dataset.table()),
                Some(payloads.len() as u64),
            )
            .await?;

        let insert_key = format!("{}_insert", dataset);
        self.metrics.start_stage(&insert_key);
        self.replace_rows(dataset, path, &file_hash, bytes.len(), &payloads)
            .await?;
        self.metrics
            .end_stage(
                &insert_key,
                PipelineStage::DatabaseInsertion,
                Some(dataset.table()),
                Some(payloads.len() as u64),
            )
            .await?;

        info!("loaded {} rows into {}", payloads.len(), dataset);
        Ok(LoadOutcome::Loaded {
            rows: payloads.len(),
        })
    }

    /// An optional dataset with no file must not keep rows from an earlier
    /// load, so its table and fingerprint are dropped.
    async fn clear_dataset(&self, dataset: Dataset) -> Result<LoadOutcome> {
        let mut tx = self.db.pool().begin().await?;
        let cleared = sqlx::query(&format!("DELETE FROM {}", dataset.table()))
            .execute(&mut *tx)
            .await?
            .rows_affected() as usize;
        sqlx::query("DELETE FROM raw_files WHERE dataset = ?")
            .bind(dataset.table())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if cleared == 0 {
            debug!("optional dataset {} not present", dataset);
            Ok(LoadOutcome::Missing)
        } else {
            warn!("{} file no longer present, cleared {} rows", dataset, cleared);
            Ok(LoadOutcome::Removed { rows: cleared })
        }
    }

    async fn stored_hash(&self, dataset: Dataset) -> Result<Option<String>> {
        Ok(
            sqlx::query_scalar("SELECT file_hash FROM raw_files WHERE dataset = ?")
                .bind(dataset.table())
                .fetch_optional(self.db.pool())
                .await?,
        )
    }

    /// Replace the table contents and the file fingerprint with transaction
    async fn replace_rows(
        &self,
        dataset: Dataset,
        path: &Path,
        file_hash: &str,
        file_size: usize,
        payloads: &[String],
    ) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query(&format!("DELETE FROM {}", dataset.table()))
            .execute(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO {} (row_index, payload) VALUES (?, ?)",
            dataset.table()
        );
        for (row_index, payload) in payloads.iter().enumerate() {
            sqlx::query(&insert)
                .bind(row_index as i64)
                .bind(payload)
                .execute(&mut *tx)
                .await?;
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        sqlx::query(
            r#"
            INSERT INTO raw_files (dataset, filename, file_hash, file_size, row_count, loaded_at)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(dataset) DO UPDATE SET
                filename = excluded.filename,
                file_hash = excluded.file_hash,
                file_size = excluded.file_size,
                row_count = excluded.row_count,
                loaded_at = excluded.loaded_at
            "#,
        )
        .bind(dataset.table())
        .bind(filename)
        .bind(file_hash)
        .bind(file_size as i64)
        .bind(payloads.len() as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    fn print_load_summary(&self, summary: &LoadSummary) {
        println!("\n{}", "🎉 Load Complete!".bright_green().bold());
        println!("{}", "=".repeat(50).bright_green());
        println!(
            "{}: {}",
            "Data Directory".bright_white().bold(),
            summary.data_dir.display().to_string().bright_cyan()
        );
        println!(
            "{}: {} loaded, {} unchanged, {} absent, {} cleared",
            "Datasets".bright_white().bold(),
            summary.loaded().to_string().bright_yellow(),
            summary.unchanged().to_string().bright_yellow(),
            summary.missing().to_string().bright_yellow(),
            summary.removed().to_string().bright_yellow()
        );
        println!(
            "{}: {}",
            "Total Rows".bright_white().bold(),
            summary.total_rows.to_string().bright_yellow()
        );
        println!(
            "{}: {} ms",
            "Total Duration".bright_white().bold(),
            summary.total_duration_ms.to_string().bright_yellow()
        );
        println!();
    }
}

/// Read every raw table back into typed records.
pub async fn read_source(db: &ElectionDatabase) -> Result<SourceData> {
    Ok(SourceData {
        states: db.read_payloads(Dataset::States.table()).await?,
        districts: db.read_payloads(Dataset::Districts.table()).await?,
        constituencies: db.read_payloads(Dataset::Constituency.table()).await?,
        fptp_candidates: db.read_payloads(Dataset::CurrentFptpCandidates.table()).await?,
        pr_candidates: db.read_payloads(Dataset::CurrentPrCandidates.table()).await?,
        fptp_2079: db.read_payloads(Dataset::Past2079Fptp.table()).await?,
        fptp_2074: db.read_payloads(Dataset::Past2074Fptp.table()).await?,
        pr_2079: db.read_payloads(Dataset::Past2079Pr.table()).await?,
        pr_2074: db.read_payloads(Dataset::Past2074Pr.table()).await?,
        parliament_members: db.read_payloads(Dataset::ParliamentMembers.table()).await?,
        party_symbols: db.read_payloads(Dataset::PartySymbols.table()).await?,
        party_seeds: db.read_payloads(Dataset::PoliticalParties.table()).await?,
        families: db.read_payloads(Dataset::PoliticalFamilies.table()).await?,
        profiles: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn required_fixtures(dir: &Path) {
        write(dir, "states.json", r#"[{"id": 1, "name": "कोशी"}]"#);
        write(dir, "districts.json", r#"[{"id": 4, "name": "झापा", "parentId": 1}]"#);
        write(dir, "constituency.json", r#"[{"distId": 4, "consts": 2}]"#);
        write(
            dir,
            "current_candidates.json",
            r#"[{"CandidateID": 10, "CandidateName": "क", "PoliticalPartyName": "X",
                 "STATE_ID": 1, "DistrictCd": 4, "SCConstID": 1}]"#,
        );
        write(
            dir,
            "pratakhya_election_result.csv",
            "CandidateName,PoliticalPartyName,DistrictCd,SCConstID,TotalVoteReceived\nक,X,4,1,100\n",
        );
    }

    #[test]
    fn locate_prefers_first_stem_and_json() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "parties.json", "[]");
        write(dir.path(), "political_parties.csv", "party_id\n");
        write(dir.path(), "political_parties.json", "[]");
        let found = Dataset::PoliticalParties.locate(dir.path()).unwrap();
        assert!(found.ends_with("political_parties.json"));
        assert!(Dataset::PoliticalFamilies.locate(dir.path()).is_none());
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let hash = fingerprint(b"abc");
        assert_eq!(hash, "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn parliament_rows_outside_the_house_are_dropped() {
        let rows = vec![
            serde_json::json!({"member_id": 1, "name_np": "क", "parliament_type": "na"}),
            serde_json::json!({"member_id": 2, "name_np": "ख", "parliament_type": "hr"}),
        ];
        let payloads = Dataset::ParliamentMembers.payloads(rows).unwrap();
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].contains("\"member_id\":2"));
    }

    #[test]
    fn missing_identity_names_table_and_row() {
        let rows = vec![
            serde_json::json!({"id": 1, "name": "कोशी"}),
            serde_json::json!({"id": 2}),
        ];
        let err = Dataset::States.payloads(rows).unwrap_err();
        match err {
            DatabaseError::MissingField { table, row, source } => {
                assert_eq!(table, "states");
                assert_eq!(row, 1);
                assert_eq!(source.field, "state_name");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn load_then_reload_skips_unchanged_files() {
        let dir = tempfile::tempdir().unwrap();
        required_fixtures(dir.path());
        let db = ElectionDatabase::create_in_memory().await.unwrap();

        let mut loader = DatasetLoader::new(db.clone());
        let first = loader.load_dir(dir.path(), false).await.unwrap();
        assert_eq!(first.loaded(), 5);
        assert_eq!(first.missing(), 8);

        let second = loader.load_dir(dir.path(), false).await.unwrap();
        assert_eq!(second.loaded(), 0);
        assert_eq!(second.unchanged(), 5);

        let forced = loader.load_dir(dir.path(), true).await.unwrap();
        assert_eq!(forced.loaded(), 5);

        let source = read_source(&db).await.unwrap();
        assert_eq!(source.states[0].state_name, "कोशी");
        assert_eq!(source.fptp_2079[0].votes, 100);
        assert_eq!(source.constituencies[0].consts, 2);
    }

    #[tokio::test]
    async fn vanished_optional_file_clears_its_rows() {
        let dir = tempfile::tempdir().unwrap();
        required_fixtures(dir.path());
        write(
            dir.path(),
            "political_parties.json",
            r#"[{"id": 1, "name": "X", "display_order": 1}]"#,
        );
        let db = ElectionDatabase::create_in_memory().await.unwrap();
        let mut loader = DatasetLoader::new(db.clone());
        assert_eq!(loader.load_dir(dir.path(), false).await.unwrap().loaded(), 6);
        assert_eq!(read_source(&db).await.unwrap().party_seeds.len(), 1);

        std::fs::remove_file(dir.path().join("political_parties.json")).unwrap();
        let after = loader.load_dir(dir.path(), false).await.unwrap();
        assert_eq!(after.removed(), 1);
        assert_eq!(after.unchanged(), 5);
        assert!(after
            .outcomes
            .contains(&(Dataset::PoliticalParties, LoadOutcome::Removed { rows: 1 })));
        assert!(read_source(&db).await.unwrap().party_seeds.is_empty());

        // Nothing left to clear the next time round.
        let again = loader.load_dir(dir.path(), false).await.unwrap();
        assert_eq!(again.removed(), 0);
        assert_eq!(again.missing(), 8);
    }

    #[tokio::test]
    async fn missing_required_dataset_aborts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "states.json", r#"[{"id": 1, "name": "कोशी"}]"#);
        let db = ElectionDatabase::create_in_memory().await.unwrap();
        let err = DatasetLoader::new(db).load_dir(dir.path(), false).await.unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::MissingDataset { dataset: "districts", .. }
        ));
    }
}
