use super::Result;
use colored::*;
use log::info;
use nepal_election::config::Settings;
use nepal_election::database::dimensions::store_tables;
use nepal_election::database::ingestion::read_source;
use nepal_election::database::metrics::{MetricsCollector, PipelineStage};
use nepal_election::database::ElectionDatabase;
use nepal_election::derive::{self as derivation, DerivedTables};

/// Rebuild the dimension tables from the loaded raw datasets.
pub async fn derive(settings: &Settings) -> Result<DerivedTables> {
    println!(
        "🚀 Deriving tags from {}",
        settings.database_path.display().to_string().bright_cyan()
    );

    let db = ElectionDatabase::open(&settings.database_path).await?;
    let mut metrics = MetricsCollector::new(db.pool().clone());
    metrics.start_stage("derivation");

    let mut source = read_source(&db).await?;
    source.profiles = derivation::load_profiles(&settings.profiles_dir)?;
    info!(
        "read {} FPTP and {} PR candidate rows",
        source.fptp_candidates.len(),
        source.pr_candidates.len()
    );

    let tables = derivation::derive(&source)?;
    store_tables(&db, &tables).await?;

    let rows = tables.fptp_candidates.len() + tables.pr_candidates.len();
    let timing = metrics
        .end_stage("derivation", PipelineStage::Derivation, None, Some(rows as u64))
        .await?;

    println!(
        "✅ {} FPTP candidates, {} PR candidates, {} constituencies, {} parties in {} ms",
        tables.fptp_candidates.len().to_string().bright_yellow(),
        tables.pr_candidates.len().to_string().bright_yellow(),
        tables.constituencies.len().to_string().bright_yellow(),
        tables.parties.len().to_string().bright_yellow(),
        timing.duration_ms
    );
    Ok(tables)
}
