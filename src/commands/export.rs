use super::{CommandError, Result};
use colored::*;
use nepal_election::config::Settings;
use nepal_election::database::dimensions::{has_dimensions, load_tables};
use nepal_election::database::metrics::{MetricsCollector, PipelineStage};
use nepal_election::database::ElectionDatabase;
use nepal_election::export::{export_tables, ExportedFile};

/// Write every derived table to `settings.export_dir`.
pub async fn export(settings: &Settings) -> Result<Vec<ExportedFile>> {
    let db = ElectionDatabase::open(&settings.database_path).await?;
    if !has_dimensions(&db).await? {
        return Err(CommandError::NotDerived(
            settings.database_path.display().to_string(),
        ));
    }

    let mut metrics = MetricsCollector::new(db.pool().clone());
    metrics.start_stage("export");
    let tables = load_tables(&db).await?;
    let files = export_tables(&tables, &settings.export_dir)?;
    let rows: usize = files.iter().map(|f| f.rows).sum();
    metrics
        .end_stage("export", PipelineStage::Export, None, Some(rows as u64))
        .await?;

    for file in &files {
        println!(
            "✅ {} {} rows → {}",
            file.table.bright_white(),
            file.rows.to_string().bright_yellow(),
            file.path.display().to_string().bright_cyan()
        );
    }
    Ok(files)
}
