use super::{CommandError, Result};
use colored::*;
use nepal_election::config::Settings;
use nepal_election::database::dimensions::{has_dimensions, load_tables};
use nepal_election::database::metrics::{MetricsCollector, PipelineStage};
use nepal_election::database::ElectionDatabase;
use nepal_election::export::write_json_atomic;
use nepal_election::validation::{self, ValidationReport};
use std::path::Path;

/// Issues listed per code before the rest are summarized.
const LISTED_PER_CODE: usize = 5;

/// Check the derived tables. Fails when the report holds any error.
pub async fn validate(settings: &Settings, report_path: Option<&Path>) -> Result<ValidationReport> {
    let db = ElectionDatabase::open(&settings.database_path).await?;
    if !has_dimensions(&db).await? {
        return Err(CommandError::NotDerived(
            settings.database_path.display().to_string(),
        ));
    }

    let mut metrics = MetricsCollector::new(db.pool().clone());
    metrics.start_stage("validation");
    let tables = load_tables(&db).await?;
    let report = validation::validate(&tables);
    metrics
        .end_stage(
            "validation",
            PipelineStage::Validation,
            None,
            Some(report.issues.len() as u64),
        )
        .await?;

    report.print(LISTED_PER_CODE);
    if let Some(path) = report_path {
        write_json_atomic(path, "validation_report", &report)?;
        println!("📄 Report written to {}", path.display().to_string().bright_cyan());
    }

    match report.errors().count() {
        0 => Ok(report),
        errors => Err(CommandError::ValidationFailed(errors)),
    }
}
