use super::Result;
use colored::*;
use nepal_election::config::Settings;
use nepal_election::database::ingestion::Dataset;
use nepal_election::database::metrics::MetricsCollector;
use nepal_election::database::schema::{
    DIM_CONSTITUENCY_PROFILE, DIM_FPTP_CANDIDATES, DIM_PARTIES, DIM_PR_CANDIDATES,
};
use nepal_election::database::ElectionDatabase;

const RECENT_STAGES: i64 = 20;

/// Print row counts per table and the most recent stage timings.
pub async fn info(settings: &Settings) -> Result<()> {
    let db = ElectionDatabase::open(&settings.database_path).await?;

    println!(
        "📊 {}",
        settings.database_path.display().to_string().bright_cyan()
    );
    println!("{}", "Raw datasets".bright_white().bold());
    for dataset in Dataset::ALL {
        let rows = db.count_rows(dataset.table()).await?;
        let count = if rows == 0 {
            "-".dimmed()
        } else {
            rows.to_string().bright_yellow()
        };
        println!("  {:<50} {}", dataset.table(), count);
    }

    println!("{}", "Derived tables".bright_white().bold());
    for table in [
        DIM_FPTP_CANDIDATES,
        DIM_PR_CANDIDATES,
        DIM_CONSTITUENCY_PROFILE,
        DIM_PARTIES,
    ] {
        let rows = db.count_rows(table).await?;
        println!("  {:<50} {}", table, rows.to_string().bright_yellow());
    }

    let metrics = MetricsCollector::new(db.pool().clone());
    let recent = metrics.recent_metrics(RECENT_STAGES).await?;
    metrics.print_summary(&recent);
    Ok(())
}
