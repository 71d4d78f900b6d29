/// Stage timings for pipeline runs, stored alongside the data they describe
use chrono::{DateTime, Utc};
use colored::*;
use instant::Instant;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageMetrics {
    pub stage: PipelineStage,
    pub dataset: Option<String>,
    pub duration_ms: u64,
    pub rows_processed: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Discovery,
    FileReading,
    DatabaseInsertion,
    Derivation,
    Validation,
    Export,
    Complete,
}

const STAGES: [(PipelineStage, &str); 7] = [
    (PipelineStage::Discovery, "discovery"),
    (PipelineStage::FileReading, "file_reading"),
    (PipelineStage::DatabaseInsertion, "database_insertion"),
    (PipelineStage::Derivation, "derivation"),
    (PipelineStage::Validation, "validation"),
    (PipelineStage::Export, "export"),
    (PipelineStage::Complete, "complete"),
];

impl PipelineStage {
    pub fn label(self) -> &'static str {
        STAGES
            .iter()
            .find(|(stage, _)| *stage == self)
            .map(|(_, label)| *label)
            .unwrap_or("complete")
    }

    /// Labels written by older runs fall back to `Complete`.
    fn from_label(label: &str) -> PipelineStage {
        STAGES
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(stage, _)| *stage)
            .unwrap_or(PipelineStage::Complete)
    }

    fn color(self) -> Color {
        match self {
            PipelineStage::Discovery => Color::Yellow,
            PipelineStage::FileReading => Color::Blue,
            PipelineStage::DatabaseInsertion => Color::Green,
            PipelineStage::Derivation => Color::Cyan,
            PipelineStage::Validation => Color::Magenta,
            PipelineStage::Export => Color::White,
            PipelineStage::Complete => Color::BrightGreen,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Times named stages and appends each finished one to `processing_metrics`.
/// Keys are free-form so one stage can run per dataset concurrently.
pub struct MetricsCollector {
    pool: SqlitePool,
    running: HashMap<String, Instant>,
}

impl MetricsCollector {
    pub fn new(pool: SqlitePool) -> Self {
        MetricsCollector {
            pool,
            running: HashMap::new(),
        }
    }

    pub fn start_stage(&mut self, key: &str) {
        self.running.insert(key.to_owned(), Instant::now());
    }

    /// Stop the timer under `key` and persist the row. A key that was never
    /// started records zero milliseconds.
    pub async fn end_stage(
        &mut self,
        key: &str,
        stage: PipelineStage,
        dataset: Option<&str>,
        rows_processed: Option<u64>,
    ) -> crate::database::Result<StageMetrics> {
        let elapsed_ms = match self.running.remove(key) {
            Some(started) => started.elapsed().as_millis() as u64,
            None => 0,
        };
        let entry = StageMetrics {
            stage,
            dataset: dataset.map(str::to_owned),
            duration_ms: elapsed_ms,
            rows_processed,
            timestamp: Utc::now(),
        };
        self.record(&entry).await?;
        Ok(entry)
    }

    async fn record(&self, entry: &StageMetrics) -> crate::database::Result<()> {
        sqlx::query(
            "INSERT INTO processing_metrics (stage, dataset, duration_ms, rows_processed, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.stage.label())
        .bind(entry.dataset.as_deref())
        .bind(entry.duration_ms as i64)
        .bind(entry.rows_processed.map(|r| r as i64))
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent stage timings, newest first
    pub async fn recent_metrics(&self, limit: i64) -> crate::database::Result<Vec<StageMetrics>> {
        let rows = sqlx::query(
            "SELECT stage, dataset, duration_ms, rows_processed, created_at \
             FROM processing_metrics ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut recent = Vec::with_capacity(rows.len());
        for row in rows {
            let label: String = row.try_get("stage")?;
            let duration_ms: i64 = row.try_get("duration_ms")?;
            let rows_processed: Option<i64> = row.try_get("rows_processed")?;
            recent.push(StageMetrics {
                stage: PipelineStage::from_label(&label),
                dataset: row.try_get("dataset")?,
                duration_ms: duration_ms.max(0) as u64,
                rows_processed: rows_processed.map(|r| r.max(0) as u64),
                timestamp: row.try_get("created_at")?,
            });
        }
        Ok(recent)
    }

    /// One line per stage run, then totals. `Complete` rows already span the
    /// stages before them so they are left out of the total.
    pub fn print_summary(&self, metrics: &[StageMetrics]) {
        println!("\n{}", "📊 Pipeline stage timings".bright_cyan().bold());
        println!("{}", "=".repeat(60).bright_cyan());

        let mut total_ms = 0u64;
        let mut total_rows = 0u64;
        for m in metrics {
            if m.stage != PipelineStage::Complete {
                total_ms += m.duration_ms;
                total_rows += m.rows_processed.unwrap_or(0);
            }
            let target = m.dataset.as_deref().unwrap_or("-");
            let rows = m
                .rows_processed
                .map(|r| format!("{} rows", r))
                .unwrap_or_default();
            println!(
                "{:<20} {:<34} {:>8} ms  {}",
                m.stage.label().color(m.stage.color()),
                target,
                m.duration_ms.to_string().bright_white(),
                rows.bright_yellow()
            );
        }

        println!("{}", "-".repeat(60).bright_cyan());
        println!(
            "{}: {} ms",
            "Total".bright_white().bold(),
            total_ms.to_string().bright_green().bold()
        );
        if total_ms > 0 && total_rows > 0 {
            println!(
                "{}: {:.0} rows/sec",
                "Throughput".bright_white().bold(),
                total_rows as f64 * 1000.0 / total_ms as f64
            );
        }
        println!();
    }
}

pub async fn create_metrics_table(pool: &SqlitePool) -> crate::database::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS processing_metrics (
            id INTEGER PRIMARY KEY,
            stage TEXT NOT NULL,
            dataset TEXT,
            duration_ms INTEGER NOT NULL,
            rows_processed INTEGER,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_processing_metrics_stage ON processing_metrics(stage)")
        .execute(pool)
        .await?;
    Ok(())
}
