use super::{CommandError, Result};
use colored::*;
use nepal_election::config::{google_api_key, Settings};
use nepal_election::enrich::{
    enrich_candidates, load_candidates, load_system_prompt, EnrichOptions, GeminiClient, RunStats,
};
use nepal_election::database::schema::DIM_FPTP_CANDIDATES;
use std::sync::Arc;

/// Research candidate profiles from the exported FPTP table. Fails when any
/// candidate could not be researched.
pub async fn enrich(settings: &Settings, limit: Option<usize>, no_skip: bool) -> Result<RunStats> {
    let api_key = google_api_key()?;
    let candidates_path = settings
        .export_dir
        .join(format!("{}.json", DIM_FPTP_CANDIDATES));
    let candidates = load_candidates(&candidates_path)?;
    let system_prompt = load_system_prompt(&settings.prompt_path)?;

    println!("Model: {}", settings.model.bright_cyan());
    println!(
        "Output: {}",
        settings.profiles_dir.display().to_string().bright_cyan()
    );

    let client = Arc::new(GeminiClient::new(api_key, settings.model.clone())?);
    let options = EnrichOptions {
        output_dir: settings.profiles_dir.clone(),
        concurrency: settings.concurrency,
        limit,
        skip_existing: !no_skip,
    };
    let stats = enrich_candidates(client, &system_prompt, &candidates, &options).await?;
    stats.print_summary();

    if stats.failed > 0 {
        return Err(CommandError::EnrichFailed(stats.failed));
    }
    Ok(stats)
}
