//! Bounded fan-out of profile research calls.

use super::{user_message, CandidateSource, EnrichError, ProfileClient, Result};
use crate::export::write_json_atomic;
use crate::model::candidate::FptpCandidate;
use colored::*;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const MAX_CONCURRENCY: usize = 30;
/// Errors shown in the run summary.
pub const MAX_REPORTED_ERRORS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichOptions {
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub limit: Option<usize>,
    pub skip_existing: bool,
}

impl EnrichOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        EnrichOptions {
            output_dir: output_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            limit: None,
            skip_existing: true,
        }
    }
}

pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(1, MAX_CONCURRENCY)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateError {
    pub candidate_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<CandidateError>,
}

impl RunStats {
    fn record(&mut self, candidate_id: i64, outcome: Result<()>) {
        self.processed += 1;
        match outcome {
            Ok(()) => self.successful += 1,
            Err(e) => {
                warn!("candidate {} failed: {}", candidate_id, e);
                self.failed += 1;
                self.errors.push(CandidateError {
                    candidate_id,
                    message: e.to_string(),
                });
            }
        }
    }

    pub fn print_summary(&self) {
        println!("\n{}", "📊 Enrichment Summary".bold().cyan());
        println!("  Total candidates:   {}", self.total);
        println!("  Processed:          {}", self.processed);
        println!("  Skipped (existing): {}", self.skipped);
        println!("  Successful:         {}", self.successful.to_string().green());
        if self.failed > 0 {
            println!("  Failed:             {}", self.failed.to_string().red());
        } else {
            println!("  Failed:             {}", self.failed);
        }

        if !self.errors.is_empty() {
            println!("\n{} ({}):", "Errors".red().bold(), self.errors.len());
            for error in self.errors.iter().take(MAX_REPORTED_ERRORS) {
                println!("  - Candidate {}: {}", error.candidate_id, error.message);
            }
            if self.errors.len() > MAX_REPORTED_ERRORS {
                println!("  ... and {} more", self.errors.len() - MAX_REPORTED_ERRORS);
            }
        }
    }
}

pub fn profile_path(output_dir: &Path, candidate_id: i64) -> PathBuf {
    output_dir.join(format!("{}.json", candidate_id))
}

async fn research_one<C: ProfileClient + ?Sized>(
    client: &C,
    system_prompt: &str,
    source: &CandidateSource,
    path: &Path,
) -> Result<()> {
    let response = client
        .research(system_prompt, &user_message(source)?)
        .await?;
    let mut profile = response.profile.validated(source.candidate_id)?;
    profile.attach_sources(&response.source_urls);
    write_json_atomic(path, "candidate_profile", &profile)?;
    Ok(())
}

/// Research every candidate without a saved profile, at most
/// `options.concurrency` at a time. Per-candidate failures are counted, not
/// returned.
pub async fn enrich_candidates<C: ProfileClient + 'static>(
    client: Arc<C>,
    system_prompt: &str,
    candidates: &[FptpCandidate],
    options: &EnrichOptions,
) -> Result<RunStats> {
    fs::create_dir_all(&options.output_dir).map_err(|source| EnrichError::Read {
        path: options.output_dir.clone(),
        source,
    })?;

    let concurrency = clamp_concurrency(options.concurrency);
    println!(
        "🚀 Researching {} candidates with {} workers",
        options.limit.map_or(candidates.len(), |l| l.min(candidates.len())),
        concurrency
    );

    let system_prompt: Arc<str> = Arc::from(system_prompt);
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut tasks: JoinSet<(i64, Result<()>)> = JoinSet::new();
    let mut stats = RunStats::default();

    let limit = options.limit.unwrap_or(usize::MAX);
    for candidate in candidates.iter().take(limit) {
        stats.total += 1;
        let path = profile_path(&options.output_dir, candidate.candidate_id);
        if options.skip_existing && path.exists() {
            debug!("skip {} (profile exists)", candidate.candidate_id);
            stats.skipped += 1;
            continue;
        }

        let permit = permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EnrichError::PoolClosed)?;
        let client = Arc::clone(&client);
        let system_prompt = Arc::clone(&system_prompt);
        let source = CandidateSource::from(candidate);
        tasks.spawn(async move {
            let outcome = research_one(client.as_ref(), &system_prompt, &source, &path).await;
            drop(permit);
            (source.candidate_id, outcome)
        });

        while let Some(joined) = tasks.try_join_next() {
            let (candidate_id, outcome) = joined?;
            report(candidate_id, &outcome);
            stats.record(candidate_id, outcome);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let (candidate_id, outcome) = joined?;
        report(candidate_id, &outcome);
        stats.record(candidate_id, outcome);
    }

    Ok(stats)
}

fn report(candidate_id: i64, outcome: &Result<()>) {
    match outcome {
        Ok(()) => println!("  {} {}", "✅".green(), candidate_id),
        Err(e) => println!("  {} {}: {}", "❌".red(), candidate_id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::assemble;
    use crate::enrich::ProfileResponse;
    use crate::model::profile::{CandidateProfile, EventCategory, EventType, PoliticalEvent};
    use crate::tags::fptp;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the candidate id found in the user message; ids listed in
    /// `broken` answer for the wrong candidate.
    struct FakeClient {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        broken: Vec<i64>,
    }

    impl FakeClient {
        fn new(broken: Vec<i64>) -> Self {
            FakeClient {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                broken,
            }
        }
    }

    fn id_in(message: &str) -> i64 {
        let start = message.find("\"candidate_id\": ").unwrap() + "\"candidate_id\": ".len();
        message[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .unwrap()
    }

    #[async_trait]
    impl ProfileClient for FakeClient {
        async fn research(&self, _system_prompt: &str, user_message: &str) -> Result<ProfileResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let id = id_in(user_message);
            let answered = if self.broken.contains(&id) { id + 1 } else { id };
            Ok(ProfileResponse {
                profile: CandidateProfile {
                    candidate_id: answered,
                    candidate_name: "n".into(),
                    candidate_party: "X".into(),
                    candidate_party_logo: String::new(),
                    candidates_current_position: String::new(),
                    candidates_current_position_in_party: String::new(),
                    candidate_picture: String::new(),
                    election_history: Vec::new(),
                    political_history: vec![PoliticalEvent {
                        event: "e".into(),
                        date: "2079-08-04".into(),
                        details: "d".into(),
                        link_to_source: String::new(),
                        event_type: EventType::ElectionWin,
                        event_category: EventCategory::Good,
                    }],
                    analysis: "a".into(),
                    overall_approval_rating: 50,
                },
                source_urls: vec!["https://source.example".into()],
            })
        }
    }

    fn candidates(ids: &[i64]) -> Vec<FptpCandidate> {
        let matcher = fptp::tests::matcher();
        ids.iter()
            .map(|&id| {
                let mut facts = fptp::tests::facts();
                facts.record.candidate_id = id;
                let tagging = fptp::evaluate(&facts, &matcher);
                assemble::fptp_candidate(facts, tagging)
            })
            .collect()
    }

    #[tokio::test]
    async fn writes_profiles_and_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(FakeClient::new(vec![3]));
        let mut options = EnrichOptions::new(dir.path());
        options.concurrency = 2;

        let stats = enrich_candidates(client.clone(), "prompt", &candidates(&[1, 2, 3, 4]), &options)
            .await
            .unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.processed, 4);
        assert_eq!(stats.successful, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.errors[0].candidate_id, 3);
        assert!(client.peak.load(Ordering::SeqCst) <= 2);

        let saved: CandidateProfile = serde_json::from_str(
            &fs::read_to_string(profile_path(dir.path(), 1)).unwrap(),
        )
        .unwrap();
        assert_eq!(
            saved.political_history[0].link_to_source,
            "https://source.example"
        );
        assert!(!profile_path(dir.path(), 3).exists());
    }

    #[tokio::test]
    async fn existing_profiles_are_skipped_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(profile_path(dir.path(), 1), "{}").unwrap();
        let client = Arc::new(FakeClient::new(Vec::new()));
        let mut options = EnrichOptions::new(dir.path());

        let stats = enrich_candidates(client.clone(), "p", &candidates(&[1, 2]), &options)
            .await
            .unwrap();
        assert_eq!((stats.skipped, stats.successful), (1, 1));

        options.skip_existing = false;
        options.limit = Some(1);
        let stats = enrich_candidates(client.clone(), "p", &candidates(&[1, 2]), &options)
            .await
            .unwrap();
        assert_eq!((stats.total, stats.skipped, stats.successful), (1, 0, 1));
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrency_is_clamped() {
        assert_eq!(clamp_concurrency(0), 1);
        assert_eq!(clamp_concurrency(5), 5);
        assert_eq!(clamp_concurrency(100), MAX_CONCURRENCY);
    }
}
