//! Candidate profile research. A [`ProfileClient`] turns a candidate's source
//! record into a researched [`CandidateProfile`]; [`pool`] fans the calls out
//! over a bounded number of tasks and writes one file per candidate.

pub mod gemini;
pub mod pool;

use crate::export::ExportError;
use crate::model::candidate::FptpCandidate;
use crate::model::profile::{CandidateProfile, ProfileError};
use crate::model::ContestResult;
use async_trait::async_trait;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use gemini::GeminiClient;
pub use pool::{enrich_candidates, CandidateError, EnrichOptions, RunStats};

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response from model")]
    EmptyResponse,
    #[error("profile rejected: {0}")]
    Profile(#[from] ProfileError),
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Write(#[from] ExportError),
    #[error("worker pool closed")]
    PoolClosed,
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, EnrichError>;

/// The subset of a candidate row sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSource {
    pub candidate_id: i64,
    pub candidate_name: String,
    pub father_name: Option<String>,
    pub spouse_name: Option<String>,
    pub district_name: Option<String>,
    pub prev_election_district: Option<String>,
    pub prev_election_party: Option<String>,
    pub prev_election_result: Option<ContestResult>,
    pub prev_election_votes: Option<i64>,
    pub prev_2074_election_district: Option<String>,
    pub prev_2074_election_party: Option<String>,
    pub prev_2074_election_result: Option<ContestResult>,
    pub prev_2074_election_votes: Option<i64>,
    pub political_party_name: String,
    pub party_previous_names: Vec<String>,
    pub candidate_image_url: String,
    pub is_vaguwa: bool,
    pub is_tourist_candidate: bool,
}

impl From<&FptpCandidate> for CandidateSource {
    fn from(c: &FptpCandidate) -> Self {
        CandidateSource {
            candidate_id: c.candidate_id,
            candidate_name: c.candidate_name.clone(),
            father_name: c.father_name.clone(),
            spouse_name: c.spouse_name.clone(),
            district_name: c.district_name.clone(),
            prev_election_district: c.prev_2079.prev_election_district.clone(),
            prev_election_party: c.prev_2079.prev_election_party.clone(),
            prev_election_result: c.prev_2079.prev_election_result,
            prev_election_votes: c.prev_2079.prev_election_votes,
            prev_2074_election_district: c.prev_2074.prev_2074_election_district.clone(),
            prev_2074_election_party: c.prev_2074.prev_2074_election_party.clone(),
            prev_2074_election_result: c.prev_2074.prev_2074_election_result,
            prev_2074_election_votes: c.prev_2074.prev_2074_election_votes,
            political_party_name: c.political_party_name.clone(),
            party_previous_names: c.party_previous_names.clone(),
            candidate_image_url: c.candidate_image_url.clone().unwrap_or_default(),
            is_vaguwa: c.flags.is_vaguwa,
            is_tourist_candidate: c.flags.is_tourist_candidate,
        }
    }
}

/// A model answer before validation, with the web sources it was grounded on.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResponse {
    pub profile: CandidateProfile,
    pub source_urls: Vec<String>,
}

#[async_trait]
pub trait ProfileClient: Send + Sync {
    async fn research(&self, system_prompt: &str, user_message: &str) -> Result<ProfileResponse>;
}

/// Strip frontmatter, header lines, code fences and leading blank lines from
/// a markdown prompt file.
pub fn extract_system_prompt(markdown: &str) -> String {
    let mut body = markdown;
    if body.starts_with("---") {
        let mut parts = body.splitn(3, "---");
        parts.next();
        parts.next();
        if let Some(rest) = parts.next() {
            body = rest;
        }
    }

    let mut lines: Vec<&str> = Vec::new();
    for line in body.split('\n') {
        if line.starts_with('#') || line.trim().starts_with("```") {
            continue;
        }
        if lines.is_empty() && line.trim().is_empty() {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

pub fn load_system_prompt(path: &Path) -> Result<String> {
    let markdown = fs::read_to_string(path).map_err(|source| EnrichError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(extract_system_prompt(&markdown))
}

/// Read the exported FPTP candidate table.
pub fn load_candidates(path: &Path) -> Result<Vec<FptpCandidate>> {
    let text = fs::read_to_string(path).map_err(|source| EnrichError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

pub fn user_message(source: &CandidateSource) -> Result<String> {
    Ok(format!(
        "\nHere is the SOURCE JSON for the candidate:\n\n{}\n\n\
         Please research and provide the enriched PROFILE JSON following the schema specified in the system prompt.\n\
         Use grounding metadata to populate link_to_source fields with actual web source URLs when available.\n",
        serde_json::to_string_pretty(source)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_drops_markdown_scaffolding() {
        let md = "---\ntitle: researcher\n---\n\n# Role\n\nYou research candidates.\n```json\n{\"a\": 1}\n```\n## Rules\nBe factual.\n";
        assert_eq!(
            extract_system_prompt(md),
            "You research candidates.\n{\"a\": 1}\nBe factual."
        );
    }

    #[test]
    fn prompt_without_frontmatter_is_kept() {
        assert_eq!(extract_system_prompt("\n\nplain\n"), "plain");
    }

    #[test]
    fn user_message_embeds_source_json() {
        let source = CandidateSource {
            candidate_id: 42,
            candidate_name: "राम".into(),
            father_name: None,
            spouse_name: None,
            district_name: Some("झापा".into()),
            prev_election_district: None,
            prev_election_party: None,
            prev_election_result: None,
            prev_election_votes: None,
            prev_2074_election_district: None,
            prev_2074_election_party: None,
            prev_2074_election_result: None,
            prev_2074_election_votes: None,
            political_party_name: "X".into(),
            party_previous_names: vec!["X (Old)".into()],
            candidate_image_url: String::new(),
            is_vaguwa: true,
            is_tourist_candidate: false,
        };
        let msg = user_message(&source).unwrap();
        assert!(msg.contains("\"candidate_id\": 42"));
        assert!(msg.contains("\"is_vaguwa\": true"));
        assert!(msg.contains("राम"));
    }
}
