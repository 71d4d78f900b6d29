//! Researched candidate profiles written by the enrichment job and read back
//! during derivation for minister history.

use serde::{Deserialize, Serialize};

pub const MAX_POLITICAL_EVENTS: usize = 35;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElectionHistoryEntry {
    pub year: String,
    pub position: String,
    pub district: String,
    pub constituency: String,
    pub result: String,
    pub party: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ElectionWin,
    ElectionLoss,
    MinisterialAppt,
    PartySwitch,
    ScandalCorruption,
    CourtCase,
    MajorAchievement,
    ControversialStatement,
    Resignation,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Good,
    Bad,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoliticalEvent {
    pub event: String,
    pub date: String,
    pub details: String,
    #[serde(default)]
    pub link_to_source: String,
    pub event_type: EventType,
    pub event_category: EventCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CandidateProfile {
    pub candidate_id: i64,
    pub candidate_name: String,
    pub candidate_party: String,
    #[serde(default)]
    pub candidate_party_logo: String,
    #[serde(default)]
    pub candidates_current_position: String,
    #[serde(default)]
    pub candidates_current_position_in_party: String,
    #[serde(default)]
    pub candidate_picture: String,
    #[serde(default)]
    pub election_history: Vec<ElectionHistoryEntry>,
    #[serde(default)]
    pub political_history: Vec<PoliticalEvent>,
    pub analysis: String,
    pub overall_approval_rating: u8,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("approval rating {0} is outside 0..=100")]
    RatingOutOfRange(u8),
    #[error("profile is for candidate {found}, expected {expected}")]
    WrongCandidate { expected: i64, found: i64 },
}

impl CandidateProfile {
    /// Enforce the limits the JSON schema alone cannot express.
    pub fn validated(mut self, expected_id: i64) -> Result<Self, ProfileError> {
        if self.overall_approval_rating > 100 {
            return Err(ProfileError::RatingOutOfRange(self.overall_approval_rating));
        }
        if self.candidate_id != expected_id {
            return Err(ProfileError::WrongCandidate {
                expected: expected_id,
                found: self.candidate_id,
            });
        }
        self.political_history.truncate(MAX_POLITICAL_EVENTS);
        Ok(self)
    }

    pub fn minister_appointments(&self) -> u32 {
        self.count_events(EventType::MinisterialAppt)
    }

    pub fn election_wins(&self) -> u32 {
        self.count_events(EventType::ElectionWin)
    }

    fn count_events(&self, event_type: EventType) -> u32 {
        self.political_history
            .iter()
            .filter(|e| e.event_type == event_type)
            .count() as u32
    }

    /// Fill blank source links round-robin from grounding URLs.
    pub fn attach_sources(&mut self, source_urls: &[String]) {
        if source_urls.is_empty() {
            return;
        }
        for (idx, event) in self.political_history.iter_mut().enumerate() {
            if event.link_to_source.trim().is_empty() {
                event.link_to_source = source_urls[idx % source_urls.len()].clone();
            }
        }
    }
}
