use super::ConstituencyKey;
use serde::{Deserialize, Serialize};

/// One candidate line of a past FPTP contest, ranked within its constituency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FptpResultEntry {
    pub candidate_name: String,
    pub party_name: String,
    pub symbol_name: Option<String>,
    pub vote_count: i64,
    pub rank: u32,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionalResultEntry {
    pub party_name: String,
    pub vote_count: i64,
    pub rank: u32,
}

/// Something with a vote count that can be ranked.
pub trait Ranked {
    fn vote_count(&self) -> i64;
    fn set_rank(&mut self, rank: u32);
    fn rank(&self) -> u32;
}

impl Ranked for FptpResultEntry {
    fn vote_count(&self) -> i64 {
        self.vote_count
    }
    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
    fn rank(&self) -> u32 {
        self.rank
    }
}

impl Ranked for ProportionalResultEntry {
    fn vote_count(&self) -> i64 {
        self.vote_count
    }
    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
    fn rank(&self) -> u32 {
        self.rank
    }
}

/// A row of `dim_constituency_profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituencyProfile {
    pub state_id: i64,
    pub state_name: String,
    pub district_id: i64,
    pub district_name: String,
    pub constituency_id: i64,
    pub constituency_name: String,
    pub fptp_2079_results: Vec<FptpResultEntry>,
    pub fptp_2074_results: Vec<FptpResultEntry>,
    pub proportional_2079_results: Vec<ProportionalResultEntry>,
    pub winning_party_2079: Option<String>,
    pub winning_party_2074: Option<String>,
    pub win_margin_2079: Option<f64>,
    pub win_margin_2074: Option<f64>,
    pub is_gadh: bool,
    pub gadh_party_name: Option<String>,
    pub is_swing_state: bool,
    pub is_pakad: bool,
    pub pakad_party_name: Option<String>,
    pub tags: Vec<String>,
}

impl ConstituencyProfile {
    pub fn key(&self) -> ConstituencyKey {
        ConstituencyKey {
            state_id: self.state_id,
            district_id: self.district_id,
            constituency_id: self.constituency_id,
        }
    }
}
