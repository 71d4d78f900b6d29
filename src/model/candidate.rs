//! Candidate records: the joined facts the tag engine reads and the flat
//! rows exported to the dashboard.

use super::party::Party;
use super::raw::{FptpCandidateRecord, PrCandidateRecord};
use super::{ConstituencyKey, ContestResult, ElectionType};
use crate::normalize::QualificationLevel;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Joined facts
// ---------------------------------------------------------------------------

/// A candidate's line in one past FPTP contest.
#[derive(Debug, Clone, PartialEq)]
pub struct PastContest {
    pub votes: i64,
    pub rank: Option<i64>,
    pub remarks: Option<String>,
    pub result: ContestResult,
    pub party: String,
    pub state_id: Option<i64>,
    pub district_id: i64,
    pub district_name: Option<String>,
    pub constituency_id: i64,
    /// Valid votes cast in the constituency.
    pub casted_vote: i64,
    pub total_voters: Option<i64>,
    /// Votes of the second-placed candidate.
    pub runner_up_votes: Option<i64>,
    pub winner_votes: i64,
    pub qualification: Option<String>,
}

impl PastContest {
    /// Signed margin over the nearest rival as a share of votes cast: the lead
    /// over the runner-up for winners, the deficit to the winner for losers.
    pub fn margin(&self) -> Option<f64> {
        if self.casted_vote <= 0 {
            return None;
        }
        let rival = match self.result {
            ContestResult::Winner => self.runner_up_votes.unwrap_or(0),
            ContestResult::Loser => self.winner_votes,
        };
        Some((self.votes - rival) as f64 / self.casted_vote as f64)
    }

    pub fn vote_share(&self) -> Option<f64> {
        if self.casted_vote <= 0 {
            None
        } else {
            Some(self.votes as f64 / self.casted_vote as f64)
        }
    }

    pub fn same_seat(&self, district_id: i64, constituency_id: i64) -> bool {
        self.district_id == district_id && self.constituency_id == constituency_id
    }
}

/// House of Representatives membership in one past term.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub election_type: Option<ElectionType>,
    pub party: Option<String>,
    pub district: Option<String>,
    pub constituency: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyFacts {
    pub has_known_relative: bool,
    pub is_family_source: bool,
    pub has_known_spouse: bool,
    pub has_known_parent: bool,
    /// The spouse is standing in the current election too.
    pub spouse_is_candidate: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFacts {
    pub minister_appointments: u32,
    pub elections_contested: u32,
    pub election_wins: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FptpFacts {
    pub record: FptpCandidateRecord,
    pub state_name: Option<String>,
    pub district_name: Option<String>,
    pub constituency_name: Option<String>,
    pub party: Option<Party>,
    pub contest_2079: Option<PastContest>,
    pub contest_2074: Option<PastContest>,
    pub membership_2079: Option<Membership>,
    pub membership_2074: Option<Membership>,
    pub profile: ProfileFacts,
    pub family: FamilyFacts,
    pub qualification_level: Option<QualificationLevel>,
    pub residence_district: Option<String>,
}

impl FptpFacts {
    pub fn key(&self) -> ConstituencyKey {
        ConstituencyKey {
            state_id: self.record.state_id,
            district_id: self.record.district_id,
            constituency_id: self.record.constituency_id,
        }
    }

    /// Most recent past contest, 2079 first.
    pub fn latest_contest(&self) -> Option<&PastContest> {
        self.contest_2079.as_ref().or(self.contest_2074.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrFacts {
    pub record: PrCandidateRecord,
    pub party: Option<Party>,
    pub rank_within_group: u32,
    pub contest_2079: Option<PastContest>,
    pub contest_2074: Option<PastContest>,
    pub membership_2079: Option<Membership>,
    pub membership_2074: Option<Membership>,
    pub family: FamilyFacts,
}

impl PrFacts {
    pub fn latest_contest(&self) -> Option<&PastContest> {
        self.contest_2079.as_ref().or(self.contest_2074.as_ref())
    }

    pub fn memberships(&self) -> impl Iterator<Item = &Membership> {
        self.membership_2079.iter().chain(self.membership_2074.iter())
    }
}

// ---------------------------------------------------------------------------
// Exported rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrevElection2079 {
    pub prev_election_votes: Option<i64>,
    pub prev_election_rank: Option<i64>,
    pub prev_election_remarks: Option<String>,
    pub prev_election_result: Option<ContestResult>,
    pub prev_election_party: Option<String>,
    pub prev_election_state: Option<i64>,
    pub prev_election_district: Option<String>,
    pub prev_election_district_cd: Option<i64>,
    pub prev_election_constituency_id: Option<i64>,
    pub prev_election_casted_vote: Option<i64>,
    pub prev_election_total_voters: Option<i64>,
    pub prev_qualification: Option<String>,
    pub prev_qualification_level: Option<String>,
    pub prev_runner_up_votes: Option<i64>,
}

impl From<Option<&PastContest>> for PrevElection2079 {
    fn from(contest: Option<&PastContest>) -> Self {
        match contest {
            None => PrevElection2079::default(),
            Some(c) => PrevElection2079 {
                prev_election_votes: Some(c.votes),
                prev_election_rank: c.rank,
                prev_election_remarks: c.remarks.clone(),
                prev_election_result: Some(c.result),
                prev_election_party: Some(c.party.clone()),
                prev_election_state: c.state_id,
                prev_election_district: c.district_name.clone(),
                prev_election_district_cd: Some(c.district_id),
                prev_election_constituency_id: Some(c.constituency_id),
                prev_election_casted_vote: Some(c.casted_vote),
                prev_election_total_voters: c.total_voters,
                prev_qualification: c.qualification.clone(),
                prev_qualification_level: c
                    .qualification
                    .as_deref()
                    .and_then(QualificationLevel::classify)
                    .map(|l| l.label().to_string()),
                prev_runner_up_votes: c.runner_up_votes,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrevElection2074 {
    pub prev_2074_election_votes: Option<i64>,
    pub prev_2074_election_rank: Option<i64>,
    pub prev_2074_election_remarks: Option<String>,
    pub prev_2074_election_result: Option<ContestResult>,
    pub prev_2074_election_party: Option<String>,
    pub prev_2074_election_state: Option<i64>,
    pub prev_2074_election_district: Option<String>,
    pub prev_2074_election_district_cd: Option<i64>,
    pub prev_2074_election_constituency_id: Option<i64>,
    pub prev_2074_election_casted_vote: Option<i64>,
    pub prev_2074_election_total_voters: Option<i64>,
    pub prev_2074_runner_up_votes: Option<i64>,
}

impl From<Option<&PastContest>> for PrevElection2074 {
    fn from(contest: Option<&PastContest>) -> Self {
        match contest {
            None => PrevElection2074::default(),
            Some(c) => PrevElection2074 {
                prev_2074_election_votes: Some(c.votes),
                prev_2074_election_rank: c.rank,
                prev_2074_election_remarks: c.remarks.clone(),
                prev_2074_election_result: Some(c.result),
                prev_2074_election_party: Some(c.party.clone()),
                prev_2074_election_state: c.state_id,
                prev_2074_election_district: c.district_name.clone(),
                prev_2074_election_district_cd: Some(c.district_id),
                prev_2074_election_constituency_id: Some(c.constituency_id),
                prev_2074_election_casted_vote: Some(c.casted_vote),
                prev_2074_election_total_voters: c.total_voters,
                prev_2074_runner_up_votes: c.runner_up_votes,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParliamentFields {
    pub was_parliament_member_2079: bool,
    pub parliament_member_2079_election_type: Option<ElectionType>,
    pub parliament_member_2079_party: Option<String>,
    pub parliament_member_2079_district: Option<String>,
    pub parliament_member_2079_constituency: Option<i64>,
    pub was_parliament_member_2074: bool,
    pub parliament_member_2074_election_type: Option<ElectionType>,
    pub parliament_member_2074_party: Option<String>,
    pub parliament_member_2074_district: Option<String>,
    pub parliament_member_2074_constituency: Option<i64>,
}

impl ParliamentFields {
    pub fn new(m2079: Option<&Membership>, m2074: Option<&Membership>) -> Self {
        ParliamentFields {
            was_parliament_member_2079: m2079.is_some(),
            parliament_member_2079_election_type: m2079.and_then(|m| m.election_type),
            parliament_member_2079_party: m2079.and_then(|m| m.party.clone()),
            parliament_member_2079_district: m2079.and_then(|m| m.district.clone()),
            parliament_member_2079_constituency: m2079.and_then(|m| m.constituency),
            was_parliament_member_2074: m2074.is_some(),
            parliament_member_2074_election_type: m2074.and_then(|m| m.election_type),
            parliament_member_2074_party: m2074.and_then(|m| m.party.clone()),
            parliament_member_2074_district: m2074.and_then(|m| m.district.clone()),
            parliament_member_2074_constituency: m2074.and_then(|m| m.constituency),
        }
    }

    pub fn was_member(&self) -> bool {
        self.was_parliament_member_2079 || self.was_parliament_member_2074
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FptpFlags {
    pub is_past_minister: bool,
    pub is_same_party_after_merger_check: bool,
    pub is_same_party_2074_after_merger_check: bool,
    pub is_same_party_2074_2079: bool,
    pub is_tourist_candidate: bool,
    pub is_education_changed: bool,
    pub is_vaguwa: bool,
    pub is_vaguwa_prev_winner: bool,
    pub is_educated: bool,
    pub is_uneducated: bool,
    pub is_gen_z: bool,
    pub is_grandpa: bool,
    pub is_influential: bool,
    pub is_split_vote_candidate: bool,
    pub is_loyal: bool,
    pub is_nepo: bool,
    pub is_new_party: bool,
    pub is_proportional_veteran: bool,
    pub is_chheparo: bool,
    pub is_new_candidate: bool,
    pub is_opportunist: bool,
    pub is_budi_bokuwa: bool,
    pub is_budo_bokuwa: bool,
}

/// A row of `dim_current_fptp_candidates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FptpCandidate {
    pub candidate_id: i64,
    pub candidate_name: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub age_group: Option<String>,
    pub father_name: Option<String>,
    pub spouse_name: Option<String>,
    pub qualification: Option<String>,
    pub qualification_level: Option<String>,
    pub qualification_level_scale: Option<u8>,
    pub institution_name: Option<String>,
    pub address: Option<String>,
    pub basobas_jilla: Option<String>,
    pub experience: Option<String>,
    pub other_details: Option<String>,
    pub symbol_code: Option<i64>,
    pub symbol_name: Option<String>,
    pub candidate_image_url: Option<String>,
    pub political_party_name: String,
    pub party_id: Option<i64>,
    #[serde(default)]
    pub party_previous_names: Vec<String>,
    pub party_display_order: Option<i64>,
    pub state_id: i64,
    pub state_name: Option<String>,
    pub district_id: i64,
    pub district_name: Option<String>,
    pub constituency_id: i64,
    pub constituency_name: Option<String>,
    pub citizenship_district: Option<String>,
    pub election_status: Option<String>,
    pub current_vote_received: Option<i64>,
    pub rank_position: Option<i64>,
    #[serde(flatten)]
    pub prev_2079: PrevElection2079,
    #[serde(flatten)]
    pub prev_2074: PrevElection2074,
    #[serde(flatten)]
    pub parliament: ParliamentFields,
    pub minister_appointment_count: u32,
    pub total_elections_contested: u32,
    pub total_wins_from_profile: Option<u32>,
    pub has_known_relative: bool,
    pub is_family_source: bool,
    pub has_known_spouse: bool,
    pub has_known_parent: bool,
    pub candidate_type: String,
    #[serde(flatten)]
    pub flags: FptpFlags,
    pub tags: Vec<String>,
}

impl FptpCandidate {
    pub fn key(&self) -> ConstituencyKey {
        ConstituencyKey {
            state_id: self.state_id,
            district_id: self.district_id,
            constituency_id: self.constituency_id,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrevFptp2079 {
    pub prev_2079_fptp_votes: Option<i64>,
    pub prev_2079_fptp_result: Option<ContestResult>,
    pub prev_2079_fptp_district: Option<String>,
    pub prev_2079_fptp_constituency_id: Option<i64>,
    pub prev_2079_fptp_margin: Option<f64>,
    pub prev_2079_fptp_party: Option<String>,
}

impl From<Option<&PastContest>> for PrevFptp2079 {
    fn from(contest: Option<&PastContest>) -> Self {
        match contest {
            None => PrevFptp2079::default(),
            Some(c) => PrevFptp2079 {
                prev_2079_fptp_votes: Some(c.votes),
                prev_2079_fptp_result: Some(c.result),
                prev_2079_fptp_district: c.district_name.clone(),
                prev_2079_fptp_constituency_id: Some(c.constituency_id),
                prev_2079_fptp_margin: c.margin(),
                prev_2079_fptp_party: Some(c.party.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrevFptp2074 {
    pub prev_2074_fptp_votes: Option<i64>,
    pub prev_2074_fptp_result: Option<ContestResult>,
    pub prev_2074_fptp_district: Option<String>,
    pub prev_2074_fptp_constituency_id: Option<i64>,
    pub prev_2074_fptp_margin: Option<f64>,
    pub prev_2074_fptp_party: Option<String>,
}

impl From<Option<&PastContest>> for PrevFptp2074 {
    fn from(contest: Option<&PastContest>) -> Self {
        match contest {
            None => PrevFptp2074::default(),
            Some(c) => PrevFptp2074 {
                prev_2074_fptp_votes: Some(c.votes),
                prev_2074_fptp_result: Some(c.result),
                prev_2074_fptp_district: c.district_name.clone(),
                prev_2074_fptp_constituency_id: Some(c.constituency_id),
                prev_2074_fptp_margin: c.margin(),
                prev_2074_fptp_party: Some(c.party.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrFlags {
    pub is_fptp_2079_loser: bool,
    pub is_fptp_2074_loser: bool,
    pub is_fptp_veteran: bool,
    pub is_same_party_2079_after_merger_check: Option<bool>,
    pub is_same_party_2074_after_merger_check: Option<bool>,
    pub is_party_loyal: bool,
    pub is_high_rank: bool,
    pub is_top_rank: bool,
    pub is_women: bool,
    pub is_inclusive_group: bool,
    pub has_disability: bool,
    pub is_from_backward_area: bool,
    pub is_from_improving_party: bool,
    pub is_from_declining_party: bool,
    pub is_varaute: bool,
    pub is_gati_xada: bool,
    pub is_hutihara: bool,
    pub is_new_party: bool,
    pub is_proportional_veteran: bool,
    pub is_chheparo: bool,
    pub is_new_candidate: bool,
    pub is_opportunist: bool,
    pub is_budi_bokuwa: bool,
    pub is_budo_bokuwa: bool,
}

/// A row of `dim_current_proportional_candidates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrCandidate {
    pub serial_no: i64,
    pub candidate_name: String,
    pub gender: Option<String>,
    pub political_party_name: String,
    pub party_id: Option<i64>,
    pub matched_party_name: Option<String>,
    #[serde(default)]
    pub party_previous_names: Vec<String>,
    pub party_display_order: Option<i64>,
    pub inclusive_group: Option<String>,
    pub backward_area: Option<String>,
    pub disability: Option<String>,
    pub citizenship_district: Option<String>,
    pub voter_id_number: Option<String>,
    pub associated_party: Option<String>,
    pub remarks: Option<String>,
    pub rank_position: i64,
    pub rank_within_group: u32,
    pub prev_2079_party_votes: Option<i64>,
    pub prev_2074_party_votes: Option<i64>,
    pub party_existed_2079: bool,
    pub party_existed_2074: bool,
    pub party_elections_contested: u32,
    #[serde(flatten)]
    pub fptp_2079: PrevFptp2079,
    #[serde(flatten)]
    pub fptp_2074: PrevFptp2074,
    #[serde(flatten)]
    pub parliament: ParliamentFields,
    pub times_elected: u32,
    #[serde(flatten)]
    pub flags: PrFlags,
    pub tags: Vec<String>,
}

impl PrCandidate {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
