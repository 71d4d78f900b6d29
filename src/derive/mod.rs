//! Joins the loaded datasets and runs the tag engine over every candidate and
//! constituency.

pub(crate) mod assemble;
pub mod index;
pub mod parties;

use crate::model::candidate::{FptpCandidate, FptpFacts, PrCandidate, PrFacts, ProfileFacts};
use crate::model::constituency::{ConstituencyProfile, FptpResultEntry, ProportionalResultEntry};
use crate::model::party::Party;
use crate::model::profile::CandidateProfile;
use crate::model::raw::{
    ConstituencyCountRecord, DistrictRecord, FamilyLinkRecord, FptpCandidateRecord,
    ParliamentMemberRecord, PartySeedRecord, PartySymbolRecord, PastFptpResultRecord,
    PrCandidateRecord, PrPartyVoteRecord, StateRecord,
};
use crate::model::{ConstituencyKey, Cycle};
use crate::normalize::{clean_text, non_blank, residence_district, QualificationLevel};
use crate::tags::{self, PartyMatcher};
use index::{CycleResults, FamilyIndex, MatchHint, ParliamentIndex};
use itertools::Itertools;
use log::{info, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("party id {0} appears more than once in the party seed")]
    DuplicatePartyId(i64),
    #[error("party name {0:?} appears more than once in the party seed")]
    DuplicatePartyName(String),
    #[error("district {district_id} in the constituency table has no district record")]
    UnknownDistrict { district_id: i64 },
    #[error("cannot read profiles from {path}: {source}")]
    Profiles {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DeriveError>;

/// Every loaded dataset, typed.
#[derive(Debug, Clone, Default)]
pub struct SourceData {
    pub states: Vec<StateRecord>,
    pub districts: Vec<DistrictRecord>,
    pub constituencies: Vec<ConstituencyCountRecord>,
    pub fptp_candidates: Vec<FptpCandidateRecord>,
    pub pr_candidates: Vec<PrCandidateRecord>,
    pub fptp_2079: Vec<PastFptpResultRecord>,
    pub fptp_2074: Vec<PastFptpResultRecord>,
    pub pr_2079: Vec<PrPartyVoteRecord>,
    pub pr_2074: Vec<PrPartyVoteRecord>,
    pub parliament_members: Vec<ParliamentMemberRecord>,
    pub party_symbols: Vec<PartySymbolRecord>,
    pub party_seeds: Vec<PartySeedRecord>,
    pub families: Vec<FamilyLinkRecord>,
    pub profiles: HashMap<i64, CandidateProfile>,
}

#[derive(Debug, Clone, Default)]
pub struct DerivedTables {
    pub fptp_candidates: Vec<FptpCandidate>,
    pub pr_candidates: Vec<PrCandidate>,
    pub constituencies: Vec<ConstituencyProfile>,
    pub parties: Vec<Party>,
    pub party_symbols: Vec<PartySymbolRecord>,
}

/// Read `<candidate_id>.json` profiles written by the enrichment job.
/// Unreadable or invalid files are skipped with a warning.
pub fn load_profiles(dir: &Path) -> Result<HashMap<i64, CandidateProfile>> {
    let mut profiles = HashMap::new();
    if !dir.exists() {
        return Ok(profiles);
    }
    let entries = std::fs::read_dir(dir).map_err(|source| DeriveError::Profiles {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let id = match path.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse::<i64>().ok()) {
            Some(id) => id,
            None => continue,
        };
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<CandidateProfile>(&text).map_err(|e| e.to_string()))
            .and_then(|profile| profile.validated(id).map_err(|e| e.to_string()));
        match parsed {
            Ok(profile) => {
                profiles.insert(id, profile);
            }
            Err(e) => warn!("skipping profile {}: {}", path.display(), e),
        }
    }
    info!("loaded {} candidate profiles from {}", profiles.len(), dir.display());
    Ok(profiles)
}

struct Geography {
    state_names: HashMap<i64, String>,
    district_names: HashMap<i64, String>,
    seats: BTreeMap<ConstituencyKey, String>,
}

impl Geography {
    fn new(source: &SourceData) -> Result<Self> {
        let state_names = source
            .states
            .iter()
            .map(|s| (s.state_id, s.state_name.clone()))
            .collect();
        let district_names: HashMap<i64, String> = source
            .districts
            .iter()
            .map(|d| (d.district_id, d.district_name.clone()))
            .collect();
        let district_states: HashMap<i64, i64> = source
            .districts
            .iter()
            .map(|d| (d.district_id, d.state_id))
            .collect();
        let mut seats = BTreeMap::new();
        for count in &source.constituencies {
            let state_id = *district_states
                .get(&count.district_id)
                .ok_or(DeriveError::UnknownDistrict {
                    district_id: count.district_id,
                })?;
            let district_name = district_names
                .get(&count.district_id)
                .ok_or(DeriveError::UnknownDistrict {
                    district_id: count.district_id,
                })?;
            for constituency_id in 1..=count.consts {
                seats.insert(
                    ConstituencyKey {
                        state_id,
                        district_id: count.district_id,
                        constituency_id,
                    },
                    format!("{}-{}", district_name, constituency_id),
                );
            }
        }
        Ok(Geography {
            state_names,
            district_names,
            seats,
        })
    }
}

/// Rank within the same party and inclusive group, keyed by (party, serial).
fn ranks_within_group(candidates: &[PrCandidateRecord]) -> HashMap<(String, i64), u32> {
    candidates
        .iter()
        .into_group_map_by(|c| {
            (
                clean_text(&c.political_party_name),
                c.inclusive_group.as_deref().map(clean_text).unwrap_or_default(),
            )
        })
        .into_values()
        .flat_map(|group| {
            group
                .into_iter()
                .sorted_by_key(|c| (c.rank_position, c.serial_no))
                .enumerate()
                .map(|(idx, c)| ((clean_text(&c.political_party_name), c.serial_no), idx as u32 + 1))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn profile_facts(profile: Option<&CandidateProfile>) -> ProfileFacts {
    match profile {
        None => ProfileFacts::default(),
        Some(p) => ProfileFacts {
            minister_appointments: p.minister_appointments(),
            elections_contested: p.election_history.len() as u32,
            election_wins: Some(p.election_wins()),
        },
    }
}

/// Run the whole derivation. Pure apart from logging.
pub fn derive(source: &SourceData) -> Result<DerivedTables> {
    let geography = Geography::new(source)?;
    let parties = parties::build_party_table(source)?;
    let matcher = PartyMatcher::new(&parties);

    let results_2079 = CycleResults::new(Cycle::Y2079, &source.fptp_2079, &geography.district_names);
    let results_2074 = CycleResults::new(Cycle::Y2074, &source.fptp_2074, &geography.district_names);
    let parliament = ParliamentIndex::new(&source.parliament_members);
    let families = FamilyIndex::new(
        &source.families,
        source
            .fptp_candidates
            .iter()
            .map(|c| c.candidate_name.as_str())
            .chain(source.pr_candidates.iter().map(|c| c.candidate_name.as_str())),
    );

    let mut fptp_candidates: Vec<FptpCandidate> = source
        .fptp_candidates
        .iter()
        .map(|record| {
            let key = ConstituencyKey {
                state_id: record.state_id,
                district_id: record.district_id,
                constituency_id: record.constituency_id,
            };
            let district_name = geography
                .district_names
                .get(&record.district_id)
                .cloned()
                .or_else(|| non_blank(record.district_name.as_deref()));
            let hint = MatchHint {
                father_name: record.father_name.as_deref(),
                district_id: Some(record.district_id),
                district_name: district_name.as_deref(),
            };
            let facts = FptpFacts {
                state_name: geography.state_names.get(&record.state_id).cloned(),
                constituency_name: geography.seats.get(&key).cloned(),
                party: matcher.resolve(&record.political_party_name).cloned(),
                contest_2079: results_2079
                    .find(&record.candidate_name, hint)
                    .map(|r| results_2079.contest(r)),
                contest_2074: results_2074
                    .find(&record.candidate_name, hint)
                    .map(|r| results_2074.contest(r)),
                membership_2079: parliament.find(Cycle::Y2079, &record.candidate_name, district_name.as_deref()),
                membership_2074: parliament.find(Cycle::Y2074, &record.candidate_name, district_name.as_deref()),
                profile: profile_facts(source.profiles.get(&record.candidate_id)),
                family: families.facts(&record.candidate_name, record.spouse_name.as_deref()),
                qualification_level: record
                    .qualification
                    .as_deref()
                    .and_then(QualificationLevel::classify),
                residence_district: record.address.as_deref().and_then(residence_district),
                district_name,
                record: record.clone(),
            };
            let tagging = tags::fptp::evaluate(&facts, &matcher);
            assemble::fptp_candidate(facts, tagging)
        })
        .collect();
    fptp_candidates.sort_by_key(|c| (c.key(), c.candidate_id));

    let group_ranks = ranks_within_group(&source.pr_candidates);
    let mut pr_candidates: Vec<PrCandidate> = source
        .pr_candidates
        .iter()
        .map(|record| {
            let hint = MatchHint {
                district_name: record.citizenship_district.as_deref(),
                ..MatchHint::default()
            };
            let facts = PrFacts {
                party: matcher.resolve(&record.political_party_name).cloned(),
                rank_within_group: group_ranks
                    .get(&(clean_text(&record.political_party_name), record.serial_no))
                    .copied()
                    .unwrap_or(0),
                contest_2079: results_2079
                    .find(&record.candidate_name, hint)
                    .map(|r| results_2079.contest(r)),
                contest_2074: results_2074
                    .find(&record.candidate_name, hint)
                    .map(|r| results_2074.contest(r)),
                membership_2079: parliament.find(
                    Cycle::Y2079,
                    &record.candidate_name,
                    record.citizenship_district.as_deref(),
                ),
                membership_2074: parliament.find(
                    Cycle::Y2074,
                    &record.candidate_name,
                    record.citizenship_district.as_deref(),
                ),
                family: families.facts(&record.candidate_name, None),
                record: record.clone(),
            };
            let tagging = tags::pr::evaluate(&facts, &matcher);
            assemble::pr_candidate(facts, tagging)
        })
        .collect();
    pr_candidates.sort_by(|a, b| {
        (&a.political_party_name, a.rank_position, a.serial_no)
            .cmp(&(&b.political_party_name, b.rank_position, b.serial_no))
    });

    let constituencies = constituency_profiles(source, &geography, &results_2079, &results_2074, &matcher);

    info!(
        "derived {} FPTP candidates, {} PR candidates, {} constituencies",
        fptp_candidates.len(),
        pr_candidates.len(),
        constituencies.len()
    );
    Ok(DerivedTables {
        fptp_candidates,
        pr_candidates,
        constituencies,
        parties,
        party_symbols: source.party_symbols.clone(),
    })
}

fn result_entries(records: &[&PastFptpResultRecord]) -> Vec<FptpResultEntry> {
    records
        .iter()
        .map(|r| FptpResultEntry {
            candidate_name: r.candidate_name.clone(),
            party_name: r.political_party_name.clone(),
            symbol_name: r.symbol_name.clone(),
            vote_count: r.votes,
            rank: 0,
            remarks: r.remarks.clone(),
        })
        .collect()
}

fn constituency_profiles(
    source: &SourceData,
    geography: &Geography,
    results_2079: &CycleResults<'_>,
    results_2074: &CycleResults<'_>,
    matcher: &PartyMatcher,
) -> Vec<ConstituencyProfile> {
    let mut pr_by_seat: HashMap<(i64, i64), BTreeMap<String, i64>> = HashMap::new();
    for row in &source.pr_2079 {
        if let (Some(district_id), Some(constituency_id)) = (row.district_id, row.constituency_id) {
            *pr_by_seat
                .entry((district_id, constituency_id))
                .or_default()
                .entry(clean_text(&row.political_party_name))
                .or_default() += row.votes;
        }
    }

    geography
        .seats
        .iter()
        .map(|(key, name)| {
            let proportional_2079_results = pr_by_seat
                .get(&(key.district_id, key.constituency_id))
                .map(|parties| {
                    parties
                        .iter()
                        .map(|(party_name, votes)| ProportionalResultEntry {
                            party_name: party_name.clone(),
                            vote_count: *votes,
                            rank: 0,
                        })
                        .collect()
                })
                .unwrap_or_default();
            let mut profile = ConstituencyProfile {
                state_id: key.state_id,
                state_name: geography
                    .state_names
                    .get(&key.state_id)
                    .cloned()
                    .unwrap_or_default(),
                district_id: key.district_id,
                district_name: geography
                    .district_names
                    .get(&key.district_id)
                    .cloned()
                    .unwrap_or_default(),
                constituency_id: key.constituency_id,
                constituency_name: name.clone(),
                fptp_2079_results: result_entries(results_2079.seat(key.district_id, key.constituency_id)),
                fptp_2074_results: result_entries(results_2074.seat(key.district_id, key.constituency_id)),
                proportional_2079_results,
                winning_party_2079: None,
                winning_party_2074: None,
                win_margin_2079: None,
                win_margin_2074: None,
                is_gadh: false,
                gadh_party_name: None,
                is_swing_state: false,
                is_pakad: false,
                pakad_party_name: None,
                tags: Vec::new(),
            };
            tags::constituency::finalize(&mut profile, matcher);
            profile
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::raw::Relation;
    use crate::model::{ContestResult, ElectionType};

    fn past(name: &str, party: &str, district: i64, seat: i64, votes: i64, elected: bool) -> PastFptpResultRecord {
        PastFptpResultRecord {
            candidate_id: None,
            candidate_name: name.into(),
            gender: None,
            age: None,
            political_party_name: party.into(),
            symbol_name: None,
            state_id: Some(1),
            district_id: district,
            district_name: None,
            constituency_id: seat,
            votes,
            casted_vote: None,
            total_voters: None,
            rank: None,
            remarks: elected.then(|| "Elected".to_string()),
            father_name: None,
            qualification: None,
        }
    }

    fn source() -> SourceData {
        let mut candidate = crate::tags::fptp::tests::record();
        candidate.spouse_name = Some("सीता शर्मा".into());
        let mut source = SourceData {
            states: vec![StateRecord { state_id: 1, state_name: "कोशी".into() }],
            districts: vec![DistrictRecord { district_id: 4, district_name: "झापा".into(), state_id: 1 }],
            constituencies: vec![ConstituencyCountRecord { district_id: 4, consts: 5 }],
            fptp_candidates: vec![candidate],
            fptp_2079: vec![
                past("राम बहादुर", "X", 4, 3, 45_000, true),
                past("अर्को", "Y", 4, 3, 20_000, false),
            ],
            fptp_2074: vec![
                past("राम बहादुर", "X (Old)", 4, 3, 30_000, true),
                past("अर्को", "Y", 4, 3, 29_000, false),
            ],
            party_seeds: vec![PartySeedRecord {
                party_id: 1,
                current_party_name: "X".into(),
                previous_names: vec!["X (Old)".into()],
                party_display_order: Some(0),
                party_name_en: None,
            }],
            ..SourceData::default()
        };
        source.pr_candidates = vec![PrCandidateRecord {
            serial_no: 1,
            candidate_name: "सीता शर्मा".into(),
            gender: Some("महिला".into()),
            political_party_name: "X".into(),
            inclusive_group: None,
            backward_area: None,
            disability: None,
            citizenship_district: None,
            voter_id_number: None,
            rank_position: 1,
            associated_party: None,
            remarks: None,
        }];
        source.families = vec![FamilyLinkRecord {
            candidate_name: "सीता शर्मा".into(),
            relation: Some(Relation::Spouse),
            relative_name: Some("राम बहादुर".into()),
            is_family_source: false,
        }];
        source.parliament_members = vec![ParliamentMemberRecord {
            member_id: 9,
            name_np: Some("राम बहादुर".into()),
            name_en: None,
            gender: None,
            status: None,
            district_name_np: Some("झापा".into()),
            district_name_en: None,
            political_party_name_np: Some("X".into()),
            political_party_name_en: None,
            election_type: Some(ElectionType::Fptp),
            election_area_no: Some(3),
            registered_date_bs: Some("2079-09-10".into()),
            tenure_end_date: None,
        }];
        source
    }

    #[test]
    fn joins_history_across_cycles() {
        let tables = derive(&source()).unwrap();
        assert_eq!(tables.constituencies.len(), 5);

        let c = &tables.fptp_candidates[0];
        assert_eq!(c.prev_2079.prev_election_result, Some(ContestResult::Winner));
        assert_eq!(c.prev_2074.prev_2074_election_party.as_deref(), Some("X (Old)"));
        assert!(c.parliament.was_parliament_member_2079);
        assert!(c.flags.is_loyal && !c.flags.is_chheparo);
        assert!(c.flags.is_budi_bokuwa);
        assert_eq!(c.party_id, Some(1));
        assert_eq!(c.constituency_name.as_deref(), Some("झापा-3"));
        assert_eq!(c.candidate_type, "Same Location");

        let seat = tables
            .constituencies
            .iter()
            .find(|p| p.constituency_id == 3)
            .unwrap();
        assert!(seat.is_gadh);
        assert_eq!(seat.tags[0], "Gadh: X");

        let pr = &tables.pr_candidates[0];
        assert_eq!(pr.rank_within_group, 1);
        assert!(pr.flags.is_budo_bokuwa && pr.flags.is_new_candidate);
        assert_eq!(pr.party_id, Some(1));
    }

    #[test]
    fn group_rank_counts_within_party_and_group() {
        let mut a = source().pr_candidates.remove(0);
        a.rank_position = 4;
        let mut b = a.clone();
        b.serial_no = 2;
        b.rank_position = 2;
        let mut c = a.clone();
        c.serial_no = 3;
        c.inclusive_group = Some("दलित".into());
        let ranks = ranks_within_group(&[a, b, c]);
        assert_eq!(ranks[&("X".to_string(), 1)], 2);
        assert_eq!(ranks[&("X".to_string(), 2)], 1);
        assert_eq!(ranks[&("X".to_string(), 3)], 1);
    }

    #[test]
    fn unknown_district_in_constituency_table_is_fatal() {
        let mut source = source();
        source.constituencies.push(ConstituencyCountRecord { district_id: 99, consts: 1 });
        assert!(matches!(
            derive(&source),
            Err(DeriveError::UnknownDistrict { district_id: 99 })
        ));
    }

    #[test]
    fn missing_profile_dir_is_empty() {
        let profiles = load_profiles(Path::new("/nonexistent/profiles")).unwrap();
        assert!(profiles.is_empty());
    }
}
