//! Lookup indexes joining current candidates to past results, parliament
//! terms and the political-family seed.

use crate::model::candidate::{FamilyFacts, Membership, PastContest};
use crate::model::raw::{FamilyLinkRecord, ParliamentMemberRecord, PastFptpResultRecord, Relation};
use crate::model::{ContestResult, Cycle};
use crate::normalize::{name_key, non_blank};
use itertools::Itertools;
use log::debug;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

/// What we know about a current candidate that helps tell namesakes apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchHint<'a> {
    pub father_name: Option<&'a str>,
    pub district_id: Option<i64>,
    pub district_name: Option<&'a str>,
}

fn same_key(a: Option<&str>, b: Option<&str>) -> Option<bool> {
    match (a.map(name_key), b.map(name_key)) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Some(a == b),
        _ => None,
    }
}

/// One cycle of FPTP results, grouped by seat and by candidate name.
pub struct CycleResults<'a> {
    cycle: Cycle,
    by_seat: BTreeMap<(i64, i64), Vec<&'a PastFptpResultRecord>>,
    by_name: HashMap<String, Vec<&'a PastFptpResultRecord>>,
    district_names: &'a HashMap<i64, String>,
}

impl<'a> CycleResults<'a> {
    pub fn new(
        cycle: Cycle,
        records: &'a [PastFptpResultRecord],
        district_names: &'a HashMap<i64, String>,
    ) -> Self {
        let mut by_seat: BTreeMap<(i64, i64), Vec<&PastFptpResultRecord>> = BTreeMap::new();
        for record in records {
            by_seat
                .entry((record.district_id, record.constituency_id))
                .or_default()
                .push(record);
        }
        for seat in by_seat.values_mut() {
            seat.sort_by_key(|r| Reverse(r.votes));
        }
        let by_name = records
            .iter()
            .map(|r| (name_key(&r.candidate_name), r))
            .into_group_map();
        CycleResults {
            cycle,
            by_seat,
            by_name,
            district_names,
        }
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    pub fn seats(&self) -> impl Iterator<Item = (&(i64, i64), &Vec<&'a PastFptpResultRecord>)> {
        self.by_seat.iter()
    }

    /// Seat results, highest vote first.
    pub fn seat(&self, district_id: i64, constituency_id: i64) -> &[&'a PastFptpResultRecord] {
        self.by_seat
            .get(&(district_id, constituency_id))
            .map_or(&[], |v| v.as_slice())
    }

    /// Find the past result line for a candidate by name. Namesakes are told
    /// apart by father's name, then district; ambiguity yields `None`.
    pub fn find(&self, name: &str, hint: MatchHint<'_>) -> Option<&'a PastFptpResultRecord> {
        let found = self.by_name.get(&name_key(name))?;
        let plausible: Vec<_> = found
            .iter()
            .copied()
            .filter(|r| same_key(hint.father_name, r.father_name.as_deref()) != Some(false))
            .collect();
        if plausible.len() <= 1 {
            return plausible.first().copied();
        }

        let by_father: Vec<_> = plausible
            .iter()
            .copied()
            .filter(|r| same_key(hint.father_name, r.father_name.as_deref()) == Some(true))
            .collect();
        if by_father.len() == 1 {
            return Some(by_father[0]);
        }

        let by_district: Vec<_> = plausible
            .iter()
            .copied()
            .filter(|r| {
                hint.district_id == Some(r.district_id)
                    || same_key(hint.district_name, self.district_name(r).as_deref()) == Some(true)
            })
            .collect();
        if by_district.len() == 1 {
            return Some(by_district[0]);
        }

        debug!(
            "{}: {} candidates named {} could not be told apart",
            self.cycle,
            plausible.len(),
            name
        );
        None
    }

    fn district_name(&self, record: &PastFptpResultRecord) -> Option<String> {
        non_blank(record.district_name.as_deref())
            .or_else(|| self.district_names.get(&record.district_id).cloned())
    }

    pub fn contest(&self, record: &PastFptpResultRecord) -> PastContest {
        let seat = self.seat(record.district_id, record.constituency_id);
        let seat_total: i64 = seat.iter().map(|r| r.votes).sum();
        let casted_vote = record.casted_vote.filter(|v| *v > 0).unwrap_or(seat_total);
        PastContest {
            votes: record.votes,
            rank: record.rank,
            remarks: record.remarks.clone(),
            result: if record.is_elected() {
                ContestResult::Winner
            } else {
                ContestResult::Loser
            },
            party: record.political_party_name.clone(),
            state_id: record.state_id,
            district_id: record.district_id,
            district_name: self.district_name(record),
            constituency_id: record.constituency_id,
            casted_vote,
            total_voters: record.total_voters,
            runner_up_votes: seat.get(1).map(|r| r.votes),
            winner_votes: seat.first().map_or(record.votes, |r| r.votes),
            qualification: record.qualification.clone(),
        }
    }
}

/// House members per term, keyed by name in either script.
pub struct ParliamentIndex<'a> {
    by_name: HashMap<(Cycle, String), Vec<&'a ParliamentMemberRecord>>,
}

impl<'a> ParliamentIndex<'a> {
    pub fn new(members: &'a [ParliamentMemberRecord]) -> Self {
        let mut by_name: HashMap<(Cycle, String), Vec<&ParliamentMemberRecord>> = HashMap::new();
        for member in members {
            let cycle = match member.registration_year().and_then(Cycle::for_registration_year) {
                Some(cycle) => cycle,
                None => continue,
            };
            let keys: HashSet<String> = [member.name_np.as_deref(), member.name_en.as_deref()]
                .into_iter()
                .flatten()
                .map(name_key)
                .filter(|k| !k.is_empty())
                .collect();
            for key in keys {
                by_name.entry((cycle, key)).or_default().push(member);
            }
        }
        ParliamentIndex { by_name }
    }

    pub fn find(&self, cycle: Cycle, name: &str, district_name: Option<&str>) -> Option<Membership> {
        let found = self.by_name.get(&(cycle, name_key(name)))?;
        let distinct: Vec<_> = found.iter().copied().unique_by(|m| m.member_id).collect();
        let member = if distinct.len() == 1 {
            distinct[0]
        } else {
            let local: Vec<_> = distinct
                .iter()
                .copied()
                .filter(|m| {
                    same_key(district_name, m.district_name_np.as_deref()) == Some(true)
                        || same_key(district_name, m.district_name_en.as_deref()) == Some(true)
                })
                .collect();
            if local.len() != 1 {
                debug!("{}: {} members named {} could not be told apart", cycle, distinct.len(), name);
                return None;
            }
            local[0]
        };
        Some(Membership {
            election_type: member.election_type,
            party: non_blank(member.political_party_name_np.as_deref())
                .or_else(|| non_blank(member.political_party_name_en.as_deref())),
            district: non_blank(member.district_name_np.as_deref())
                .or_else(|| non_blank(member.district_name_en.as_deref())),
            constituency: member.election_area_no,
        })
    }
}

/// Political-family seed plus the set of everyone standing this cycle.
pub struct FamilyIndex<'a> {
    links: HashMap<String, Vec<&'a FamilyLinkRecord>>,
    named_as_relative: HashSet<String>,
    current_candidates: HashSet<String>,
}

impl<'a> FamilyIndex<'a> {
    pub fn new<I, S>(links: &'a [FamilyLinkRecord], current_candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FamilyIndex {
            links: links
                .iter()
                .map(|l| (name_key(&l.candidate_name), l))
                .into_group_map(),
            named_as_relative: links
                .iter()
                .filter_map(|l| l.relative_name.as_deref())
                .map(name_key)
                .filter(|k| !k.is_empty())
                .collect(),
            current_candidates: current_candidates
                .into_iter()
                .map(|n| name_key(n.as_ref()))
                .collect(),
        }
    }

    fn is_candidate(&self, name: &str) -> bool {
        let key = name_key(name);
        !key.is_empty() && self.current_candidates.contains(&key)
    }

    pub fn facts(&self, name: &str, spouse_name: Option<&str>) -> FamilyFacts {
        let key = name_key(name);
        let links = self.links.get(&key).map_or(&[][..], |v| v.as_slice());
        let spouse_links = || links.iter().filter(|l| l.relation == Some(Relation::Spouse));
        let spouse_is_candidate = spouse_name.map_or(false, |s| self.is_candidate(s))
            || spouse_links().any(|l| l.relative_name.as_deref().map_or(false, |s| self.is_candidate(s)));
        FamilyFacts {
            has_known_relative: links.iter().any(|l| l.relative_name.is_some())
                || self.named_as_relative.contains(&key),
            is_family_source: links.iter().any(|l| l.is_family_source),
            has_known_spouse: spouse_links().next().is_some(),
            has_known_parent: links.iter().any(|l| l.relation == Some(Relation::Parent)),
            spouse_is_candidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, father: Option<&str>, district: i64, seat: i64, votes: i64) -> PastFptpResultRecord {
        PastFptpResultRecord {
            candidate_id: None,
            candidate_name: name.into(),
            gender: None,
            age: None,
            political_party_name: "X".into(),
            symbol_name: None,
            state_id: Some(1),
            district_id: district,
            district_name: None,
            constituency_id: seat,
            votes,
            casted_vote: None,
            total_voters: None,
            rank: None,
            remarks: None,
            father_name: father.map(Into::into),
            qualification: None,
        }
    }

    #[test]
    fn namesakes_are_split_by_father_then_district() {
        let districts = HashMap::from([(4, "झापा".to_string()), (5, "इलाम".to_string())]);
        let records = vec![
            result("राम थापा", Some("हरि"), 4, 1, 100),
            result("राम थापा", Some("श्याम"), 5, 1, 200),
            result("सीता राई", None, 4, 1, 50),
        ];
        let cycle = CycleResults::new(Cycle::Y2079, &records, &districts);

        let hint = MatchHint { father_name: Some("श्याम"), ..MatchHint::default() };
        assert_eq!(cycle.find("राम  थापा", hint).map(|r| r.votes), Some(200));

        let hint = MatchHint { district_id: Some(4), ..MatchHint::default() };
        assert_eq!(cycle.find("राम थापा", hint).map(|r| r.votes), Some(100));

        assert!(cycle.find("राम थापा", MatchHint::default()).is_none());
        assert!(cycle.find("अरु कोही", MatchHint::default()).is_none());
    }

    #[test]
    fn contest_uses_seat_totals_when_casted_vote_missing() {
        let districts = HashMap::from([(4, "झापा".to_string())]);
        let mut winner = result("A", None, 4, 1, 600);
        winner.remarks = Some("Elected".into());
        let records = vec![result("B", None, 4, 1, 400), winner];
        let cycle = CycleResults::new(Cycle::Y2079, &records, &districts);
        let contest = cycle.contest(&records[0]);
        assert_eq!(contest.result, ContestResult::Loser);
        assert_eq!(contest.casted_vote, 1_000);
        assert_eq!(contest.winner_votes, 600);
        assert_eq!(contest.runner_up_votes, Some(400));
        assert_eq!(contest.district_name.as_deref(), Some("झापा"));
        assert!((contest.margin().unwrap() + 0.2).abs() < 1e-9);
    }

    #[test]
    fn spouse_standing_this_cycle() {
        let links = vec![FamilyLinkRecord {
            candidate_name: "क ख".into(),
            relation: Some(Relation::Spouse),
            relative_name: Some("ग घ".into()),
            is_family_source: false,
        }];
        let index = FamilyIndex::new(&links, ["क ख", "ग घ", "च छ"]);
        let facts = index.facts("क ख", None);
        assert!(facts.has_known_spouse && facts.spouse_is_candidate && facts.has_known_relative);

        // The relative side of a link is known too.
        assert!(index.facts("ग घ", None).has_known_relative);

        let facts = index.facts("च छ", Some("ग घ"));
        assert!(facts.spouse_is_candidate && !facts.has_known_spouse);
    }
}
