//! Builds `dim_parties` from the curated seed, the current candidate lists and
//! the past results.

use super::{DeriveError, SourceData};
use crate::model::party::Party;
use crate::normalize::{clean_text, is_independent};
use crate::tags::PartyMatcher;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

pub fn build_party_table(source: &SourceData) -> Result<Vec<Party>, DeriveError> {
    let mut parties = Vec::with_capacity(source.party_seeds.len());
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for seed in &source.party_seeds {
        if !ids.insert(seed.party_id) {
            return Err(DeriveError::DuplicatePartyId(seed.party_id));
        }
        let name = clean_text(&seed.current_party_name);
        if !names.insert(name.clone()) {
            return Err(DeriveError::DuplicatePartyName(name));
        }
        let mut party = Party::new(seed.party_id, name);
        party.previous_names = seed.previous_names.iter().map(|n| clean_text(n)).collect();
        party.party_display_order = seed.party_display_order;
        party.party_name_en = seed.party_name_en.clone();
        parties.push(party);
    }

    // Parties standing this cycle that the seed does not know yet.
    let seeded = PartyMatcher::new(&parties);
    let mut next_id = parties.iter().map(|p| p.party_id).max().unwrap_or(0) + 1;
    let current_names = source
        .fptp_candidates
        .iter()
        .map(|c| c.political_party_name.as_str())
        .chain(source.pr_candidates.iter().map(|c| c.political_party_name.as_str()));
    for name in current_names {
        let name = clean_text(name);
        if is_independent(&name) || seeded.resolve(&name).is_some() || !names.insert(name.clone()) {
            continue;
        }
        debug!("party {} is not in the seed, assigning id {}", name, next_id);
        parties.push(Party::new(next_id, name));
        next_id += 1;
    }

    let matcher = PartyMatcher::new(&parties);
    let names_2079 = cycle_names(
        source.fptp_2079.iter().map(|r| r.political_party_name.as_str()),
        source.pr_2079.iter().map(|r| r.political_party_name.as_str()),
    );
    let names_2074 = cycle_names(
        source.fptp_2074.iter().map(|r| r.political_party_name.as_str()),
        source.pr_2074.iter().map(|r| r.political_party_name.as_str()),
    );

    let votes_2079 = tally(&matcher, source.pr_2079.iter().map(|r| (r.political_party_name.as_str(), r.votes)));
    let votes_2074 = tally(&matcher, source.pr_2074.iter().map(|r| (r.political_party_name.as_str(), r.votes)));
    let seats_2079 = tally(
        &matcher,
        source
            .fptp_2079
            .iter()
            .filter(|r| r.is_elected())
            .map(|r| (r.political_party_name.as_str(), 1)),
    );
    let seats_2074 = tally(
        &matcher,
        source
            .fptp_2074
            .iter()
            .filter(|r| r.is_elected())
            .map(|r| (r.political_party_name.as_str(), 1)),
    );
    let fptp_counts = tally(
        &matcher,
        source.fptp_candidates.iter().map(|c| (c.political_party_name.as_str(), 1)),
    );
    let pr_counts = tally(
        &matcher,
        source.pr_candidates.iter().map(|c| (c.political_party_name.as_str(), 1)),
    );

    for party in parties.iter_mut() {
        let id = party.party_id;
        party.party_existed_2079 = matcher.appears_in(party, &names_2079);
        party.party_existed_2074 = matcher.appears_in(party, &names_2074);
        party.prev_2079_party_votes = votes_2079.get(&id).copied();
        party.prev_2074_party_votes = votes_2074.get(&id).copied();
        party.fptp_seats_won_2079 = seats_2079.get(&id).copied().unwrap_or(0) as u32;
        party.fptp_seats_won_2074 = seats_2074.get(&id).copied().unwrap_or(0) as u32;
        party.current_fptp_candidates = fptp_counts.get(&id).copied().unwrap_or(0) as u32;
        party.current_pr_candidates = pr_counts.get(&id).copied().unwrap_or(0) as u32;
    }

    for symbol in &source.party_symbols {
        let by_np = symbol
            .party_name_np
            .as_deref()
            .and_then(|n| matcher.resolve(n))
            .map(|p| p.party_id);
        let by_en = || {
            let en = symbol.party_name_en.as_deref()?;
            parties
                .iter()
                .find(|p| {
                    p.party_name_en
                        .as_deref()
                        .map_or(false, |own| own.eq_ignore_ascii_case(en.trim()))
                })
                .map(|p| p.party_id)
        };
        if let Some(id) = by_np.or_else(by_en) {
            if let Some(party) = parties.iter_mut().find(|p| p.party_id == id) {
                if party.symbol_url.is_none() {
                    party.symbol_url = symbol.symbol_url.clone();
                }
                if party.party_name_en.is_none() {
                    party.party_name_en = symbol.party_name_en.clone();
                }
            }
        }
    }

    info!(
        "party table: {} parties ({} seeded)",
        parties.len(),
        source.party_seeds.len()
    );
    Ok(parties)
}

/// Sum amounts per resolved party id.
fn tally<'a>(matcher: &PartyMatcher, entries: impl Iterator<Item = (&'a str, i64)>) -> HashMap<i64, i64> {
    let mut totals: HashMap<i64, i64> = HashMap::new();
    for (name, amount) in entries {
        if let Some(party) = matcher.resolve(name) {
            *totals.entry(party.party_id).or_default() += amount;
        }
    }
    totals
}

fn cycle_names<'a>(
    fptp: impl Iterator<Item = &'a str>,
    pr: impl Iterator<Item = &'a str>,
) -> HashSet<String> {
    fptp.chain(pr).map(clean_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::raw::{PartySeedRecord, PartySymbolRecord, PrPartyVoteRecord};

    fn seed(id: i64, name: &str, previous: &[&str]) -> PartySeedRecord {
        PartySeedRecord {
            party_id: id,
            current_party_name: name.into(),
            previous_names: previous.iter().map(|s| s.to_string()).collect(),
            party_display_order: Some(id),
            party_name_en: None,
        }
    }

    fn votes(name: &str, votes: i64) -> PrPartyVoteRecord {
        PrPartyVoteRecord {
            political_party_name: name.into(),
            votes,
            state_id: None,
            district_id: None,
            constituency_id: None,
        }
    }

    #[test]
    fn merged_names_roll_up_into_one_party() {
        let mut source = SourceData::default();
        source.party_seeds = vec![seed(1, "X", &["X (Old)"]), seed(2, "Y", &[])];
        source.pr_2079 = vec![votes("X", 100), votes("Y", 50)];
        source.pr_2074 = vec![votes("X (Old)", 70), votes("X (Old)", 10)];
        source.party_symbols = vec![PartySymbolRecord {
            party_name_np: Some("X (Old)".into()),
            party_name_en: Some("Party X".into()),
            symbol_url: Some("https://symbols/x.png".into()),
        }];

        let parties = build_party_table(&source).unwrap();
        let x = &parties[0];
        assert!(x.party_existed_2079 && x.party_existed_2074);
        assert_eq!(x.prev_2079_party_votes, Some(100));
        assert_eq!(x.prev_2074_party_votes, Some(80));
        assert_eq!(x.symbol_url.as_deref(), Some("https://symbols/x.png"));
        assert_eq!(x.party_name_en.as_deref(), Some("Party X"));
        assert!(!parties[1].party_existed_2074);
        assert_eq!(parties[1].prev_2074_party_votes, None);
    }

    #[test]
    fn duplicate_seed_ids_are_rejected() {
        let mut source = SourceData::default();
        source.party_seeds = vec![seed(1, "X", &[]), seed(1, "Y", &[])];
        assert!(matches!(
            build_party_table(&source),
            Err(DeriveError::DuplicatePartyId(1))
        ));
    }
}
