//! Constituency results ranking and stronghold / swing / landslide labels.

use super::{PartyMatcher, PAKAD_MARGIN};
use crate::model::constituency::{ConstituencyProfile, Ranked};
use crate::normalize::clean_text;
use std::cmp::Reverse;

pub const SWING_STATE_TAG: &str = "Swing State";

/// How the seat's winning label moved between the two cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatChange {
    /// The same party won both times, merger-aware.
    Held,
    /// Different winners.
    Changed,
    /// Same label but not a party that can hold a seat, e.g. two
    /// independents. Neither a stronghold nor a swing.
    Unresolved,
}

/// Compare the 2079 and 2074 winners. `None` unless both are recorded.
pub fn seat_change(
    winner_2079: Option<&str>,
    winner_2074: Option<&str>,
    parties: &PartyMatcher,
) -> Option<SeatChange> {
    let (a, b) = (winner_2079?, winner_2074?);
    Some(if parties.same_party(a, b) {
        SeatChange::Held
    } else if clean_text(a) == clean_text(b) {
        SeatChange::Unresolved
    } else {
        SeatChange::Changed
    })
}

/// Sort by votes descending and assign competition ranks (1, 1, 3).
pub fn rank_results<T: Ranked>(entries: &mut [T]) {
    entries.sort_by_key(|e| Reverse(e.vote_count()));
    let mut previous: Option<(i64, u32)> = None;
    for (idx, entry) in entries.iter_mut().enumerate() {
        let rank = match previous {
            Some((votes, rank)) if votes == entry.vote_count() => rank,
            _ => idx as u32 + 1,
        };
        entry.set_rank(rank);
        previous = Some((entry.vote_count(), rank));
    }
}

/// Winner's lead over the runner-up as a share of all votes in the list.
pub fn win_margin<T: Ranked>(entries: &[T]) -> Option<f64> {
    let total: i64 = entries.iter().map(|e| e.vote_count()).sum();
    if total <= 0 {
        return None;
    }
    let first = entries.first()?.vote_count();
    let second = entries.get(1).map_or(0, |e| e.vote_count());
    Some((first - second) as f64 / total as f64)
}

/// Rank the results lists, then fill in winners, margins and labels.
pub fn finalize(profile: &mut ConstituencyProfile, parties: &PartyMatcher) {
    rank_results(&mut profile.fptp_2079_results);
    rank_results(&mut profile.fptp_2074_results);
    rank_results(&mut profile.proportional_2079_results);

    profile.winning_party_2079 = profile.fptp_2079_results.first().map(|e| e.party_name.clone());
    profile.winning_party_2074 = profile.fptp_2074_results.first().map(|e| e.party_name.clone());
    profile.win_margin_2079 = win_margin(&profile.fptp_2079_results);
    profile.win_margin_2074 = win_margin(&profile.fptp_2074_results);

    let mut tags = Vec::new();
    profile.is_gadh = false;
    profile.gadh_party_name = None;
    profile.is_swing_state = false;
    let change = seat_change(
        profile.winning_party_2079.as_deref(),
        profile.winning_party_2074.as_deref(),
        parties,
    );
    match (change, &profile.winning_party_2079) {
        (Some(SeatChange::Held), Some(w2079)) => {
            profile.is_gadh = true;
            profile.gadh_party_name = Some(w2079.clone());
            tags.push(format!("Gadh: {}", w2079));
        }
        (Some(SeatChange::Changed), _) => {
            profile.is_swing_state = true;
            tags.push(SWING_STATE_TAG.to_string());
        }
        _ => {}
    }

    let landslide = |margin: Option<f64>| margin.map_or(false, |m| m > PAKAD_MARGIN);
    profile.pakad_party_name = if landslide(profile.win_margin_2079) {
        profile.winning_party_2079.clone()
    } else if landslide(profile.win_margin_2074) {
        profile.winning_party_2074.clone()
    } else {
        None
    };
    profile.is_pakad = profile.pakad_party_name.is_some();
    if let Some(party) = &profile.pakad_party_name {
        tags.push(format!("Pakad: {}", party));
    }

    profile.tags = tags;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::constituency::{FptpResultEntry, ProportionalResultEntry};
    use crate::model::party::Party;

    fn entry(name: &str, party: &str, votes: i64) -> FptpResultEntry {
        FptpResultEntry {
            candidate_name: name.into(),
            party_name: party.into(),
            symbol_name: None,
            vote_count: votes,
            rank: 0,
            remarks: None,
        }
    }

    fn profile() -> ConstituencyProfile {
        ConstituencyProfile {
            state_id: 1,
            state_name: "कोशी".into(),
            district_id: 4,
            district_name: "झापा".into(),
            constituency_id: 3,
            constituency_name: "झापा-3".into(),
            fptp_2079_results: Vec::new(),
            fptp_2074_results: Vec::new(),
            proportional_2079_results: Vec::new(),
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
        }
    }

    #[test]
    fn ties_share_a_rank() {
        let mut list = vec![
            ProportionalResultEntry { party_name: "A".into(), vote_count: 10, rank: 0 },
            ProportionalResultEntry { party_name: "B".into(), vote_count: 30, rank: 0 },
            ProportionalResultEntry { party_name: "C".into(), vote_count: 30, rank: 0 },
        ];
        rank_results(&mut list);
        let ranks: Vec<u32> = list.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3]);
        assert_eq!(list[2].party_name, "A");
    }

    #[test]
    fn close_race_is_not_pakad() {
        let mut p = profile();
        p.fptp_2079_results = vec![
            entry("b", "B", 28_000),
            entry("c", "C", 5_000),
            entry("a", "A", 30_000),
        ];
        finalize(&mut p, &PartyMatcher::default());
        assert_eq!(p.winning_party_2079.as_deref(), Some("A"));
        let margin = p.win_margin_2079.unwrap();
        assert!((margin - 0.0317).abs() < 0.001);
        assert!(!p.is_pakad);
        assert!(!p.is_gadh && !p.is_swing_state);
        assert!(p.tags.is_empty());
    }

    #[test]
    fn same_winner_after_rename_is_gadh() {
        let mut x = Party::new(1, "X".into());
        x.previous_names = vec!["X (Old)".into()];
        let parties = PartyMatcher::new(&[x]);
        let mut p = profile();
        p.fptp_2079_results = vec![entry("a", "X", 50_000), entry("b", "Y", 20_000)];
        p.fptp_2074_results = vec![entry("a", "X (Old)", 40_000), entry("b", "Y", 38_000)];
        finalize(&mut p, &parties);
        assert!(p.is_gadh && !p.is_swing_state);
        assert!(p.is_pakad);
        assert_eq!(p.pakad_party_name.as_deref(), Some("X"));
        assert_eq!(p.tags, vec!["Gadh: X".to_string(), "Pakad: X".to_string()]);
    }

    #[test]
    fn different_winners_is_swing() {
        let mut p = profile();
        p.fptp_2079_results = vec![entry("a", "X", 30_000), entry("b", "Y", 29_000)];
        p.fptp_2074_results = vec![entry("b", "Y", 10_000)];
        finalize(&mut p, &PartyMatcher::default());
        assert!(p.is_swing_state && !p.is_gadh);
        // A single-entry list wins by its whole vote.
        assert_eq!(p.win_margin_2074, Some(1.0));
        assert_eq!(p.pakad_party_name.as_deref(), Some("Y"));
        assert_eq!(p.tags, vec![SWING_STATE_TAG.to_string(), "Pakad: Y".to_string()]);
    }

    #[test]
    fn independent_hold_is_neither_gadh_nor_swing() {
        let mut p = profile();
        p.fptp_2079_results = vec![entry("a", "स्वतन्त्र", 30_000), entry("b", "X", 29_000)];
        p.fptp_2074_results = vec![entry("c", " स्वतन्त्र", 25_000), entry("b", "X", 24_000)];
        finalize(&mut p, &PartyMatcher::default());
        assert_eq!(p.winning_party_2079.as_deref(), Some("स्वतन्त्र"));
        assert!(!p.is_swing_state);
        assert!(!p.is_gadh);
        assert!(p.tags.is_empty());
    }

    #[test]
    fn independent_unseating_a_party_is_swing() {
        let mut p = profile();
        p.fptp_2079_results = vec![entry("a", "स्वतन्त्र", 30_000), entry("b", "X", 29_000)];
        p.fptp_2074_results = vec![entry("b", "X", 25_000), entry("c", "Y", 24_000)];
        finalize(&mut p, &PartyMatcher::default());
        assert!(p.is_swing_state && !p.is_gadh);
    }

    #[test]
    fn unknown_party_label_still_holds_by_name() {
        // Not in the party table, but equal text is the same party.
        let mut p = profile();
        p.fptp_2079_results = vec![entry("a", "Unlisted Front", 30_000), entry("b", "X", 29_000)];
        p.fptp_2074_results = vec![entry("a", "Unlisted Front", 25_000), entry("b", "X", 24_000)];
        finalize(&mut p, &PartyMatcher::default());
        assert!(p.is_gadh && !p.is_swing_state);
        assert_eq!(p.gadh_party_name.as_deref(), Some("Unlisted Front"));
    }

    #[test]
    fn seat_change_needs_both_winners() {
        let parties = PartyMatcher::default();
        assert_eq!(seat_change(Some("A"), None, &parties), None);
        assert_eq!(seat_change(Some("A"), Some("A"), &parties), Some(SeatChange::Held));
        assert_eq!(seat_change(Some("A"), Some("B"), &parties), Some(SeatChange::Changed));
        assert_eq!(
            seat_change(Some("स्वतन्त्र"), Some("स्वतन्त्र"), &parties),
            Some(SeatChange::Unresolved)
        );
    }
}
