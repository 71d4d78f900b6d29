use super::{EntityRef, Issue, MARGIN_TOLERANCE};
use crate::model::constituency::{ConstituencyProfile, Ranked};
use crate::model::Cycle;
use crate::normalize::name_key;
use crate::tags::constituency::{seat_change, win_margin, SeatChange, SWING_STATE_TAG};
use crate::tags::{PartyMatcher, PAKAD_MARGIN};
use std::collections::HashMap;

/// Constituency profiles keyed by (district name, constituency id), the way
/// past contests refer to their seat.
pub(crate) struct SeatLookup<'a> {
    seats: HashMap<(String, i64), &'a ConstituencyProfile>,
}

impl<'a> SeatLookup<'a> {
    pub(crate) fn new(profiles: &'a [ConstituencyProfile]) -> Self {
        SeatLookup {
            seats: profiles
                .iter()
                .map(|p| ((name_key(&p.district_name), p.constituency_id), p))
                .collect(),
        }
    }

    pub(crate) fn get(&self, district_name: &str, constituency_id: i64) -> Option<&'a ConstituencyProfile> {
        self.seats
            .get(&(name_key(district_name), constituency_id))
            .copied()
    }
}

pub(crate) fn winner(profile: &ConstituencyProfile, cycle: Cycle) -> Option<&str> {
    match cycle {
        Cycle::Y2079 => profile.winning_party_2079.as_deref(),
        Cycle::Y2074 => profile.winning_party_2074.as_deref(),
    }
}

fn check_ranking<T: Ranked>(entity: &EntityRef, label: &str, entries: &[T], issues: &mut Vec<Issue>) {
    if let Some(first) = entries.first() {
        if first.rank() != 1 {
            issues.push(Issue::error(
                "Constituency.RankStart",
                entity.clone(),
                format!("{} ranks start at {}", label, first.rank()),
            ));
        }
    }
    for pair in entries.windows(2) {
        if pair[1].vote_count() > pair[0].vote_count() {
            issues.push(Issue::error(
                "Constituency.UnsortedResults",
                entity.clone(),
                format!("{} is not sorted by votes", label),
            ));
            break;
        }
        if pair[1].rank() < pair[0].rank() {
            issues.push(Issue::error(
                "Constituency.RankOrder",
                entity.clone(),
                format!("{} ranks decrease", label),
            ));
            break;
        }
    }
}

fn check_cycle(
    entity: &EntityRef,
    profile: &ConstituencyProfile,
    cycle: Cycle,
    issues: &mut Vec<Issue>,
) {
    let (results, margin) = match cycle {
        Cycle::Y2079 => (&profile.fptp_2079_results, profile.win_margin_2079),
        Cycle::Y2074 => (&profile.fptp_2074_results, profile.win_margin_2074),
    };
    check_ranking(entity, &format!("FPTP {}", cycle), results, issues);

    let first_party = results.first().map(|e| e.party_name.as_str());
    if first_party != winner(profile, cycle) {
        issues.push(Issue::error(
            "Constituency.WinnerMismatch",
            entity.clone(),
            format!(
                "{} winner {:?} differs from top result {:?}",
                cycle,
                winner(profile, cycle),
                first_party
            ),
        ));
    }

    match (margin, win_margin(results)) {
        (Some(stored), _) if !(0.0..=1.0).contains(&stored) => issues.push(Issue::error(
            "Constituency.MarginRange",
            entity.clone(),
            format!("{} margin {:.4} outside [0, 1]", cycle, stored),
        )),
        (Some(stored), Some(expected)) if (stored - expected).abs() > MARGIN_TOLERANCE => {
            issues.push(Issue::error(
                "Constituency.MarginMismatch",
                entity.clone(),
                format!("{} margin {:.4}, expected {:.4}", cycle, stored, expected),
            ))
        }
        (None, Some(_)) | (Some(_), None) => issues.push(Issue::error(
            "Constituency.MarginMismatch",
            entity.clone(),
            format!("{} margin presence does not match results", cycle),
        )),
        _ => {}
    }
}

pub(crate) fn check_profile(profile: &ConstituencyProfile, parties: &PartyMatcher) -> Vec<Issue> {
    let entity = EntityRef::Constituency(profile.key());
    let mut issues = Vec::new();

    for cycle in Cycle::ALL {
        check_cycle(&entity, profile, cycle, &mut issues);
    }
    check_ranking(
        &entity,
        "PR 2079",
        &profile.proportional_2079_results,
        &mut issues,
    );

    if profile.is_gadh && profile.is_swing_state {
        issues.push(Issue::error(
            "Constituency.GadhAndSwing",
            entity.clone(),
            "stronghold and swing at once",
        ));
    }
    let change = seat_change(
        profile.winning_party_2079.as_deref(),
        profile.winning_party_2074.as_deref(),
        parties,
    );
    if profile.is_gadh && change != Some(SeatChange::Held) {
        issues.push(Issue::error(
            "Constituency.GadhWithoutHold",
            entity.clone(),
            "stronghold without the same winner in both cycles",
        ));
    }
    if profile.is_swing_state && change != Some(SeatChange::Changed) {
        issues.push(Issue::error(
            "Constituency.SwingWithoutChange",
            entity.clone(),
            "swing without different winners in both cycles",
        ));
    }
    let landslide = [profile.win_margin_2079, profile.win_margin_2074]
        .iter()
        .any(|m| m.map_or(false, |m| m > PAKAD_MARGIN));
    if profile.is_pakad && !landslide {
        issues.push(Issue::error(
            "Constituency.PakadWithoutMargin",
            entity.clone(),
            format!("landslide without a margin above {}", PAKAD_MARGIN),
        ));
    }

    let has_prefix = |prefix: &str| profile.tags.iter().any(|t| t.starts_with(prefix));
    for (label, flag, tagged) in [
        ("Gadh", profile.is_gadh, has_prefix("Gadh: ")),
        ("Swing State", profile.is_swing_state, has_prefix(SWING_STATE_TAG)),
        ("Pakad", profile.is_pakad, has_prefix("Pakad: ")),
    ] {
        if flag != tagged {
            issues.push(Issue::error(
                "Constituency.TagMismatch",
                entity.clone(),
                format!("{} flag is {} but tag present is {}", label, flag, tagged),
            ));
        }
    }

    issues
}
