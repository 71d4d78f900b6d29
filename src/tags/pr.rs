//! Flags and tags for proportional (closed-list) candidates.

use super::{PartyMatcher, TagSet, PR_VOCABULARY};
use crate::model::candidate::{Membership, PrFacts, PrFlags};
use crate::model::ElectionType;
use crate::normalize::{clean_text, is_female, is_independent, is_male};

pub const TOP_RANK_MAX: u32 = 5;
pub const HIGH_RANK_MAX: u32 = 10;

/// Markers the commission uses for "not applicable" in the disability and
/// backward-area columns.
const NEGATIVE_MARKERS: &[&str] = &[
    "-", "0", "no", "none", "n/a", "na", "false", "छैन", "नभएको", "होइन", "लागू नहुने",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PrTagging {
    pub flags: PrFlags,
    pub tags: Vec<String>,
}

fn affirmative(value: Option<&str>) -> bool {
    value
        .map(|v| clean_text(v).to_lowercase())
        .map_or(false, |v| !v.is_empty() && !NEGATIVE_MARKERS.contains(&v.as_str()))
}

fn is_khas_arya(group: &str) -> bool {
    let lowered = clean_text(group).to_lowercase();
    lowered.contains("खस आर्य") || lowered.contains("khas arya") || lowered.contains("खस-आर्य")
}

fn via(membership: &Membership, election_type: ElectionType) -> bool {
    membership.election_type == Some(election_type)
}

pub fn evaluate(facts: &PrFacts, parties: &PartyMatcher) -> PrTagging {
    let record = &facts.record;
    let current_party = record.political_party_name.as_str();
    let c2079 = facts.contest_2079.as_ref();
    let c2074 = facts.contest_2074.as_ref();
    let has_membership = facts.memberships().next().is_some();

    let mut flags = PrFlags {
        is_fptp_2079_loser: c2079.map_or(false, |c| !c.result.is_winner()),
        is_fptp_2074_loser: c2074.map_or(false, |c| !c.result.is_winner()),
        is_same_party_2079_after_merger_check: c2079
            .map(|c| parties.same_party(&c.party, current_party)),
        is_same_party_2074_after_merger_check: c2074
            .map(|c| parties.same_party(&c.party, current_party)),
        ..PrFlags::default()
    };

    flags.is_chheparo = facts.memberships().any(|m| {
        m.party
            .as_deref()
            .map_or(false, |p| !parties.same_party(p, current_party))
    });

    flags.is_party_loyal = has_membership
        && facts.memberships().all(|m| {
            m.party
                .as_deref()
                .map_or(true, |p| parties.same_party(p, current_party))
        })
        && c2079
            .iter()
            .chain(c2074.iter())
            .all(|c| parties.same_party(&c.party, current_party));

    flags.is_new_candidate = !has_membership && c2079.is_none() && c2074.is_none();

    flags.is_top_rank = (1..=TOP_RANK_MAX).contains(&facts.rank_within_group);
    flags.is_high_rank = (TOP_RANK_MAX + 1..=HIGH_RANK_MAX).contains(&facts.rank_within_group);

    flags.is_women = record.gender.as_deref().map_or(false, is_female);
    flags.is_inclusive_group = record
        .inclusive_group
        .as_deref()
        .map_or(false, |g| !clean_text(g).is_empty() && !is_khas_arya(g));
    flags.has_disability = affirmative(record.disability.as_deref());
    flags.is_from_backward_area = affirmative(record.backward_area.as_deref());

    flags.is_new_party = !is_independent(current_party)
        && facts
            .party
            .as_ref()
            .map_or(true, |p| !p.party_existed_2079 && !p.party_existed_2074);

    let won_fptp = c2079.map_or(false, |c| c.result.is_winner())
        || c2074.map_or(false, |c| c.result.is_winner());
    flags.is_fptp_veteran = won_fptp || facts.memberships().any(|m| via(m, ElectionType::Fptp));
    flags.is_proportional_veteran = facts
        .memberships()
        .any(|m| via(m, ElectionType::Proportional));

    flags.is_opportunist = facts
        .latest_contest()
        .map_or(false, |c| is_independent(&c.party) && !is_independent(current_party));

    if let Some((now, before)) = facts
        .party
        .as_ref()
        .and_then(|p| p.prev_2079_party_votes.zip(p.prev_2074_party_votes))
    {
        flags.is_from_improving_party = now > before;
        flags.is_from_declining_party = now < before;
    }

    flags.is_varaute = flags.is_fptp_2079_loser || flags.is_fptp_2074_loser;
    flags.is_gati_xada = facts
        .membership_2079
        .as_ref()
        .map_or(false, |m| via(m, ElectionType::Proportional));
    flags.is_hutihara = won_fptp;

    let gender = record.gender.as_deref().unwrap_or_default();
    flags.is_budi_bokuwa = facts.family.spouse_is_candidate && is_male(gender);
    flags.is_budo_bokuwa = facts.family.spouse_is_candidate && is_female(gender);

    PrTagging {
        tags: tags_for(&flags),
        flags,
    }
}

fn tags_for(flags: &PrFlags) -> Vec<String> {
    let mut tags = TagSet::new(PR_VOCABULARY);
    tags.set("chheparo", flags.is_chheparo);
    tags.set("new-candidate", flags.is_new_candidate);
    tags.set("party-loyal", flags.is_party_loyal);
    tags.set("top-rank", flags.is_top_rank);
    tags.set("high-rank", flags.is_high_rank);
    tags.set("women", flags.is_women);
    tags.set("inclusive-group", flags.is_inclusive_group);
    tags.set("disability", flags.has_disability);
    tags.set("backward-area", flags.is_from_backward_area);
    tags.set("new-party", flags.is_new_party);
    tags.set("fptp-veteran", flags.is_fptp_veteran);
    tags.set("proportional-veteran", flags.is_proportional_veteran);
    tags.set("opportunist", flags.is_opportunist);
    tags.set("improving-party", flags.is_from_improving_party);
    tags.set("declining-party", flags.is_from_declining_party);
    tags.set("pani-maruwa", flags.is_varaute);
    tags.set("gati-xada", flags.is_gati_xada);
    tags.set("hutihara", flags.is_hutihara);
    tags.set("budi-bokuwa", flags.is_budi_bokuwa);
    tags.set("budo-bokuwa", flags.is_budo_bokuwa);
    tags.into_vec()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::candidate::FamilyFacts;
    use crate::model::raw::PrCandidateRecord;
    use crate::model::ContestResult;
    use crate::tags::fptp::tests::{contest, matcher};

    pub(crate) fn facts() -> PrFacts {
        PrFacts {
            record: PrCandidateRecord {
                serial_no: 1,
                candidate_name: "सीता शर्मा".into(),
                gender: Some("महिला".into()),
                political_party_name: "X".into(),
                inclusive_group: Some("मधेशी".into()),
                backward_area: Some("छैन".into()),
                disability: None,
                citizenship_district: None,
                voter_id_number: None,
                rank_position: 3,
                associated_party: None,
                remarks: None,
            },
            party: None,
            rank_within_group: 3,
            contest_2079: None,
            contest_2074: None,
            membership_2079: None,
            membership_2074: None,
            family: FamilyFacts::default(),
        }
    }

    pub(crate) fn member(party: &str, election_type: ElectionType) -> Membership {
        Membership {
            election_type: Some(election_type),
            party: Some(party.into()),
            district: None,
            constituency: None,
        }
    }

    #[test]
    fn fresh_list_candidate() {
        let m = matcher();
        let mut f = facts();
        f.party = m.resolve("X").cloned();
        let out = evaluate(&f, &m);
        assert!(out.flags.is_new_candidate);
        assert!(!out.flags.is_chheparo && !out.flags.is_party_loyal);
        assert_eq!(out.tags, vec!["new-candidate", "top-rank", "women", "inclusive-group"]);
    }

    #[test]
    fn continuing_proportional_member_is_gati_xada() {
        let m = matcher();
        let mut f = facts();
        f.membership_2079 = Some(member("X (Old)", ElectionType::Proportional));
        let out = evaluate(&f, &m);
        assert!(out.flags.is_gati_xada && out.flags.is_proportional_veteran);
        assert!(out.flags.is_party_loyal);
        assert!(!out.flags.is_chheparo);
        assert!(!out.flags.is_new_candidate);
    }

    #[test]
    fn member_from_another_party_is_chheparo() {
        let m = matcher();
        let mut f = facts();
        f.membership_2074 = Some(member("Y", ElectionType::Fptp));
        let out = evaluate(&f, &m);
        assert!(out.flags.is_chheparo);
        assert!(!out.flags.is_party_loyal);
        assert!(out.flags.is_fptp_veteran);
    }

    #[test]
    fn fptp_history_drives_hutihara_and_pani_maruwa() {
        let m = matcher();
        let mut f = facts();
        f.contest_2079 = Some(contest("X", 30_000, ContestResult::Loser));
        f.contest_2074 = Some(contest("X", 50_000, ContestResult::Winner));
        let out = evaluate(&f, &m);
        assert!(out.flags.is_varaute && out.flags.is_fptp_2079_loser);
        assert!(out.flags.is_hutihara && out.flags.is_fptp_veteran);
        assert_eq!(out.flags.is_same_party_2079_after_merger_check, Some(true));
        assert_eq!(out.flags.is_same_party_2074_after_merger_check, Some(true));
    }

    #[test]
    fn rank_bands_and_party_trend() {
        let mut x = crate::model::party::Party::new(1, "X".into());
        x.prev_2079_party_votes = Some(900);
        x.prev_2074_party_votes = Some(1_200);
        x.party_existed_2079 = true;
        let m = PartyMatcher::new(&[x]);
        let mut f = facts();
        f.party = m.resolve("X").cloned();
        f.rank_within_group = 7;
        f.record.inclusive_group = Some("खस आर्य".into());
        f.record.disability = Some("शारीरिक".into());
        let out = evaluate(&f, &m);
        assert!(out.flags.is_high_rank && !out.flags.is_top_rank);
        assert!(out.flags.is_from_declining_party && !out.flags.is_from_improving_party);
        assert!(!out.flags.is_inclusive_group);
        assert!(out.flags.has_disability && !out.flags.is_from_backward_area);
        assert!(!out.flags.is_new_party);
    }

    #[test]
    fn independent_fptp_past_is_opportunist() {
        let m = matcher();
        let mut f = facts();
        f.contest_2079 = Some(contest("स्वतन्त्र", 1_000, ContestResult::Loser));
        assert!(evaluate(&f, &m).flags.is_opportunist);
    }
}
