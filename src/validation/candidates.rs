use super::constituencies::{winner, SeatLookup};
use super::{EntityRef, Issue};
use crate::model::candidate::{FptpCandidate, PrCandidate};
use crate::model::{ContestResult, Cycle};
use crate::normalize::clean_text;
use crate::tags::{PartyMatcher, FPTP_VOCABULARY, GEN_Z_MAX_AGE, GRANDPA_MIN_AGE, PR_VOCABULARY};

const FPTP_EXCLUSIVE: &[(&str, &str)] = &[
    ("new-candidate", "loyal"),
    ("new-candidate", "chheparo"),
    ("loyal", "chheparo"),
    ("educated", "uneducated"),
    ("gen-z", "grandpa"),
    ("vaguwa", "vaguwa-won"),
];

const PR_EXCLUSIVE: &[(&str, &str)] = &[
    ("new-candidate", "party-loyal"),
    ("new-candidate", "chheparo"),
    ("party-loyal", "chheparo"),
    ("top-rank", "high-rank"),
    ("improving-party", "declining-party"),
];

fn pr_entity(c: &PrCandidate) -> EntityRef {
    EntityRef::PrCandidate {
        party: clean_text(&c.political_party_name),
        serial_no: c.serial_no,
    }
}

fn check_vocabulary(entity: &EntityRef, tags: &[String], vocabulary: &[&str], issues: &mut Vec<Issue>) {
    for tag in tags {
        if !vocabulary.contains(&tag.as_str()) {
            issues.push(Issue::error(
                "Tag.UnknownTag",
                entity.clone(),
                format!("tag {:?} is not in the vocabulary", tag),
            ));
        }
    }
}

fn check_pairs(entity: &EntityRef, pairs: &[(&str, bool, bool)], issues: &mut Vec<Issue>) {
    for (tag, flag, tagged) in pairs {
        if flag != tagged {
            issues.push(Issue::error(
                "Tag.FlagMismatch",
                entity.clone(),
                format!("flag for {:?} is {} but tag present is {}", tag, flag, tagged),
            ));
        }
    }
}

fn check_exclusive(
    entity: &EntityRef,
    has: impl Fn(&str) -> bool,
    exclusive: &[(&str, &str)],
    issues: &mut Vec<Issue>,
) {
    for (a, b) in exclusive {
        if has(a) && has(b) {
            issues.push(Issue::error(
                "Tag.Exclusive",
                entity.clone(),
                format!("{:?} and {:?} both present", a, b),
            ));
        }
    }
}

fn implication(entity: &EntityRef, tag: &str, holds: bool, why: &str, issues: &mut Vec<Issue>) {
    if !holds {
        issues.push(Issue::error(
            "Tag.Implication",
            entity.clone(),
            format!("{:?} without {}", tag, why),
        ));
    }
}

pub(crate) fn check_fptp(c: &FptpCandidate, parties: &PartyMatcher) -> Vec<Issue> {
    let entity = EntityRef::FptpCandidate(c.candidate_id);
    let flags = &c.flags;
    let mut issues = Vec::new();

    check_vocabulary(&entity, &c.tags, FPTP_VOCABULARY, &mut issues);

    let has = |tag: &str| c.has_tag(tag);
    check_pairs(
        &entity,
        &[
            ("tourist", flags.is_tourist_candidate, has("tourist")),
            ("chheparo", flags.is_chheparo, has("chheparo")),
            ("vaguwa-won", flags.is_vaguwa_prev_winner, has("vaguwa-won")),
            ("vaguwa", flags.is_vaguwa && !flags.is_vaguwa_prev_winner, has("vaguwa")),
            ("new-candidate", flags.is_new_candidate, has("new-candidate")),
            ("educated", flags.is_educated, has("educated")),
            ("uneducated", flags.is_uneducated, has("uneducated")),
            ("new-party", flags.is_new_party, has("new-party")),
            ("gen-z", flags.is_gen_z, has("gen-z")),
            ("grandpa", flags.is_grandpa, has("grandpa")),
            ("influential", flags.is_influential, has("influential")),
            ("opportunist", flags.is_opportunist, has("opportunist")),
            ("split-vote", flags.is_split_vote_candidate, has("split-vote")),
            ("proportional-veteran", flags.is_proportional_veteran, has("proportional-veteran")),
            ("loyal", flags.is_loyal, has("loyal")),
            ("nepo", flags.is_nepo, has("nepo")),
            ("budi-bokuwa", flags.is_budi_bokuwa, has("budi-bokuwa")),
            ("budo-bokuwa", flags.is_budo_bokuwa, has("budo-bokuwa")),
            ("purba-padadhikari", flags.is_past_minister, has("purba-padadhikari")),
        ],
        &mut issues,
    );
    check_exclusive(&entity, has, FPTP_EXCLUSIVE, &mut issues);

    if has("gen-z") {
        let holds = c.age.map_or(false, |a| a <= GEN_Z_MAX_AGE);
        implication(&entity, "gen-z", holds, "age at most 27", &mut issues);
    }
    if has("grandpa") {
        let holds = c.age.map_or(false, |a| a >= GRANDPA_MIN_AGE);
        implication(&entity, "grandpa", holds, "age at least 60", &mut issues);
    }
    if has("vaguwa-won") {
        let holds = c.prev_2079.prev_election_result == Some(ContestResult::Winner)
            || c.prev_2074.prev_2074_election_result == Some(ContestResult::Winner);
        implication(&entity, "vaguwa-won", holds, "a previous win", &mut issues);
    }
    if has("nepo") {
        let holds = c.has_known_relative || c.is_family_source;
        implication(&entity, "nepo", holds, "a family link", &mut issues);
    }
    if has("loyal") {
        let current = c.political_party_name.as_str();
        let same = |party: Option<&String>| party.map_or(false, |p| parties.same_party(p, current));
        let holds = same(c.prev_2079.prev_election_party.as_ref())
            && same(c.prev_2074.prev_2074_election_party.as_ref());
        implication(&entity, "loyal", holds, "the same party in both contests", &mut issues);
    }
    if has("new-candidate") {
        let holds = c.prev_2079.prev_election_votes.is_none()
            && c.prev_2074.prev_2074_election_votes.is_none()
            && !c.parliament.was_member()
            && c.total_elections_contested == 0;
        implication(&entity, "new-candidate", holds, "an empty history", &mut issues);
    }

    issues
}

pub(crate) fn check_pr(c: &PrCandidate) -> Vec<Issue> {
    let entity = pr_entity(c);
    let flags = &c.flags;
    let mut issues = Vec::new();

    check_vocabulary(&entity, &c.tags, PR_VOCABULARY, &mut issues);

    let has = |tag: &str| c.has_tag(tag);
    check_pairs(
        &entity,
        &[
            ("chheparo", flags.is_chheparo, has("chheparo")),
            ("new-candidate", flags.is_new_candidate, has("new-candidate")),
            ("party-loyal", flags.is_party_loyal, has("party-loyal")),
            ("top-rank", flags.is_top_rank, has("top-rank")),
            ("high-rank", flags.is_high_rank, has("high-rank")),
            ("women", flags.is_women, has("women")),
            ("inclusive-group", flags.is_inclusive_group, has("inclusive-group")),
            ("disability", flags.has_disability, has("disability")),
            ("backward-area", flags.is_from_backward_area, has("backward-area")),
            ("new-party", flags.is_new_party, has("new-party")),
            ("fptp-veteran", flags.is_fptp_veteran, has("fptp-veteran")),
            ("proportional-veteran", flags.is_proportional_veteran, has("proportional-veteran")),
            ("opportunist", flags.is_opportunist, has("opportunist")),
            ("improving-party", flags.is_from_improving_party, has("improving-party")),
            ("declining-party", flags.is_from_declining_party, has("declining-party")),
            ("pani-maruwa", flags.is_varaute, has("pani-maruwa")),
            ("gati-xada", flags.is_gati_xada, has("gati-xada")),
            ("hutihara", flags.is_hutihara, has("hutihara")),
            ("budi-bokuwa", flags.is_budi_bokuwa, has("budi-bokuwa")),
            ("budo-bokuwa", flags.is_budo_bokuwa, has("budo-bokuwa")),
        ],
        &mut issues,
    );
    check_exclusive(&entity, has, PR_EXCLUSIVE, &mut issues);

    let was_member = c.parliament.was_member();
    if has("party-loyal") {
        implication(&entity, "party-loyal", was_member, "a parliament membership", &mut issues);
    }
    if has("chheparo") {
        implication(&entity, "chheparo", was_member, "a parliament membership", &mut issues);
    }
    if has("gati-xada") {
        let holds = has("proportional-veteran");
        implication(&entity, "gati-xada", holds, "proportional-veteran", &mut issues);
    }
    if has("hutihara") {
        implication(&entity, "hutihara", has("fptp-veteran"), "fptp-veteran", &mut issues);
    }
    if has("pani-maruwa") {
        let holds = c.fptp_2079.prev_2079_fptp_result.is_some()
            || c.fptp_2074.prev_2074_fptp_result.is_some();
        implication(&entity, "pani-maruwa", holds, "an FPTP history", &mut issues);
    }
    if has("new-candidate") {
        let holds = !was_member
            && c.fptp_2079.prev_2079_fptp_result.is_none()
            && c.fptp_2074.prev_2074_fptp_result.is_none();
        implication(&entity, "new-candidate", holds, "an empty history", &mut issues);
    }

    issues
}

fn check_past_win(
    entity: &EntityRef,
    cycle: Cycle,
    party: Option<&str>,
    district: Option<&str>,
    constituency_id: Option<i64>,
    seats: &SeatLookup<'_>,
    parties: &PartyMatcher,
) -> Option<Issue> {
    let party = party?;
    let seat = match (district, constituency_id) {
        (Some(d), Some(c)) => seats.get(d, c),
        _ => None,
    };
    let seat = match seat {
        Some(seat) => seat,
        None => {
            return Some(Issue::warning(
                "Candidate.WinnerSeatUnknown",
                entity.clone(),
                format!("{} win at {:?}-{:?} has no constituency profile", cycle, district, constituency_id),
            ))
        }
    };
    let recorded = winner(seat, cycle);
    let agrees = recorded.map_or(false, |w| w == party || parties.same_party(w, party));
    if agrees {
        None
    } else {
        Some(Issue::error(
            "Candidate.WinnerMismatch",
            entity.clone(),
            format!(
                "{} win for {:?} but {} was won by {:?}",
                cycle, party, seat.constituency_name, recorded
            ),
        ))
    }
}

/// A past `Winner` result must agree with the winner recorded for that seat.
pub(crate) fn check_fptp_winners(
    c: &FptpCandidate,
    seats: &SeatLookup<'_>,
    parties: &PartyMatcher,
) -> Vec<Issue> {
    let entity = EntityRef::FptpCandidate(c.candidate_id);
    let p79 = &c.prev_2079;
    let p74 = &c.prev_2074;
    let mut issues = Vec::new();
    if p79.prev_election_result == Some(ContestResult::Winner) {
        issues.extend(check_past_win(
            &entity,
            Cycle::Y2079,
            p79.prev_election_party.as_deref(),
            p79.prev_election_district.as_deref(),
            p79.prev_election_constituency_id,
            seats,
            parties,
        ));
    }
    if p74.prev_2074_election_result == Some(ContestResult::Winner) {
        issues.extend(check_past_win(
            &entity,
            Cycle::Y2074,
            p74.prev_2074_election_party.as_deref(),
            p74.prev_2074_election_district.as_deref(),
            p74.prev_2074_election_constituency_id,
            seats,
            parties,
        ));
    }
    issues
}

pub(crate) fn check_pr_winners(
    c: &PrCandidate,
    seats: &SeatLookup<'_>,
    parties: &PartyMatcher,
) -> Vec<Issue> {
    let entity = pr_entity(c);
    let mut issues = Vec::new();
    if c.fptp_2079.prev_2079_fptp_result == Some(ContestResult::Winner) {
        issues.extend(check_past_win(
            &entity,
            Cycle::Y2079,
            c.fptp_2079.prev_2079_fptp_party.as_deref(),
            c.fptp_2079.prev_2079_fptp_district.as_deref(),
            c.fptp_2079.prev_2079_fptp_constituency_id,
            seats,
            parties,
        ));
    }
    if c.fptp_2074.prev_2074_fptp_result == Some(ContestResult::Winner) {
        issues.extend(check_past_win(
            &entity,
            Cycle::Y2074,
            c.fptp_2074.prev_2074_fptp_party.as_deref(),
            c.fptp_2074.prev_2074_fptp_district.as_deref(),
            c.fptp_2074.prev_2074_fptp_constituency_id,
            seats,
            parties,
        ));
    }
    issues
}
