//! Flags and tags for first-past-the-post candidates.

use super::{
    PartyMatcher, TagSet, EDUCATED_MIN_SCALE, FPTP_VOCABULARY, GEN_Z_MAX_AGE, GRANDPA_MIN_AGE,
    INFLUENTIAL_MARGIN, SPLIT_VOTE_SHARE,
};
use crate::model::candidate::{FptpFacts, FptpFlags, Membership};
use crate::model::ElectionType;
use crate::normalize::{is_female, is_independent, is_male, name_key, QualificationLevel};

pub const SAME_LOCATION: &str = "Same Location";
pub const CHANGED_LOCATION: &str = "Changed Location";
pub const NEW_CANDIDATE: &str = "New Candidate";

#[derive(Debug, Clone, PartialEq)]
pub struct FptpTagging {
    pub flags: FptpFlags,
    pub tags: Vec<String>,
    pub candidate_type: &'static str,
}

/// Party the candidate stood for most recently before this election.
pub fn prior_party(facts: &FptpFacts) -> Option<&str> {
    facts
        .contest_2079
        .as_ref()
        .or(facts.contest_2074.as_ref())
        .map(|c| c.party.as_str())
        .or_else(|| {
            facts
                .membership_2079
                .iter()
                .chain(facts.membership_2074.iter())
                .find_map(|m| m.party.as_deref())
        })
}

fn is_tourist(facts: &FptpFacts) -> bool {
    let candidacy = facts
        .district_name
        .as_deref()
        .or(facts.record.district_name.as_deref())
        .map(name_key);
    let candidacy = match candidacy {
        Some(d) if !d.is_empty() => d,
        _ => return false,
    };
    let citizenship = facts.record.citizenship_district.as_deref().map(name_key);
    let residence = facts.residence_district.as_deref().map(name_key);
    if citizenship.is_none() && residence.is_none() {
        return false;
    }
    citizenship.map_or(true, |c| c != candidacy) && residence.map_or(true, |r| r != candidacy)
}

fn via(membership: Option<&Membership>, election_type: ElectionType) -> bool {
    membership.map_or(false, |m| m.election_type == Some(election_type))
}

pub fn evaluate(facts: &FptpFacts, parties: &PartyMatcher) -> FptpTagging {
    let record = &facts.record;
    let current_party = record.political_party_name.as_str();
    let c2079 = facts.contest_2079.as_ref();
    let c2074 = facts.contest_2074.as_ref();
    let latest = facts.latest_contest();

    let mut flags = FptpFlags {
        is_tourist_candidate: is_tourist(facts),
        ..FptpFlags::default()
    };

    flags.is_same_party_after_merger_check =
        c2079.map_or(false, |c| parties.same_party(&c.party, current_party));
    flags.is_same_party_2074_after_merger_check =
        c2074.map_or(false, |c| parties.same_party(&c.party, current_party));
    flags.is_same_party_2074_2079 = match (c2079, c2074) {
        (Some(a), Some(b)) => parties.same_party(&a.party, &b.party),
        _ => false,
    };

    let prior = prior_party(facts);
    flags.is_chheparo = prior.map_or(false, |p| {
        !is_independent(p) && !parties.same_party(p, current_party)
    });
    flags.is_opportunist =
        prior.map_or(false, |p| is_independent(p) && !is_independent(current_party));

    flags.is_vaguwa = latest.map_or(false, |c| !c.same_seat(record.district_id, record.constituency_id));
    let won_before = c2079.map_or(false, |c| c.result.is_winner())
        || c2074.map_or(false, |c| c.result.is_winner());
    flags.is_vaguwa_prev_winner = flags.is_vaguwa && won_before;

    let was_member = facts.membership_2079.is_some() || facts.membership_2074.is_some();
    flags.is_new_candidate = c2079.is_none()
        && c2074.is_none()
        && !was_member
        && facts.profile.elections_contested == 0;

    if let Some(level) = facts.qualification_level {
        flags.is_educated = level.scale() >= EDUCATED_MIN_SCALE;
        flags.is_uneducated = !flags.is_educated;
    }
    flags.is_education_changed = c2079
        .and_then(|c| c.qualification.as_deref())
        .and_then(QualificationLevel::classify)
        .zip(facts.qualification_level)
        .map_or(false, |(before, now)| before != now);

    flags.is_new_party = !is_independent(current_party)
        && facts
            .party
            .as_ref()
            .map_or(true, |p| !p.party_existed_2079 && !p.party_existed_2074);

    if let Some(age) = record.age {
        flags.is_gen_z = age <= GEN_Z_MAX_AGE;
        flags.is_grandpa = age >= GRANDPA_MIN_AGE;
    }

    flags.is_influential = c2079.map_or(false, |c| {
        c.result.is_winner() && c.margin().map_or(false, |m| m >= INFLUENTIAL_MARGIN)
    });
    flags.is_split_vote_candidate =
        c2079.map_or(false, |c| c.vote_share().map_or(false, |s| s < SPLIT_VOTE_SHARE));

    flags.is_proportional_veteran = via(facts.membership_2079.as_ref(), ElectionType::Proportional)
        || via(facts.membership_2074.as_ref(), ElectionType::Proportional);

    flags.is_loyal = match (c2079, c2074) {
        (Some(a), Some(b)) => {
            parties.same_party(&a.party, current_party)
                && parties.same_party(&b.party, current_party)
                && a.same_seat(record.district_id, record.constituency_id)
                && b.same_seat(record.district_id, record.constituency_id)
        }
        _ => false,
    };

    flags.is_nepo = facts.family.has_known_relative || facts.family.is_family_source;

    let gender = record.gender.as_deref().unwrap_or_default();
    flags.is_budi_bokuwa = facts.family.spouse_is_candidate && is_male(gender);
    flags.is_budo_bokuwa = facts.family.spouse_is_candidate && is_female(gender);

    flags.is_past_minister = facts.profile.minister_appointments > 0;

    let candidate_type = match latest {
        None => NEW_CANDIDATE,
        Some(_) if flags.is_vaguwa => CHANGED_LOCATION,
        Some(_) => SAME_LOCATION,
    };

    FptpTagging {
        tags: tags_for(&flags),
        flags,
        candidate_type,
    }
}

fn tags_for(flags: &FptpFlags) -> Vec<String> {
    let mut tags = TagSet::new(FPTP_VOCABULARY);
    tags.set("tourist", flags.is_tourist_candidate);
    tags.set("chheparo", flags.is_chheparo);
    tags.set("vaguwa-won", flags.is_vaguwa_prev_winner);
    tags.set("vaguwa", flags.is_vaguwa && !flags.is_vaguwa_prev_winner);
    tags.set("new-candidate", flags.is_new_candidate);
    tags.set("educated", flags.is_educated);
    tags.set("uneducated", flags.is_uneducated);
    tags.set("new-party", flags.is_new_party);
    tags.set("gen-z", flags.is_gen_z);
    tags.set("grandpa", flags.is_grandpa);
    tags.set("influential", flags.is_influential);
    tags.set("opportunist", flags.is_opportunist);
    tags.set("split-vote", flags.is_split_vote_candidate);
    tags.set("proportional-veteran", flags.is_proportional_veteran);
    tags.set("loyal", flags.is_loyal);
    tags.set("nepo", flags.is_nepo);
    tags.set("budi-bokuwa", flags.is_budi_bokuwa);
    tags.set("budo-bokuwa", flags.is_budo_bokuwa);
    tags.set("purba-padadhikari", flags.is_past_minister);
    tags.into_vec()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::candidate::{FamilyFacts, PastContest, ProfileFacts};
    use crate::model::party::Party;
    use crate::model::raw::FptpCandidateRecord;
    use crate::model::ContestResult;

    pub(crate) fn record() -> FptpCandidateRecord {
        FptpCandidateRecord {
            candidate_id: 100,
            candidate_name: "राम बहादुर".into(),
            gender: Some("पुरुष".into()),
            age: Some(45),
            political_party_name: "X".into(),
            symbol_name: None,
            symbol_code: None,
            state_id: 1,
            district_id: 4,
            district_name: Some("झापा".into()),
            constituency_id: 3,
            father_name: None,
            spouse_name: None,
            qualification: None,
            institution_name: None,
            experience: None,
            other_details: None,
            address: Some("झापा दमक".into()),
            citizenship_district: Some("झापा".into()),
            votes_received: None,
            rank: None,
            remarks: None,
            election_status: None,
            image_url: None,
        }
    }

    pub(crate) fn facts() -> FptpFacts {
        FptpFacts {
            record: record(),
            state_name: Some("कोशी".into()),
            district_name: Some("झापा".into()),
            constituency_name: Some("झापा-3".into()),
            party: None,
            contest_2079: None,
            contest_2074: None,
            membership_2079: None,
            membership_2074: None,
            profile: ProfileFacts::default(),
            family: FamilyFacts::default(),
            qualification_level: None,
            residence_district: Some("झापा".into()),
        }
    }

    pub(crate) fn contest(party: &str, votes: i64, result: ContestResult) -> PastContest {
        PastContest {
            votes,
            rank: Some(if result.is_winner() { 1 } else { 2 }),
            remarks: None,
            result,
            party: party.into(),
            state_id: Some(1),
            district_id: 4,
            district_name: Some("झापा".into()),
            constituency_id: 3,
            casted_vote: 100_000,
            total_voters: None,
            runner_up_votes: Some(20_000),
            winner_votes: if result.is_winner() { votes } else { 60_000 },
            qualification: None,
        }
    }

    pub(crate) fn matcher() -> PartyMatcher {
        let mut x = Party::new(1, "X".into());
        x.previous_names = vec!["X (Old)".into()];
        x.party_existed_2079 = true;
        x.party_existed_2074 = true;
        PartyMatcher::new(&[x, Party::new(2, "Y".into())])
    }

    fn with_party(mut f: FptpFacts, m: &PartyMatcher) -> FptpFacts {
        f.party = m.resolve(&f.record.political_party_name).cloned();
        f
    }

    #[test]
    fn no_history_is_new_candidate() {
        let m = matcher();
        let out = evaluate(&with_party(facts(), &m), &m);
        assert!(out.flags.is_new_candidate);
        assert!(!out.flags.is_loyal);
        assert!(!out.flags.is_chheparo);
        assert_eq!(out.candidate_type, NEW_CANDIDATE);
        assert_eq!(out.tags, vec!["new-candidate"]);
    }

    #[test]
    fn renamed_party_keeps_candidate_loyal() {
        let m = matcher();
        let mut f = with_party(facts(), &m);
        f.contest_2079 = Some(contest("X", 45_000, ContestResult::Winner));
        f.contest_2074 = Some(contest("X (Old)", 30_000, ContestResult::Loser));
        let out = evaluate(&f, &m);
        assert!(out.flags.is_loyal);
        assert!(out.flags.is_same_party_2074_2079);
        assert!(!out.flags.is_chheparo);
        assert!(out.flags.is_influential);
        assert_eq!(out.candidate_type, SAME_LOCATION);
        assert!(out.tags.contains(&"loyal".to_string()));
    }

    #[test]
    fn party_switch_is_chheparo() {
        let m = matcher();
        let mut f = with_party(facts(), &m);
        f.contest_2079 = Some(contest("Y", 10_000, ContestResult::Loser));
        let out = evaluate(&f, &m);
        assert!(out.flags.is_chheparo);
        assert!(!out.flags.is_loyal);
        assert!(!out.flags.is_new_candidate);
    }

    #[test]
    fn former_independent_is_opportunist_not_chheparo() {
        let m = matcher();
        let mut f = with_party(facts(), &m);
        f.contest_2079 = Some(contest("स्वतन्त्र", 2_000, ContestResult::Loser));
        let out = evaluate(&f, &m);
        assert!(out.flags.is_opportunist);
        assert!(!out.flags.is_chheparo);
        assert!(out.flags.is_split_vote_candidate);
    }

    #[test]
    fn moved_winner_gets_only_vaguwa_won() {
        let m = matcher();
        let mut f = with_party(facts(), &m);
        let mut c = contest("X", 40_000, ContestResult::Winner);
        c.constituency_id = 5;
        f.contest_2079 = Some(c);
        let out = evaluate(&f, &m);
        assert!(out.flags.is_vaguwa && out.flags.is_vaguwa_prev_winner);
        assert!(out.tags.contains(&"vaguwa-won".to_string()));
        assert!(!out.tags.contains(&"vaguwa".to_string()));
        assert_eq!(out.candidate_type, CHANGED_LOCATION);
    }

    #[test]
    fn tourist_needs_a_known_home_district() {
        let m = matcher();
        let mut f = with_party(facts(), &m);
        f.record.citizenship_district = Some("काठमाडौं".into());
        f.residence_district = Some("ललितपुर".into());
        assert!(evaluate(&f, &m).flags.is_tourist_candidate);

        f.residence_district = Some("झापा".into());
        assert!(!evaluate(&f, &m).flags.is_tourist_candidate);

        f.record.citizenship_district = None;
        f.residence_district = None;
        assert!(!evaluate(&f, &m).flags.is_tourist_candidate);
    }

    #[test]
    fn age_and_education_bands() {
        let m = matcher();
        let mut f = with_party(facts(), &m);
        f.record.age = Some(27);
        f.qualification_level = Some(QualificationLevel::SchoolLeaving);
        let out = evaluate(&f, &m);
        assert!(out.flags.is_gen_z && !out.flags.is_grandpa);
        assert!(out.flags.is_uneducated && !out.flags.is_educated);

        f.record.age = Some(60);
        f.qualification_level = Some(QualificationLevel::Intermediate);
        let out = evaluate(&f, &m);
        assert!(out.flags.is_grandpa && !out.flags.is_gen_z);
        assert!(out.flags.is_educated && !out.flags.is_uneducated);
    }

    #[test]
    fn unknown_party_is_new_party() {
        let m = matcher();
        let mut f = facts();
        f.record.political_party_name = "Z Front".into();
        f = with_party(f, &m);
        assert!(evaluate(&f, &m).flags.is_new_party);

        f.record.political_party_name = "स्वतन्त्र".into();
        assert!(!evaluate(&f, &m).flags.is_new_party);
    }

    #[test]
    fn family_and_minister_tags() {
        let m = matcher();
        let mut f = with_party(facts(), &m);
        f.family.spouse_is_candidate = true;
        f.family.has_known_spouse = true;
        f.family.has_known_relative = true;
        f.profile.minister_appointments = 2;
        f.profile.elections_contested = 3;
        let out = evaluate(&f, &m);
        assert!(out.flags.is_budi_bokuwa && !out.flags.is_budo_bokuwa);
        assert!(out.flags.is_nepo);
        assert!(out.flags.is_past_minister);
        assert!(!out.flags.is_new_candidate);
        assert_eq!(out.tags.last().map(String::as_str), Some("purba-padadhikari"));
    }

    #[test]
    fn proportional_member_is_veteran() {
        let m = matcher();
        let mut f = with_party(facts(), &m);
        f.membership_2079 = Some(Membership {
            election_type: Some(ElectionType::Proportional),
            party: Some("X".into()),
            district: None,
            constituency: None,
        });
        let out = evaluate(&f, &m);
        assert!(out.flags.is_proportional_veteran);
        assert!(!out.flags.is_new_candidate);
        assert!(!out.flags.is_chheparo);
    }
}
