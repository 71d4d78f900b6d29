//! Turns joined facts plus tag output into the exported row shapes.

use crate::model::candidate::{
    FptpCandidate, FptpFacts, ParliamentFields, PrCandidate, PrFacts, PrevElection2074,
    PrevElection2079, PrevFptp2074, PrevFptp2079,
};
use crate::normalize::age_group;
use crate::tags::fptp::FptpTagging;
use crate::tags::pr::PrTagging;

pub fn fptp_candidate(facts: FptpFacts, tagging: FptpTagging) -> FptpCandidate {
    let prev_2079 = PrevElection2079::from(facts.contest_2079.as_ref());
    let prev_2074 = PrevElection2074::from(facts.contest_2074.as_ref());
    let parliament = ParliamentFields::new(facts.membership_2079.as_ref(), facts.membership_2074.as_ref());
    let party = facts.party;
    let r = facts.record;
    FptpCandidate {
        candidate_id: r.candidate_id,
        candidate_name: r.candidate_name,
        gender: r.gender,
        age_group: r.age.map(|a| age_group(a).to_string()),
        age: r.age,
        father_name: r.father_name,
        spouse_name: r.spouse_name,
        qualification: r.qualification,
        qualification_level: facts.qualification_level.map(|l| l.label().to_string()),
        qualification_level_scale: facts.qualification_level.map(|l| l.scale()),
        institution_name: r.institution_name,
        address: r.address,
        basobas_jilla: facts.residence_district,
        experience: r.experience,
        other_details: r.other_details,
        symbol_code: r.symbol_code,
        symbol_name: r.symbol_name,
        candidate_image_url: r.image_url,
        political_party_name: r.political_party_name,
        party_id: party.as_ref().map(|p| p.party_id),
        party_previous_names: party.as_ref().map(|p| p.previous_names.clone()).unwrap_or_default(),
        party_display_order: party.as_ref().and_then(|p| p.party_display_order),
        state_id: r.state_id,
        state_name: facts.state_name,
        district_id: r.district_id,
        district_name: facts.district_name.or(r.district_name),
        constituency_id: r.constituency_id,
        constituency_name: facts.constituency_name,
        citizenship_district: r.citizenship_district,
        election_status: r.election_status,
        current_vote_received: r.votes_received,
        rank_position: r.rank,
        prev_2079,
        prev_2074,
        parliament,
        minister_appointment_count: facts.profile.minister_appointments,
        total_elections_contested: facts.profile.elections_contested,
        total_wins_from_profile: facts.profile.election_wins,
        has_known_relative: facts.family.has_known_relative,
        is_family_source: facts.family.is_family_source,
        has_known_spouse: facts.family.has_known_spouse,
        has_known_parent: facts.family.has_known_parent,
        candidate_type: tagging.candidate_type.to_string(),
        flags: tagging.flags,
        tags: tagging.tags,
    }
}

pub fn pr_candidate(facts: PrFacts, tagging: PrTagging) -> PrCandidate {
    let fptp_2079 = PrevFptp2079::from(facts.contest_2079.as_ref());
    let fptp_2074 = PrevFptp2074::from(facts.contest_2074.as_ref());
    let parliament = ParliamentFields::new(facts.membership_2079.as_ref(), facts.membership_2074.as_ref());
    let times_elected = facts.memberships().count() as u32;
    let party = facts.party;
    let r = facts.record;
    PrCandidate {
        serial_no: r.serial_no,
        candidate_name: r.candidate_name,
        gender: r.gender,
        political_party_name: r.political_party_name,
        party_id: party.as_ref().map(|p| p.party_id),
        matched_party_name: party.as_ref().map(|p| p.current_party_name.clone()),
        party_previous_names: party.as_ref().map(|p| p.previous_names.clone()).unwrap_or_default(),
        party_display_order: party.as_ref().and_then(|p| p.party_display_order),
        inclusive_group: r.inclusive_group,
        backward_area: r.backward_area,
        disability: r.disability,
        citizenship_district: r.citizenship_district,
        voter_id_number: r.voter_id_number,
        associated_party: r.associated_party,
        remarks: r.remarks,
        rank_position: r.rank_position,
        rank_within_group: facts.rank_within_group,
        prev_2079_party_votes: party.as_ref().and_then(|p| p.prev_2079_party_votes),
        prev_2074_party_votes: party.as_ref().and_then(|p| p.prev_2074_party_votes),
        party_existed_2079: party.as_ref().map_or(false, |p| p.party_existed_2079),
        party_existed_2074: party.as_ref().map_or(false, |p| p.party_existed_2074),
        party_elections_contested: party.as_ref().map_or(0, |p| p.elections_contested()),
        fptp_2079,
        fptp_2074,
        parliament,
        times_elected,
        flags: tagging.flags,
        tags: tagging.tags,
    }
}
