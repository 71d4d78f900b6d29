//! Source datasets as they arrive on disk (`*Row`) and as they are stored
//! after the ingestion boundary has checked identity fields (`*Record`).

use super::de;
use super::ElectionType;
use crate::normalize::{bs_year, clean_text};
use serde::{Deserialize, Serialize};

/// A required identity field was missing or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required field `{field}`")]
pub struct MissingField {
    pub field: &'static str,
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, MissingField> {
    value
        .map(|v| clean_text(&v))
        .filter(|v| !v.is_empty())
        .ok_or(MissingField { field })
}

fn required_id(value: Option<i64>, field: &'static str) -> Result<i64, MissingField> {
    value.ok_or(MissingField { field })
}

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StateRow {
    #[serde(default, alias = "id", alias = "StateID", deserialize_with = "de::opt_integer")]
    pub state_id: Option<i64>,
    #[serde(default, alias = "name", alias = "StateName", deserialize_with = "de::opt_text")]
    pub state_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub state_id: i64,
    pub state_name: String,
}

impl TryFrom<StateRow> for StateRecord {
    type Error = MissingField;

    fn try_from(row: StateRow) -> Result<Self, Self::Error> {
        Ok(StateRecord {
            state_id: required_id(row.state_id, "state_id")?,
            state_name: required_text(row.state_name, "state_name")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DistrictRow {
    #[serde(default, alias = "id", alias = "DistrictCd", deserialize_with = "de::opt_integer")]
    pub district_id: Option<i64>,
    #[serde(default, alias = "name", alias = "DistrictName", deserialize_with = "de::opt_text")]
    pub district_name: Option<String>,
    #[serde(default, alias = "parentId", alias = "State", deserialize_with = "de::opt_integer")]
    pub state_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    pub district_id: i64,
    pub district_name: String,
    pub state_id: i64,
}

impl TryFrom<DistrictRow> for DistrictRecord {
    type Error = MissingField;

    fn try_from(row: DistrictRow) -> Result<Self, Self::Error> {
        Ok(DistrictRecord {
            district_id: required_id(row.district_id, "district_id")?,
            district_name: required_text(row.district_name, "district_name")?,
            state_id: required_id(row.state_id, "state_id")?,
        })
    }
}

/// The commission publishes the number of constituencies per district.
#[derive(Debug, Deserialize)]
pub struct ConstituencyCountRow {
    #[serde(default, alias = "distId", alias = "DistrictCd", deserialize_with = "de::opt_integer")]
    pub district_id: Option<i64>,
    #[serde(default, alias = "count", deserialize_with = "de::opt_integer")]
    pub consts: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituencyCountRecord {
    pub district_id: i64,
    pub consts: i64,
}

impl TryFrom<ConstituencyCountRow> for ConstituencyCountRecord {
    type Error = MissingField;

    fn try_from(row: ConstituencyCountRow) -> Result<Self, Self::Error> {
        Ok(ConstituencyCountRecord {
            district_id: required_id(row.district_id, "district_id")?,
            consts: required_id(row.consts, "consts")?,
        })
    }
}

// ---------------------------------------------------------------------------
// FPTP candidates and results
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FptpCandidateRow {
    #[serde(default, alias = "CandidateID", alias = "CandidateId", deserialize_with = "de::opt_integer")]
    pub candidate_id: Option<i64>,
    #[serde(default, alias = "CandidateName", deserialize_with = "de::opt_text")]
    pub candidate_name: Option<String>,
    #[serde(default, alias = "Gender", deserialize_with = "de::opt_text")]
    pub gender: Option<String>,
    #[serde(default, alias = "Age", alias = "AGE_YR", deserialize_with = "de::opt_u32")]
    pub age: Option<u32>,
    #[serde(default, alias = "PoliticalPartyName", deserialize_with = "de::opt_text")]
    pub political_party_name: Option<String>,
    #[serde(default, alias = "SymbolName", deserialize_with = "de::opt_text")]
    pub symbol_name: Option<String>,
    #[serde(default, alias = "SymbolID", deserialize_with = "de::opt_integer")]
    pub symbol_code: Option<i64>,
    #[serde(default, alias = "State", alias = "STATE_ID", deserialize_with = "de::opt_integer")]
    pub state_id: Option<i64>,
    #[serde(default, alias = "DistrictCd", deserialize_with = "de::opt_integer")]
    pub district_id: Option<i64>,
    #[serde(default, alias = "DistrictName", deserialize_with = "de::opt_text")]
    pub district_name: Option<String>,
    #[serde(default, alias = "SCConstID", deserialize_with = "de::opt_integer")]
    pub constituency_id: Option<i64>,
    #[serde(default, alias = "FATHER_NAME", deserialize_with = "de::opt_text")]
    pub father_name: Option<String>,
    #[serde(default, alias = "SPOUCE_NAME", deserialize_with = "de::opt_text")]
    pub spouse_name: Option<String>,
    #[serde(default, alias = "QUALIFICATION", deserialize_with = "de::opt_text")]
    pub qualification: Option<String>,
    #[serde(default, alias = "NAMEOFINST", deserialize_with = "de::opt_text")]
    pub institution_name: Option<String>,
    #[serde(default, alias = "EXPERIENCE", deserialize_with = "de::opt_text")]
    pub experience: Option<String>,
    #[serde(default, alias = "OTHERDETAILS", deserialize_with = "de::opt_text")]
    pub other_details: Option<String>,
    #[serde(default, alias = "ADDRESS", deserialize_with = "de::opt_text")]
    pub address: Option<String>,
    #[serde(default, alias = "CTZDIST", deserialize_with = "de::opt_text")]
    pub citizenship_district: Option<String>,
    #[serde(default, alias = "TotalVoteReceived", deserialize_with = "de::opt_integer")]
    pub votes_received: Option<i64>,
    #[serde(default, alias = "Rank", deserialize_with = "de::opt_integer")]
    pub rank: Option<i64>,
    #[serde(default, alias = "Remarks", deserialize_with = "de::opt_text")]
    pub remarks: Option<String>,
    #[serde(default, alias = "E_STATUS", deserialize_with = "de::opt_text")]
    pub election_status: Option<String>,
    #[serde(default, alias = "ImageUrl", deserialize_with = "de::opt_text")]
    pub image_url: Option<String>,
}

/// A current-cycle FPTP candidate after identity checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FptpCandidateRecord {
    pub candidate_id: i64,
    pub candidate_name: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub political_party_name: String,
    pub symbol_name: Option<String>,
    pub symbol_code: Option<i64>,
    pub state_id: i64,
    pub district_id: i64,
    pub district_name: Option<String>,
    pub constituency_id: i64,
    pub father_name: Option<String>,
    pub spouse_name: Option<String>,
    pub qualification: Option<String>,
    pub institution_name: Option<String>,
    pub experience: Option<String>,
    pub other_details: Option<String>,
    pub address: Option<String>,
    pub citizenship_district: Option<String>,
    pub votes_received: Option<i64>,
    pub rank: Option<i64>,
    pub remarks: Option<String>,
    pub election_status: Option<String>,
    pub image_url: Option<String>,
}

impl TryFrom<FptpCandidateRow> for FptpCandidateRecord {
    type Error = MissingField;

    fn try_from(row: FptpCandidateRow) -> Result<Self, Self::Error> {
        Ok(FptpCandidateRecord {
            candidate_id: required_id(row.candidate_id, "candidate_id")?,
            candidate_name: required_text(row.candidate_name, "candidate_name")?,
            political_party_name: required_text(row.political_party_name, "political_party_name")?,
            state_id: required_id(row.state_id, "state_id")?,
            district_id: required_id(row.district_id, "district_id")?,
            constituency_id: required_id(row.constituency_id, "constituency_id")?,
            gender: row.gender,
            age: row.age,
            symbol_name: row.symbol_name,
            symbol_code: row.symbol_code,
            district_name: row.district_name,
            father_name: row.father_name,
            spouse_name: row.spouse_name,
            qualification: row.qualification,
            institution_name: row.institution_name,
            experience: row.experience,
            other_details: row.other_details,
            address: row.address,
            citizenship_district: row.citizenship_district,
            votes_received: row.votes_received,
            rank: row.rank,
            remarks: row.remarks,
            election_status: row.election_status,
            image_url: row.image_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PastFptpResultRow {
    #[serde(default, alias = "CandidateID", alias = "CandidateId", deserialize_with = "de::opt_integer")]
    pub candidate_id: Option<i64>,
    #[serde(default, alias = "CandidateName", deserialize_with = "de::opt_text")]
    pub candidate_name: Option<String>,
    #[serde(default, alias = "Gender", deserialize_with = "de::opt_text")]
    pub gender: Option<String>,
    #[serde(default, alias = "Age", deserialize_with = "de::opt_u32")]
    pub age: Option<u32>,
    #[serde(default, alias = "PoliticalPartyName", deserialize_with = "de::opt_text")]
    pub political_party_name: Option<String>,
    #[serde(default, alias = "SymbolName", deserialize_with = "de::opt_text")]
    pub symbol_name: Option<String>,
    #[serde(default, alias = "State", alias = "STATE_ID", deserialize_with = "de::opt_integer")]
    pub state_id: Option<i64>,
    #[serde(default, alias = "DistrictCd", deserialize_with = "de::opt_integer")]
    pub district_id: Option<i64>,
    #[serde(default, alias = "DistrictName", deserialize_with = "de::opt_text")]
    pub district_name: Option<String>,
    #[serde(default, alias = "SCConstID", deserialize_with = "de::opt_integer")]
    pub constituency_id: Option<i64>,
    #[serde(default, alias = "TotalVoteReceived", alias = "TotalVote", deserialize_with = "de::opt_integer")]
    pub votes: Option<i64>,
    #[serde(default, alias = "CastedVote", deserialize_with = "de::opt_integer")]
    pub casted_vote: Option<i64>,
    #[serde(default, alias = "TotalVoters", deserialize_with = "de::opt_integer")]
    pub total_voters: Option<i64>,
    #[serde(default, alias = "Rank", deserialize_with = "de::opt_integer")]
    pub rank: Option<i64>,
    #[serde(default, alias = "Remarks", deserialize_with = "de::opt_text")]
    pub remarks: Option<String>,
    #[serde(default, alias = "FATHER_NAME", deserialize_with = "de::opt_text")]
    pub father_name: Option<String>,
    #[serde(default, alias = "QUALIFICATION", deserialize_with = "de::opt_text")]
    pub qualification: Option<String>,
}

/// One candidate line of a past FPTP contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastFptpResultRecord {
    pub candidate_id: Option<i64>,
    pub candidate_name: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub political_party_name: String,
    pub symbol_name: Option<String>,
    pub state_id: Option<i64>,
    pub district_id: i64,
    pub district_name: Option<String>,
    pub constituency_id: i64,
    pub votes: i64,
    pub casted_vote: Option<i64>,
    pub total_voters: Option<i64>,
    pub rank: Option<i64>,
    pub remarks: Option<String>,
    pub father_name: Option<String>,
    pub qualification: Option<String>,
}

impl PastFptpResultRecord {
    /// The commission marks winners with `Remarks = "Elected"`; older files only
    /// carry the rank. Any other remark, "Not Elected" included, is a loss.
    pub fn is_elected(&self) -> bool {
        match self.remarks.as_deref().map(str::trim) {
            Some(remarks) if !remarks.is_empty() => {
                remarks.eq_ignore_ascii_case("elected") || remarks == "निर्वाचित"
            }
            _ => self.rank == Some(1),
        }
    }
}

impl TryFrom<PastFptpResultRow> for PastFptpResultRecord {
    type Error = MissingField;

    fn try_from(row: PastFptpResultRow) -> Result<Self, Self::Error> {
        Ok(PastFptpResultRecord {
            candidate_name: required_text(row.candidate_name, "candidate_name")?,
            political_party_name: required_text(row.political_party_name, "political_party_name")?,
            district_id: required_id(row.district_id, "district_id")?,
            constituency_id: required_id(row.constituency_id, "constituency_id")?,
            candidate_id: row.candidate_id,
            gender: row.gender,
            age: row.age,
            symbol_name: row.symbol_name,
            state_id: row.state_id,
            district_name: row.district_name,
            votes: row.votes.unwrap_or(0),
            casted_vote: row.casted_vote,
            total_voters: row.total_voters,
            rank: row.rank,
            remarks: row.remarks,
            father_name: row.father_name,
            qualification: row.qualification,
        })
    }
}

// ---------------------------------------------------------------------------
// Proportional lists and results
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PrPartyVoteRow {
    #[serde(default, alias = "PoliticalPartyName", alias = "party_name", deserialize_with = "de::opt_text")]
    pub political_party_name: Option<String>,
    #[serde(default, alias = "TotalVoteReceived", alias = "TotalVote", alias = "vote_count", deserialize_with = "de::opt_integer")]
    pub votes: Option<i64>,
    #[serde(default, alias = "State", alias = "STATE_ID", deserialize_with = "de::opt_integer")]
    pub state_id: Option<i64>,
    #[serde(default, alias = "DistrictCd", deserialize_with = "de::opt_integer")]
    pub district_id: Option<i64>,
    #[serde(default, alias = "SCConstID", deserialize_with = "de::opt_integer")]
    pub constituency_id: Option<i64>,
}

/// Party-list votes, either per constituency or as a national total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrPartyVoteRecord {
    pub political_party_name: String,
    pub votes: i64,
    pub state_id: Option<i64>,
    pub district_id: Option<i64>,
    pub constituency_id: Option<i64>,
}

impl TryFrom<PrPartyVoteRow> for PrPartyVoteRecord {
    type Error = MissingField;

    fn try_from(row: PrPartyVoteRow) -> Result<Self, Self::Error> {
        Ok(PrPartyVoteRecord {
            political_party_name: required_text(row.political_party_name, "political_party_name")?,
            votes: row.votes.unwrap_or(0),
            state_id: row.state_id,
            district_id: row.district_id,
            constituency_id: row.constituency_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PrCandidateRow {
    #[serde(default, alias = "SerialNo", alias = "serial_number", deserialize_with = "de::opt_integer")]
    pub serial_no: Option<i64>,
    #[serde(default, alias = "CandidateName", alias = "name", deserialize_with = "de::opt_text")]
    pub candidate_name: Option<String>,
    #[serde(default, alias = "Gender", deserialize_with = "de::opt_text")]
    pub gender: Option<String>,
    #[serde(default, alias = "PoliticalPartyName", alias = "party_name", deserialize_with = "de::opt_text")]
    pub political_party_name: Option<String>,
    #[serde(default, alias = "InclusiveGroup", deserialize_with = "de::opt_text")]
    pub inclusive_group: Option<String>,
    #[serde(default, alias = "BackwardArea", deserialize_with = "de::opt_text")]
    pub backward_area: Option<String>,
    #[serde(default, alias = "Disability", deserialize_with = "de::opt_text")]
    pub disability: Option<String>,
    #[serde(default, alias = "CitizenshipDistrict", alias = "CTZDIST", deserialize_with = "de::opt_text")]
    pub citizenship_district: Option<String>,
    #[serde(default, alias = "VoterIdNumber", deserialize_with = "de::opt_text")]
    pub voter_id_number: Option<String>,
    #[serde(default, alias = "Rank", alias = "rank", deserialize_with = "de::opt_integer")]
    pub rank_position: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub associated_party: Option<String>,
    #[serde(default, alias = "Remarks", deserialize_with = "de::opt_text")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrCandidateRecord {
    pub serial_no: i64,
    pub candidate_name: String,
    pub gender: Option<String>,
    pub political_party_name: String,
    pub inclusive_group: Option<String>,
    pub backward_area: Option<String>,
    pub disability: Option<String>,
    pub citizenship_district: Option<String>,
    pub voter_id_number: Option<String>,
    /// Position on the party's closed list; the serial number when absent.
    pub rank_position: i64,
    pub associated_party: Option<String>,
    pub remarks: Option<String>,
}

impl TryFrom<PrCandidateRow> for PrCandidateRecord {
    type Error = MissingField;

    fn try_from(row: PrCandidateRow) -> Result<Self, Self::Error> {
        let serial_no = required_id(row.serial_no, "serial_no")?;
        Ok(PrCandidateRecord {
            serial_no,
            candidate_name: required_text(row.candidate_name, "candidate_name")?,
            political_party_name: required_text(row.political_party_name, "political_party_name")?,
            gender: row.gender,
            inclusive_group: row.inclusive_group,
            backward_area: row.backward_area,
            disability: row.disability,
            citizenship_district: row.citizenship_district,
            voter_id_number: row.voter_id_number,
            rank_position: row.rank_position.unwrap_or(serial_no),
            associated_party: row.associated_party,
            remarks: row.remarks,
        })
    }
}

// ---------------------------------------------------------------------------
// Parliament
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ParliamentMemberRow {
    #[serde(default, alias = "id", deserialize_with = "de::opt_integer")]
    pub member_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub name_np: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub name_en: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub parliament_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub member_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub district_name_np: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub district_name_en: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub political_party_name_np: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub political_party_name_en: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub election_type_en: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub election_type_np: Option<String>,
    #[serde(default, deserialize_with = "de::opt_integer")]
    pub election_area_no: Option<i64>,
    #[serde(default, alias = "registered_date", deserialize_with = "de::opt_text")]
    pub registered_date_bs: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub tenure_end_date: Option<String>,
}

impl ParliamentMemberRow {
    /// Only elected House of Representatives members count; the API also lists
    /// National Assembly members and office bearers.
    pub fn is_house_member(&self) -> bool {
        let house = self
            .parliament_type
            .as_deref()
            .map_or(true, |t| t.eq_ignore_ascii_case("hr"));
        let member = self
            .member_type
            .as_deref()
            .map_or(true, |t| t.eq_ignore_ascii_case("member"));
        house && member
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParliamentMemberRecord {
    pub member_id: i64,
    pub name_np: Option<String>,
    pub name_en: Option<String>,
    pub gender: Option<String>,
    pub status: Option<String>,
    pub district_name_np: Option<String>,
    pub district_name_en: Option<String>,
    pub political_party_name_np: Option<String>,
    pub political_party_name_en: Option<String>,
    pub election_type: Option<ElectionType>,
    pub election_area_no: Option<i64>,
    pub registered_date_bs: Option<String>,
    pub tenure_end_date: Option<String>,
}

impl ParliamentMemberRecord {
    pub fn registration_year(&self) -> Option<i32> {
        self.registered_date_bs.as_deref().and_then(bs_year)
    }
}

impl TryFrom<ParliamentMemberRow> for ParliamentMemberRecord {
    type Error = MissingField;

    fn try_from(row: ParliamentMemberRow) -> Result<Self, Self::Error> {
        if row.name_np.is_none() && row.name_en.is_none() {
            return Err(MissingField { field: "name_np" });
        }
        let election_type = row
            .election_type_en
            .as_deref()
            .and_then(ElectionType::parse)
            .or_else(|| row.election_type_np.as_deref().and_then(ElectionType::parse));
        Ok(ParliamentMemberRecord {
            member_id: required_id(row.member_id, "member_id")?,
            name_np: row.name_np,
            name_en: row.name_en,
            gender: row.gender,
            status: row.status,
            district_name_np: row.district_name_np,
            district_name_en: row.district_name_en,
            political_party_name_np: row.political_party_name_np,
            political_party_name_en: row.political_party_name_en,
            election_type,
            election_area_no: row.election_area_no,
            registered_date_bs: row.registered_date_bs,
            tenure_end_date: row.tenure_end_date,
        })
    }
}

// ---------------------------------------------------------------------------
// Party seeds and symbols
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PartySymbolRow {
    #[serde(default, alias = "party_name", deserialize_with = "de::opt_text")]
    pub party_name_np: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub party_name_en: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub symbol_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartySymbolRecord {
    pub party_name_np: Option<String>,
    pub party_name_en: Option<String>,
    pub symbol_url: Option<String>,
}

impl TryFrom<PartySymbolRow> for PartySymbolRecord {
    type Error = MissingField;

    fn try_from(row: PartySymbolRow) -> Result<Self, Self::Error> {
        if row.party_name_np.is_none() && row.party_name_en.is_none() {
            return Err(MissingField { field: "party_name_np" });
        }
        Ok(PartySymbolRecord {
            party_name_np: row.party_name_np,
            party_name_en: row.party_name_en,
            symbol_url: row.symbol_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PartySeedRow {
    #[serde(default, alias = "id", deserialize_with = "de::opt_integer")]
    pub party_id: Option<i64>,
    #[serde(default, alias = "name", deserialize_with = "de::opt_text")]
    pub current_party_name: Option<String>,
    #[serde(default, deserialize_with = "de::string_list")]
    pub previous_names: Vec<String>,
    #[serde(default, alias = "display_order", deserialize_with = "de::opt_integer")]
    pub party_display_order: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub party_name_en: Option<String>,
}

/// Curated party list with merger history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartySeedRecord {
    pub party_id: i64,
    pub current_party_name: String,
    pub previous_names: Vec<String>,
    pub party_display_order: Option<i64>,
    pub party_name_en: Option<String>,
}

impl TryFrom<PartySeedRow> for PartySeedRecord {
    type Error = MissingField;

    fn try_from(row: PartySeedRow) -> Result<Self, Self::Error> {
        Ok(PartySeedRecord {
            party_id: required_id(row.party_id, "party_id")?,
            current_party_name: required_text(row.current_party_name, "current_party_name")?,
            previous_names: row.previous_names,
            party_display_order: row.party_display_order,
            party_name_en: row.party_name_en,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Spouse,
    Parent,
    Child,
    Sibling,
    Relative,
}

impl Relation {
    fn parse(label: &str) -> Relation {
        match clean_text(label).to_lowercase().as_str() {
            "spouse" | "wife" | "husband" | "श्रीमती" | "श्रीमान" => Relation::Spouse,
            "parent" | "father" | "mother" | "बुबा" | "आमा" => Relation::Parent,
            "child" | "son" | "daughter" | "छोरा" | "छोरी" => Relation::Child,
            "sibling" | "brother" | "sister" | "दाजु" | "भाइ" | "दिदी" | "बहिनी" => Relation::Sibling,
            _ => Relation::Relative,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FamilyLinkRow {
    #[serde(default, alias = "name", deserialize_with = "de::opt_text")]
    pub candidate_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub relation: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub relative_name: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_family_source: bool,
}

/// A curated political-family link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyLinkRecord {
    pub candidate_name: String,
    pub relation: Option<Relation>,
    pub relative_name: Option<String>,
    pub is_family_source: bool,
}

impl TryFrom<FamilyLinkRow> for FamilyLinkRecord {
    type Error = MissingField;

    fn try_from(row: FamilyLinkRow) -> Result<Self, Self::Error> {
        Ok(FamilyLinkRecord {
            candidate_name: required_text(row.candidate_name, "candidate_name")?,
            relation: row.relation.as_deref().map(Relation::parse),
            relative_name: row.relative_name,
            is_family_source: row.is_family_source,
        })
    }
}
