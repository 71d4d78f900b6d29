use serde::{Deserialize, Serialize};

/// A row of `dim_parties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub party_id: i64,
    pub current_party_name: String,
    #[serde(default)]
    pub previous_names: Vec<String>,
    pub party_display_order: Option<i64>,
    pub party_name_en: Option<String>,
    pub symbol_url: Option<String>,
    pub party_existed_2079: bool,
    pub party_existed_2074: bool,
    pub prev_2079_party_votes: Option<i64>,
    pub prev_2074_party_votes: Option<i64>,
    pub fptp_seats_won_2079: u32,
    pub fptp_seats_won_2074: u32,
    pub current_fptp_candidates: u32,
    pub current_pr_candidates: u32,
}

impl Party {
    pub fn new(party_id: i64, current_party_name: String) -> Self {
        Party {
            party_id,
            current_party_name,
            previous_names: Vec::new(),
            party_display_order: None,
            party_name_en: None,
            symbol_url: None,
            party_existed_2079: false,
            party_existed_2074: false,
            prev_2079_party_votes: None,
            prev_2074_party_votes: None,
            fptp_seats_won_2079: 0,
            fptp_seats_won_2074: 0,
            current_fptp_candidates: 0,
            current_pr_candidates: 0,
        }
    }

    /// Number of past cycles the party (under any of its names) took part in.
    pub fn elections_contested(&self) -> u32 {
        self.party_existed_2079 as u32 + self.party_existed_2074 as u32
    }
}
