pub mod candidate;
pub mod constituency;
pub mod de;
pub mod party;
pub mod profile;
pub mod raw;

use serde::{Deserialize, Serialize};

/// Past election cycles the current candidates are compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cycle {
    #[serde(rename = "2079")]
    Y2079,
    #[serde(rename = "2074")]
    Y2074,
}

impl Cycle {
    pub const ALL: [Cycle; 2] = [Cycle::Y2079, Cycle::Y2074];

    pub fn year(self) -> i32 {
        match self {
            Cycle::Y2079 => 2079,
            Cycle::Y2074 => 2074,
        }
    }

    /// House of Representatives term a registration date (BS year) belongs to.
    pub fn for_registration_year(year: i32) -> Option<Cycle> {
        match year {
            y if y >= 2079 => Some(Cycle::Y2079),
            2074..=2078 => Some(Cycle::Y2074),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.year())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContestResult {
    Winner,
    Loser,
}

impl ContestResult {
    pub fn is_winner(self) -> bool {
        self == ContestResult::Winner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionType {
    #[serde(rename = "FPTP")]
    Fptp,
    Proportional,
}

impl ElectionType {
    /// Parliament records label the election type in English or Nepali.
    pub fn parse(label: &str) -> Option<ElectionType> {
        let lowered = crate::normalize::clean_text(label).to_lowercase();
        if lowered.is_empty() {
            None
        } else if lowered.contains("proportional")
            || lowered.contains("समानुपातिक")
            || lowered == "pr"
        {
            Some(ElectionType::Proportional)
        } else if lowered.contains("first past")
            || lowered.contains("fptp")
            || lowered.contains("प्रत्यक्ष")
        {
            Some(ElectionType::Fptp)
        } else {
            None
        }
    }
}

/// Geography key shared by candidates and constituency profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstituencyKey {
    pub state_id: i64,
    pub district_id: i64,
    pub constituency_id: i64,
}

impl std::fmt::Display for ConstituencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.state_id, self.district_id, self.constituency_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_year_maps_to_house_term() {
        assert_eq!(Cycle::for_registration_year(2079), Some(Cycle::Y2079));
        assert_eq!(Cycle::for_registration_year(2081), Some(Cycle::Y2079));
        assert_eq!(Cycle::for_registration_year(2074), Some(Cycle::Y2074));
        assert_eq!(Cycle::for_registration_year(2070), None);
    }

    #[test]
    fn parses_election_type_labels() {
        assert_eq!(ElectionType::parse("First Past The Post"), Some(ElectionType::Fptp));
        assert_eq!(ElectionType::parse("समानुपातिक"), Some(ElectionType::Proportional));
        assert_eq!(ElectionType::parse(""), None);
    }

    #[test]
    fn contest_result_serializes_as_label() {
        let json = serde_json::to_string(&ContestResult::Winner).unwrap();
        assert_eq!(json, "\"Winner\"");
    }
}
