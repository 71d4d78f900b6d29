//! Text normalization shared by the loader and the tag engine.
//!
//! Government sources mix Devanagari and ASCII digits, pad names with stray
//! whitespace and sprinkle zero-width joiners through conjuncts, so every
//! comparison between datasets goes through these helpers first.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Labels used by the election commission for candidates without a party.
pub const INDEPENDENT_LABELS: &[&str] = &["स्वतन्त्र", "Independent", "independent"];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref INVISIBLE: Regex = Regex::new("[\u{200B}\u{200C}\u{200D}\u{FEFF}\u{00AD}]").unwrap();
    static ref LEADING_YEAR: Regex = Regex::new(r"^\s*(\d{4})").unwrap();
    static ref PHD: Regex = Regex::new(r"(?i)(विद्यावारिधि|ph\.?\s*d)").unwrap();
    static ref MASTER: Regex =
        Regex::new(r"(?i)(स्नातकोत्तर|master|एम\.?\s*ए|\bm\.?\s*a\b|\bmba\b|\bm\.?\s*sc\b)").unwrap();
    static ref BACHELOR: Regex =
        Regex::new(r"(?i)(स्नातक|स्तनातक|bachelor|बि\.?\s*ए|बी\.?\s*ए|\bb\.?\s*a\b|\bbba\b|\bb\.?\s*sc\b|\bmbbs\b)")
            .unwrap();
    static ref INTERMEDIATE: Regex = Regex::new(
        r"(?i)(\+\s*2|\+\s*२|१०\s*\+\s*२|उच्च\s*माध्यमिक|प्रमाणपत्र\s*तह|इन्टरमिडिएट|intermediate|higher\s*secondary|\bi\.?\s*a\b)"
    )
    .unwrap();
    static ref SCHOOL_LEAVING: Regex =
        Regex::new(r"(?i)(एस\.?\s*एल\.?\s*सी|एस\.?\s*ई\.?\s*ई|\bslc\b|\bsee\b|माध्यमिक\s*शिक्षा|कक्षा\s*१०|class\s*10)")
            .unwrap();
    static ref LITERATE: Regex =
        Regex::new(r"(?i)(साक्षर|सामान्य\s*लेखपढ|literate|प्राथमिक|निम्न\s*माध्यमिक|कक्षा\s*[१-९]\b)").unwrap();
    static ref ILLITERATE: Regex = Regex::new(r"(?i)(निरक्षर|illiterate)").unwrap();
}

/// Collapse whitespace, drop zero-width characters and trim.
pub fn clean_text(value: &str) -> String {
    let visible = INVISIBLE.replace_all(value, "");
    WHITESPACE.replace_all(visible.trim(), " ").into_owned()
}

/// Key used when matching people or places across datasets.
pub fn name_key(value: &str) -> String {
    clean_text(&devanagari_to_ascii(value)).to_lowercase()
}

/// Clean an optional field, mapping blank strings to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(clean_text).filter(|v| !v.is_empty())
}

pub fn devanagari_to_ascii(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\u{0966}'..='\u{096F}' => {
                char::from_digit(c as u32 - 0x0966, 10).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

/// Parse an integer that may use Devanagari digits, thousands separators or a
/// trailing `.0` from spreadsheet exports.
pub fn parse_integer(value: &str) -> Option<i64> {
    let ascii: String = devanagari_to_ascii(value)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if ascii.is_empty() {
        return None;
    }
    ascii.parse::<i64>().ok().or_else(|| {
        ascii
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// Leading Bikram Sambat year of a date such as `2079-09-10` or `२०७४/११/०५`.
pub fn bs_year(date: &str) -> Option<i32> {
    let ascii = devanagari_to_ascii(date);
    LEADING_YEAR
        .captures(&ascii)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn is_independent(party: &str) -> bool {
    let cleaned = clean_text(party);
    INDEPENDENT_LABELS.iter().any(|label| *label == cleaned)
}

pub fn is_female(gender: &str) -> bool {
    matches!(clean_text(gender).to_lowercase().as_str(), "महिला" | "female" | "f")
}

pub fn is_male(gender: &str) -> bool {
    matches!(clean_text(gender).to_lowercase().as_str(), "पुरुष" | "male" | "m")
}

/// The commission writes addresses district-first: `झापा हल्दिबारी गाउँपालिका ...`.
pub fn residence_district(address: &str) -> Option<String> {
    clean_text(address)
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|token| !token.is_empty())
        .map(|token| token.to_string())
}

pub fn age_group(age: u32) -> &'static str {
    match age {
        0..=27 => "18-27",
        28..=39 => "28-39",
        40..=49 => "40-49",
        50..=59 => "50-59",
        _ => "60+",
    }
}

/// Highest completed education, ordered by `scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualificationLevel {
    Illiterate,
    Literate,
    SchoolLeaving,
    Intermediate,
    Bachelor,
    Master,
    Doctorate,
}

impl QualificationLevel {
    pub fn classify(qualification: &str) -> Option<Self> {
        let text = clean_text(qualification);
        if text.is_empty() {
            return None;
        }
        // Order matters: स्नातकोत्तर contains स्नातक.
        if PHD.is_match(&text) {
            Some(QualificationLevel::Doctorate)
        } else if MASTER.is_match(&text) {
            Some(QualificationLevel::Master)
        } else if BACHELOR.is_match(&text) {
            Some(QualificationLevel::Bachelor)
        } else if INTERMEDIATE.is_match(&text) {
            Some(QualificationLevel::Intermediate)
        } else if ILLITERATE.is_match(&text) {
            Some(QualificationLevel::Illiterate)
        } else if SCHOOL_LEAVING.is_match(&text) {
            Some(QualificationLevel::SchoolLeaving)
        } else if LITERATE.is_match(&text) {
            Some(QualificationLevel::Literate)
        } else {
            None
        }
    }

    pub fn scale(self) -> u8 {
        match self {
            QualificationLevel::Illiterate => 0,
            QualificationLevel::Literate => 1,
            QualificationLevel::SchoolLeaving => 2,
            QualificationLevel::Intermediate => 3,
            QualificationLevel::Bachelor => 4,
            QualificationLevel::Master => 5,
            QualificationLevel::Doctorate => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualificationLevel::Illiterate => "Illiterate",
            QualificationLevel::Literate => "Literate",
            QualificationLevel::SchoolLeaving => "SLC/SEE",
            QualificationLevel::Intermediate => "Intermediate",
            QualificationLevel::Bachelor => "Bachelor",
            QualificationLevel::Master => "Master",
            QualificationLevel::Doctorate => "PhD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_joiners_and_whitespace() {
        assert_eq!(clean_text("  स्‍नातक  "), "स्नातक");
        assert_eq!(clean_text("नेपाली   कांग्रेस"), "नेपाली कांग्रेस");
    }

    #[test]
    fn parses_devanagari_numbers() {
        assert_eq!(parse_integer("२०७९"), Some(2079));
        assert_eq!(parse_integer("40,662"), Some(40662));
        assert_eq!(parse_integer("84808.0"), Some(84808));
        assert_eq!(parse_integer("abc"), None);
        assert_eq!(parse_integer(""), None);
    }

    #[test]
    fn reads_bs_year() {
        assert_eq!(bs_year("2079-09-10"), Some(2079));
        assert_eq!(bs_year("२०७४/११/०५"), Some(2074));
        assert_eq!(bs_year("unknown"), None);
    }

    #[test]
    fn classifies_qualifications() {
        assert_eq!(QualificationLevel::classify("स्नातकोत्तर"), Some(QualificationLevel::Master));
        assert_eq!(QualificationLevel::classify("स्‍नातक"), Some(QualificationLevel::Bachelor));
        assert_eq!(QualificationLevel::classify("+2"), Some(QualificationLevel::Intermediate));
        assert_eq!(QualificationLevel::classify("एस.एल.सी."), Some(QualificationLevel::SchoolLeaving));
        assert_eq!(QualificationLevel::classify("साक्षर"), Some(QualificationLevel::Literate));
        assert_eq!(QualificationLevel::classify("निरक्षर"), Some(QualificationLevel::Illiterate));
        assert_eq!(QualificationLevel::classify(""), None);
    }

    #[test]
    fn residence_is_first_address_token() {
        assert_eq!(
            residence_district("झापा हल्दिबारी गाउँपालिका नमुना टोल").as_deref(),
            Some("झापा")
        );
        assert_eq!(residence_district("   "), None);
    }

    #[test]
    fn recognises_independents_and_gender() {
        assert!(is_independent(" स्वतन्त्र "));
        assert!(!is_independent("नेपाली कांग्रेस"));
        assert!(is_female("महिला"));
        assert!(is_male("पुरुष"));
        assert_eq!(age_group(27), "18-27");
        assert_eq!(age_group(60), "60+");
    }
}
