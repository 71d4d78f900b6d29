//! Party identity across mergers and renames.

use crate::model::party::Party;
use crate::normalize::{clean_text, is_independent};
use std::collections::HashMap;

/// Resolves party names, current or historical, against the party table.
#[derive(Debug, Clone, Default)]
pub struct PartyMatcher {
    parties: Vec<Party>,
    by_current: HashMap<String, usize>,
    by_previous: HashMap<String, usize>,
}

impl PartyMatcher {
    pub fn new(parties: &[Party]) -> Self {
        let mut matcher = PartyMatcher::default();
        for party in parties {
            matcher.push(party.clone());
        }
        matcher
    }

    fn push(&mut self, party: Party) {
        let idx = self.parties.len();
        let current = clean_text(&party.current_party_name);
        self.by_current.entry(current).or_insert(idx);
        for previous in &party.previous_names {
            // A name some later party renamed away from still belongs to the
            // first party that claims it.
            self.by_previous.entry(clean_text(previous)).or_insert(idx);
        }
        self.parties.push(party);
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    /// Find a party by current name first, then by a previous name.
    /// Independent candidates never resolve.
    pub fn resolve(&self, name: &str) -> Option<&Party> {
        let key = clean_text(name);
        if key.is_empty() || is_independent(&key) {
            return None;
        }
        self.by_current
            .get(&key)
            .or_else(|| self.by_previous.get(&key))
            .map(|&idx| &self.parties[idx])
    }

    pub fn by_id(&self, party_id: i64) -> Option<&Party> {
        self.parties.iter().find(|p| p.party_id == party_id)
    }

    /// Merger-aware party equality: equal after whitespace normalization, or
    /// one name is a previous name of the party currently called the other.
    pub fn same_party(&self, a: &str, b: &str) -> bool {
        let a = clean_text(a);
        let b = clean_text(b);
        if a.is_empty() || b.is_empty() || is_independent(&a) || is_independent(&b) {
            return false;
        }
        a == b || self.renamed_from(&a, &b) || self.renamed_from(&b, &a)
    }

    fn renamed_from(&self, current: &str, previous: &str) -> bool {
        self.by_current.get(current).map_or(false, |&idx| {
            self.parties[idx]
                .previous_names
                .iter()
                .any(|name| clean_text(name) == previous)
        })
    }

    /// Whether any of the party's names appear in `names` (already cleaned).
    pub fn appears_in<'a, I>(&self, party: &Party, names: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        let own: Vec<String> = std::iter::once(&party.current_party_name)
            .chain(party.previous_names.iter())
            .map(|n| clean_text(n))
            .collect();
        names.into_iter().any(|n| own.iter().any(|o| o == n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PartyMatcher {
        let mut uml = Party::new(1, "नेकपा (एमाले)".to_string());
        uml.previous_names = vec!["नेकपा एमाले".to_string()];
        let mut x = Party::new(2, "X".to_string());
        x.previous_names = vec!["X (Old)".to_string()];
        let congress = Party::new(3, "नेपाली कांग्रेस".to_string());
        PartyMatcher::new(&[uml, x, congress])
    }

    #[test]
    fn renamed_party_matches_both_ways() {
        let m = matcher();
        assert!(m.same_party("X", "X (Old)"));
        assert!(m.same_party("X (Old)", "X"));
        assert!(m.same_party("नेपाली  कांग्रेस ", "नेपाली कांग्रेस"));
        assert!(!m.same_party("X", "नेपाली कांग्रेस"));
    }

    #[test]
    fn independents_never_match() {
        let m = matcher();
        assert!(!m.same_party("स्वतन्त्र", "स्वतन्त्र"));
        assert!(m.resolve("स्वतन्त्र").is_none());
        assert!(m.resolve("Independent").is_none());
    }

    #[test]
    fn resolve_prefers_current_name() {
        let m = matcher();
        assert_eq!(m.resolve("नेकपा एमाले").map(|p| p.party_id), Some(1));
        assert_eq!(m.resolve("X").map(|p| p.party_id), Some(2));
        assert!(m.resolve("Unknown Front").is_none());
    }

    #[test]
    fn appears_under_any_name() {
        let m = matcher();
        let party = m.resolve("X").unwrap().clone();
        let seen = vec!["X (Old)".to_string()];
        assert!(m.appears_in(&party, &seen));
        assert!(!m.appears_in(&party, &vec!["Y".to_string()]));
    }
}
