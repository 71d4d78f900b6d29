//! Cross-model consistency checks over the derived tables.
//!
//! Every check is read-only: violations are reported, never repaired. The
//! report is deterministic so two runs over the same data compare equal.

mod candidates;
mod constituencies;

use crate::derive::DerivedTables;
use crate::model::ConstituencyKey;
use crate::normalize::clean_text;
use crate::tags::PartyMatcher;
use colored::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Minimum share of FPTP candidates whose party resolves to a party_id.
pub const FPTP_PARTY_COVERAGE: f64 = 0.60;
/// Minimum share of PR candidates whose party resolves to a party_id.
pub const PR_PARTY_COVERAGE: f64 = 0.95;
/// Share of FPTP candidates without a citizenship district that triggers a warning.
pub const MISSING_CITIZENSHIP_WARNING: f64 = 0.10;
/// Tolerance when recomputing stored margins.
pub const MARGIN_TOLERANCE: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// What an issue is about.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EntityRef {
    Dataset,
    FptpCandidate(i64),
    PrCandidate { party: String, serial_no: i64 },
    Constituency(ConstituencyKey),
    Party(i64),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Dataset => write!(f, "dataset"),
            EntityRef::FptpCandidate(id) => write!(f, "fptp candidate {}", id),
            EntityRef::PrCandidate { party, serial_no } => {
                write!(f, "pr candidate {} #{}", party, serial_no)
            }
            EntityRef::Constituency(key) => write!(f, "constituency {}", key),
            EntityRef::Party(id) => write!(f, "party {}", id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    /// Stable `Area.Problem` code.
    pub code: &'static str,
    pub message: String,
    pub entity: EntityRef,
}

impl Issue {
    pub(crate) fn error(code: &'static str, entity: EntityRef, message: impl Into<String>) -> Self {
        Issue {
            severity: Severity::Error,
            code,
            message: message.into(),
            entity,
        }
    }

    pub(crate) fn warning(code: &'static str, entity: EntityRef, message: impl Into<String>) -> Self {
        Issue {
            severity: Severity::Warning,
            code,
            message: message.into(),
            entity,
        }
    }
}

/// `pass` is true when no issue is an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// Print the report, capping the per-code listing at `limit` entries.
    pub fn print(&self, limit: usize) {
        println!("\n{}", "🔍 Validation Report".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());

        let mut by_code: Vec<(&'static str, Vec<&Issue>)> = Vec::new();
        for issue in &self.issues {
            match by_code.iter_mut().find(|(code, _)| *code == issue.code) {
                Some((_, list)) => list.push(issue),
                None => by_code.push((issue.code, vec![issue])),
            }
        }

        for (code, issues) in &by_code {
            let label = match issues[0].severity {
                Severity::Error => format!("❌ {}", code).bright_red(),
                Severity::Warning => format!("⚠️  {}", code).bright_yellow(),
            };
            println!("{} ({})", label, issues.len());
            for issue in issues.iter().take(limit) {
                println!("    {}: {}", issue.entity.to_string().dimmed(), issue.message);
            }
            if issues.len() > limit {
                println!("    … {} more", issues.len() - limit);
            }
        }

        println!("{}", "-".repeat(50).bright_cyan());
        let verdict = if self.pass {
            "PASS".bright_green().bold()
        } else {
            "FAIL".bright_red().bold()
        };
        println!(
            "{}: {} ({} errors, {} warnings)",
            "Result".bright_white().bold(),
            verdict,
            self.errors().count(),
            self.warnings().count()
        );
        println!();
    }
}

/// Run every check over the derived tables.
pub fn validate(tables: &DerivedTables) -> ValidationReport {
    let matcher = PartyMatcher::new(&tables.parties);
    let mut issues = Vec::new();

    // A) Party table integrity
    issues.extend(check_party_table(tables));

    // B) Identity uniqueness
    issues.extend(check_unique_keys(tables));

    // C) Geography and party references
    issues.extend(check_geography(tables));
    issues.extend(check_party_references(tables));
    issues.extend(check_party_coverage(tables));
    issues.extend(check_citizenship_coverage(tables));

    // D) Constituency invariants
    for profile in &tables.constituencies {
        issues.extend(constituencies::check_profile(profile, &matcher));
    }

    // E) Candidate flags, tags and implications
    let seats = constituencies::SeatLookup::new(&tables.constituencies);
    for candidate in &tables.fptp_candidates {
        issues.extend(candidates::check_fptp(candidate, &matcher));
        issues.extend(candidates::check_fptp_winners(candidate, &seats, &matcher));
    }
    for candidate in &tables.pr_candidates {
        issues.extend(candidates::check_pr(candidate));
        issues.extend(candidates::check_pr_winners(candidate, &seats, &matcher));
    }

    sort_issues_stably(&mut issues);
    ValidationReport {
        pass: !issues.iter().any(|i| i.severity == Severity::Error),
        issues,
    }
}

fn sort_issues_stably(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        (a.severity, a.code, &a.entity, &a.message).cmp(&(b.severity, b.code, &b.entity, &b.message))
    });
}

fn check_party_table(tables: &DerivedTables) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for party in &tables.parties {
        let entity = EntityRef::Party(party.party_id);
        if !ids.insert(party.party_id) {
            issues.push(Issue::error("Party.DuplicateId", entity.clone(), "party_id is not unique"));
        }
        let name = &party.current_party_name;
        if name.trim().is_empty() {
            issues.push(Issue::error("Party.EmptyName", entity.clone(), "current_party_name is empty"));
        } else if clean_text(name) != *name {
            issues.push(Issue::error(
                "Party.UncleanName",
                entity.clone(),
                format!("{:?} has padding or repeated spaces", name),
            ));
        }
        if !names.insert(clean_text(name)) {
            issues.push(Issue::error(
                "Party.DuplicateName",
                entity.clone(),
                format!("{:?} is not unique", name),
            ));
        }
        if let Some(order) = party.party_display_order.filter(|o| *o < 0) {
            issues.push(Issue::error(
                "Party.NegativeDisplayOrder",
                entity,
                format!("display order {} is negative", order),
            ));
        }
    }
    issues
}

fn check_unique_keys(tables: &DerivedTables) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut fptp_ids = HashSet::new();
    for c in &tables.fptp_candidates {
        if !fptp_ids.insert(c.candidate_id) {
            issues.push(Issue::error(
                "Candidate.DuplicateId",
                EntityRef::FptpCandidate(c.candidate_id),
                "candidate_id appears more than once",
            ));
        }
    }
    let mut pr_keys = HashSet::new();
    for c in &tables.pr_candidates {
        let party = clean_text(&c.political_party_name);
        if !pr_keys.insert((party.clone(), c.serial_no)) {
            issues.push(Issue::error(
                "Candidate.DuplicateSerial",
                EntityRef::PrCandidate {
                    party,
                    serial_no: c.serial_no,
                },
                "serial_no appears more than once in the party list",
            ));
        }
    }
    issues
}

fn check_geography(tables: &DerivedTables) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut contested: HashMap<ConstituencyKey, usize> =
        tables.constituencies.iter().map(|p| (p.key(), 0)).collect();
    for c in &tables.fptp_candidates {
        match contested.get_mut(&c.key()) {
            Some(count) => *count += 1,
            None => issues.push(Issue::error(
                "Candidate.UnknownConstituency",
                EntityRef::FptpCandidate(c.candidate_id),
                format!("{} is not in the constituency table", c.key()),
            )),
        }
    }
    for (key, count) in contested {
        if count == 0 {
            issues.push(Issue::error(
                "Constituency.NoCandidates",
                EntityRef::Constituency(key),
                "no current FPTP candidate",
            ));
        }
    }
    issues
}

fn check_party_references(tables: &DerivedTables) -> Vec<Issue> {
    let known: HashSet<i64> = tables.parties.iter().map(|p| p.party_id).collect();
    let fptp = tables.fptp_candidates.iter().filter_map(|c| {
        c.party_id
            .filter(|id| !known.contains(id))
            .map(|id| (EntityRef::FptpCandidate(c.candidate_id), id))
    });
    let pr = tables.pr_candidates.iter().filter_map(|c| {
        c.party_id.filter(|id| !known.contains(id)).map(|id| {
            (
                EntityRef::PrCandidate {
                    party: clean_text(&c.political_party_name),
                    serial_no: c.serial_no,
                },
                id,
            )
        })
    });
    fptp.chain(pr)
        .map(|(entity, id)| {
            Issue::error(
                "Party.UnknownId",
                entity,
                format!("party_id {} is not in the party table", id),
            )
        })
        .collect()
}

fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}

fn check_party_coverage(tables: &DerivedTables) -> Vec<Issue> {
    let mut issues = Vec::new();
    let fptp = share(
        tables.fptp_candidates.iter().filter(|c| c.party_id.is_some()).count(),
        tables.fptp_candidates.len(),
    );
    if fptp < FPTP_PARTY_COVERAGE {
        issues.push(Issue::error(
            "Party.FptpCoverage",
            EntityRef::Dataset,
            format!(
                "{:.1}% of FPTP candidates have a party_id, below {:.0}%",
                fptp * 100.0,
                FPTP_PARTY_COVERAGE * 100.0
            ),
        ));
    }
    let pr = share(
        tables.pr_candidates.iter().filter(|c| c.party_id.is_some()).count(),
        tables.pr_candidates.len(),
    );
    if pr < PR_PARTY_COVERAGE {
        issues.push(Issue::error(
            "Party.PrCoverage",
            EntityRef::Dataset,
            format!(
                "{:.1}% of PR candidates have a party_id, below {:.0}%",
                pr * 100.0,
                PR_PARTY_COVERAGE * 100.0
            ),
        ));
    }
    issues
}

fn check_citizenship_coverage(tables: &DerivedTables) -> Vec<Issue> {
    let missing = tables
        .fptp_candidates
        .iter()
        .filter(|c| c.citizenship_district.as_deref().map_or(true, |d| d.trim().is_empty()))
        .count();
    let ratio = share(missing, tables.fptp_candidates.len());
    if !tables.fptp_candidates.is_empty() && ratio > MISSING_CITIZENSHIP_WARNING {
        vec![Issue::warning(
            "Candidate.MissingCitizenship",
            EntityRef::Dataset,
            format!(
                "{} of {} FPTP candidates ({:.1}%) have no citizenship district",
                missing,
                tables.fptp_candidates.len(),
                ratio * 100.0
            ),
        )]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::party::Party;

    #[test]
    fn empty_tables_pass() {
        let report = validate(&DerivedTables::default());
        assert!(report.pass);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn party_table_integrity_is_checked() {
        let mut padded = Party::new(1, " X  Y".to_string());
        padded.party_display_order = Some(-1);
        let tables = DerivedTables {
            parties: vec![padded, Party::new(1, "Z".to_string()), Party::new(2, "Z".to_string())],
            ..DerivedTables::default()
        };
        let report = validate(&tables);
        assert!(!report.pass);
        for code in [
            "Party.UncleanName",
            "Party.NegativeDisplayOrder",
            "Party.DuplicateId",
            "Party.DuplicateName",
        ] {
            assert!(report.has_code(code), "missing {}", code);
        }
    }

    #[test]
    fn issues_are_sorted_errors_first() {
        let mut issues = vec![
            Issue::warning("B.Warn", EntityRef::Dataset, "w"),
            Issue::error("Z.Err", EntityRef::Party(2), "z"),
            Issue::error("A.Err", EntityRef::Party(1), "a"),
        ];
        sort_issues_stably(&mut issues);
        let codes: Vec<_> = issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec!["A.Err", "Z.Err", "B.Warn"]);
    }

    #[test]
    fn coverage_thresholds() {
        assert_eq!(share(0, 0), 1.0);
        assert!(share(59, 100) < FPTP_PARTY_COVERAGE);
        assert!(share(95, 100) >= PR_PARTY_COVERAGE);
    }
}
