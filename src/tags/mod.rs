//! Tag derivation engine.
//!
//! Every function here is pure: it reads a joined candidate or constituency
//! record and returns flags plus a tag list in vocabulary order. Nothing in
//! this module touches the database or the network.

pub mod constituency;
pub mod fptp;
pub mod merger;
pub mod pr;

pub use merger::PartyMatcher;

/// FPTP tags in canonical output order.
pub const FPTP_VOCABULARY: &[&str] = &[
    "tourist",
    "chheparo",
    "vaguwa-won",
    "vaguwa",
    "new-candidate",
    "educated",
    "uneducated",
    "new-party",
    "gen-z",
    "grandpa",
    "influential",
    "opportunist",
    "split-vote",
    "proportional-veteran",
    "loyal",
    "nepo",
    "budi-bokuwa",
    "budo-bokuwa",
    "purba-padadhikari",
];

/// PR tags in canonical output order.
pub const PR_VOCABULARY: &[&str] = &[
    "chheparo",
    "new-candidate",
    "party-loyal",
    "top-rank",
    "high-rank",
    "women",
    "inclusive-group",
    "disability",
    "backward-area",
    "new-party",
    "fptp-veteran",
    "proportional-veteran",
    "opportunist",
    "improving-party",
    "declining-party",
    "pani-maruwa",
    "gati-xada",
    "hutihara",
    "budi-bokuwa",
    "budo-bokuwa",
];

pub const GEN_Z_MAX_AGE: u32 = 27;
pub const GRANDPA_MIN_AGE: u32 = 60;
/// Winning margin share above which a 2079 winner counts as influential.
pub const INFLUENTIAL_MARGIN: f64 = 0.20;
/// Vote share below which a 2079 contestant only split the vote.
pub const SPLIT_VOTE_SHARE: f64 = 0.03;
/// Winning margin share above which a constituency result is a landslide.
pub const PAKAD_MARGIN: f64 = 0.15;
/// Minimum qualification scale that counts as educated (+2 / intermediate).
pub const EDUCATED_MIN_SCALE: u8 = 3;

/// Collects tags and emits them in vocabulary order regardless of the order
/// rules fire in.
pub(crate) struct TagSet {
    vocabulary: &'static [&'static str],
    present: Vec<bool>,
}

impl TagSet {
    pub(crate) fn new(vocabulary: &'static [&'static str]) -> Self {
        TagSet {
            vocabulary,
            present: vec![false; vocabulary.len()],
        }
    }

    pub(crate) fn set(&mut self, tag: &str, on: bool) {
        if !on {
            return;
        }
        if let Some(idx) = self.vocabulary.iter().position(|t| *t == tag) {
            self.present[idx] = true;
        } else {
            debug_assert!(false, "tag `{}` is not in the vocabulary", tag);
        }
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.vocabulary
            .iter()
            .zip(self.present)
            .filter(|(_, on)| *on)
            .map(|(tag, _)| tag.to_string())
            .collect()
    }
}
