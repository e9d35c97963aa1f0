//! Fuzzy matching of extracted items against the drug catalog.

pub mod similarity;

pub use similarity::{IndelRatio, SimilarityScorer};

use tracing::debug;

use crate::models::config::MatchingConfig;
use crate::models::invoice::{CatalogEntry, MatchStatus};

/// Result of matching one item against a catalog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    /// MATCHED, PARTIAL_MATCH or UNMATCHED.
    pub status: MatchStatus,
    /// Best drug. Kept as a suggestion for PARTIAL_MATCH, cleared for UNMATCHED.
    pub drug_id: Option<i64>,
    /// Best score, 0-100.
    pub confidence: u8,
}

/// Scores items against catalog entries and classifies the best score.
pub struct CatalogMatcher<S = IndelRatio> {
    scorer: S,
    config: MatchingConfig,
}

impl CatalogMatcher<IndelRatio> {
    pub fn new(config: MatchingConfig) -> Self {
        Self::with_scorer(IndelRatio, config)
    }
}

impl Default for CatalogMatcher<IndelRatio> {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl<S: SimilarityScorer> CatalogMatcher<S> {
    pub fn with_scorer(scorer: S, config: MatchingConfig) -> Self {
        Self { scorer, config }
    }

    /// Match an item against the catalog. Ties go to the earliest entry.
    pub fn match_item(&self, name: &str, brand: Option<&str>, catalog: &[CatalogEntry]) -> MatchOutcome {
        let mut best: Option<(i64, u8)> = None;

        for entry in catalog {
            let score = self.score(name, brand, entry);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((entry.id, score));
            }
        }

        let (drug_id, confidence) = match best {
            Some((id, score)) => (Some(id), score),
            None => (None, 0),
        };
        let status = self.classify(confidence);

        debug!(
            "Matched '{}' -> {:?} ({}, confidence {})",
            name, drug_id, status, confidence
        );

        MatchOutcome {
            status,
            drug_id: if status == MatchStatus::Unmatched { None } else { drug_id },
            confidence,
        }
    }

    /// Best pairwise similarity between the item's and the drug's search strings,
    /// plus the brand bonus when both brands are present and equal.
    pub fn score(&self, name: &str, brand: Option<&str>, entry: &CatalogEntry) -> u8 {
        let item_strings = search_strings(name, brand);
        let drug_strings = search_strings(&entry.name, entry.brand.as_deref());

        let mut best = 0u8;
        for a in &item_strings {
            for b in &drug_strings {
                best = best.max(self.scorer.ratio(a, b));
            }
        }

        let brands_equal = match (normalized(brand), normalized(entry.brand.as_deref())) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        if brands_equal {
            best = best.saturating_add(self.config.brand_bonus).min(100);
        }

        best
    }

    /// Map a score onto a match status using the configured thresholds.
    pub fn classify(&self, score: u8) -> MatchStatus {
        if score >= self.config.matched_threshold {
            MatchStatus::Matched
        } else if score >= self.config.partial_threshold {
            MatchStatus::PartialMatch
        } else {
            MatchStatus::Unmatched
        }
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Lowercased name, brand, and both orderings of name and brand.
fn search_strings(name: &str, brand: Option<&str>) -> Vec<String> {
    let name = name.trim().to_lowercase();
    let mut strings = vec![name.clone()];

    if let Some(brand) = normalized(brand) {
        strings.push(format!("{} {}", name, brand));
        strings.push(format!("{} {}", brand, name));
        strings.push(brand);
    }

    strings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Scores every pair the same.
    struct Fixed(u8);

    impl SimilarityScorer for Fixed {
        fn ratio(&self, _a: &str, _b: &str) -> u8 {
            self.0
        }
    }

    fn fixed(score: u8) -> CatalogMatcher<Fixed> {
        CatalogMatcher::with_scorer(Fixed(score), MatchingConfig::default())
    }

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new(1, "Paracetamol", Some("Panadol")),
            CatalogEntry::new(2, "Amoxicillin", Some("AmoxiPlus")),
            CatalogEntry::new(3, "Ibuprofen", None),
        ]
    }

    #[test]
    fn test_threshold_boundaries() {
        let entry = [CatalogEntry::new(7, "Anything", None)];
        let status = |score| fixed(score).match_item("x", None, &entry).status;

        assert_eq!(status(70), MatchStatus::Matched);
        assert_eq!(status(69), MatchStatus::PartialMatch);
        assert_eq!(status(50), MatchStatus::PartialMatch);
        assert_eq!(status(49), MatchStatus::Unmatched);
    }

    #[test]
    fn test_brand_bonus_is_added_and_capped() {
        let entry = CatalogEntry::new(2, "Amoxicillin", Some("AmoxiPlus"));

        assert_eq!(fixed(55).score("Amoxil", Some("amoxiplus"), &entry), 75);
        assert_eq!(fixed(55).score("Amoxil", Some("Other"), &entry), 55);
        assert_eq!(fixed(55).score("Amoxil", None, &entry), 55);
        assert_eq!(fixed(95).score("Amoxil", Some("AMOXIPLUS"), &entry), 100);
    }

    #[test]
    fn test_exact_name_matches() {
        let matcher = CatalogMatcher::default();
        assert_eq!(
            matcher.match_item("Amoxicillin", Some("AmoxiPlus"), &catalog()),
            MatchOutcome {
                status: MatchStatus::Matched,
                drug_id: Some(2),
                confidence: 100,
            }
        );
    }

    #[test]
    fn test_brand_only_item_finds_drug() {
        let matcher = CatalogMatcher::default();
        let outcome = matcher.match_item("Panadol", None, &catalog());
        assert_eq!(outcome.drug_id, Some(1));
        assert_eq!(outcome.status, MatchStatus::Matched);
    }

    #[test]
    fn test_partial_match_keeps_suggestion() {
        let outcome = fixed(60).match_item("x", None, &catalog());
        assert_eq!(outcome.status, MatchStatus::PartialMatch);
        // all entries tie, so the first one wins
        assert_eq!(outcome.drug_id, Some(1));
    }

    #[test]
    fn test_unmatched_and_empty_catalog() {
        let matcher = CatalogMatcher::default();
        let outcome = matcher.match_item("Zzzzzz", None, &catalog());
        assert_eq!(outcome.status, MatchStatus::Unmatched);
        assert_eq!(outcome.drug_id, None);

        assert_eq!(
            matcher.match_item("Paracetamol", None, &[]),
            MatchOutcome {
                status: MatchStatus::Unmatched,
                drug_id: None,
                confidence: 0,
            }
        );
    }
}
