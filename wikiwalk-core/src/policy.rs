use crate::embedding::EmbeddingTable;
use crate::links::CandidateMap;
use crate::report::UnreachableReason;
use crate::score::{score_label, target_indices, target_tokens};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Random,
    Semantic,
}

impl Strategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "random" | "1" => Some(Strategy::Random),
            "semantic" | "nlp" | "2" => Some(Strategy::Semantic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Random => "random",
            Strategy::Semantic => "semantic",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chooses the next locator among a page's candidates.
pub trait SelectionPolicy {
    fn strategy(&self) -> Strategy;

    /// Called once per walk before any page is fetched. An error ends the walk as unreachable.
    fn prepare(&mut self, _target: &str) -> Result<(), UnreachableReason> {
        Ok(())
    }

    /// `None` only when `candidates` is empty.
    fn select(&mut self, candidates: &CandidateMap) -> Option<String>;
}

/// Picks any candidate with equal probability.
pub struct UniformRandomPolicy {
    rng: StdRng,
}

impl UniformRandomPolicy {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible walks for a fixed link graph.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformRandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionPolicy for UniformRandomPolicy {
    fn strategy(&self) -> Strategy {
        Strategy::Random
    }

    fn select(&mut self, candidates: &CandidateMap) -> Option<String> {
        let locators: Vec<&str> = candidates.locators().collect();
        locators.choose(&mut self.rng).map(|locator| locator.to_string())
    }
}

/// Greedily follows the link whose label is closest to the target's words.
pub struct MaxSimilarityPolicy {
    table: Arc<EmbeddingTable>,
    targets: Vec<usize>,
}

impl MaxSimilarityPolicy {
    pub fn new(table: Arc<EmbeddingTable>) -> Self {
        Self {
            table,
            targets: Vec::new(),
        }
    }

    /// Rows of the target's words found by the last `prepare`.
    pub fn target_rows(&self) -> &[usize] {
        &self.targets
    }
}

impl SelectionPolicy for MaxSimilarityPolicy {
    fn strategy(&self) -> Strategy {
        Strategy::Semantic
    }

    fn prepare(&mut self, target: &str) -> Result<(), UnreachableReason> {
        let tokens = target_tokens(target);
        self.targets = target_indices(&tokens, &self.table);

        for token in &tokens {
            if let Some(row) = self.table.index_of(token) {
                info!("found {} in model at index {}", token, row);
            }
        }

        if self.targets.is_empty() {
            return Err(UnreachableReason::ModelIncompatible);
        }
        Ok(())
    }

    fn select(&mut self, candidates: &CandidateMap) -> Option<String> {
        let mut best_link = candidates.locators().next()?;
        let mut best_score = 0.0;

        for (locator, label) in candidates.iter() {
            let score = score_label(label, &self.targets, &self.table);
            debug!("{:.4} {} ({:?})", score, locator, label);
            // strictly greater: ties keep the earlier candidate
            if score > best_score {
                best_score = score;
                best_link = locator;
            }
        }

        Some(best_link.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Cursor;

    fn table() -> Arc<EmbeddingTable> {
        let text = "4 2\ndog 1.0 0.1\npuppy 0.9 0.2\ncar 0.0 1.0\nanti -1.0 0.0\n";
        Arc::new(EmbeddingTable::from_reader(Cursor::new(text)).unwrap())
    }

    fn candidates(entries: &[(&str, &str)]) -> CandidateMap {
        let mut map = CandidateMap::new();
        for (locator, label) in entries {
            map.insert(locator.to_string(), label.to_string());
        }
        map
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(Strategy::from_str("random"), Some(Strategy::Random));
        assert_eq!(Strategy::from_str("1"), Some(Strategy::Random));
        assert_eq!(Strategy::from_str(" Semantic "), Some(Strategy::Semantic));
        assert_eq!(Strategy::from_str("2"), Some(Strategy::Semantic));
        assert_eq!(Strategy::from_str("3"), None);
    }

    #[test]
    fn test_random_on_empty_is_none() {
        let mut policy = UniformRandomPolicy::seeded(7);
        assert_eq!(policy.select(&CandidateMap::new()), None);
    }

    #[test]
    fn test_random_picks_a_candidate() {
        let map = candidates(&[("a", "a"), ("b", "b"), ("c", "c")]);
        let mut policy = UniformRandomPolicy::seeded(7);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let choice = policy.select(&map).unwrap();
            assert!(map.contains(&choice));
            seen.insert(choice);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_random_is_reproducible_with_seed() {
        let map = candidates(&[("a", ""), ("b", ""), ("c", ""), ("d", "")]);
        let mut first = UniformRandomPolicy::seeded(42);
        let mut second = UniformRandomPolicy::seeded(42);
        for _ in 0..20 {
            assert_eq!(first.select(&map), second.select(&map));
        }
    }

    #[test]
    fn test_prepare_rejects_unknown_target() {
        let mut policy = MaxSimilarityPolicy::new(table());
        assert_eq!(
            policy.prepare("https://en.wikipedia.org/wiki/Zeppelin_Blimp"),
            Err(UnreachableReason::ModelIncompatible)
        );
    }

    #[test]
    fn test_prepare_collects_known_target_words() {
        let mut policy = MaxSimilarityPolicy::new(table());
        policy
            .prepare("https://en.wikipedia.org/wiki/Zeppelin_Dog")
            .unwrap();
        assert_eq!(policy.target_rows(), &[0]);
    }

    #[test]
    fn test_prepare_accepts_percent_encoded_target() {
        let text = "2 2\nzürich 1.0 0.0\nlake 0.5 0.5\n";
        let table = Arc::new(EmbeddingTable::from_reader(Cursor::new(text)).unwrap());
        let mut policy = MaxSimilarityPolicy::new(table);

        assert_eq!(policy.prepare("https://en.wikipedia.org/wiki/Z%C3%BCrich"), Ok(()));
        assert_eq!(policy.target_rows(), &[0]);
    }

    #[test]
    fn test_semantic_picks_highest_score() {
        let mut policy = MaxSimilarityPolicy::new(table());
        policy.prepare("https://en.wikipedia.org/wiki/Dog").unwrap();

        let map = candidates(&[("x/car", "car"), ("x/puppy", "puppy"), ("x/unknown", "zeppelin")]);
        assert_eq!(policy.select(&map).as_deref(), Some("x/puppy"));
    }

    #[test]
    fn test_semantic_defaults_to_first_when_nothing_scores_above_zero() {
        let mut policy = MaxSimilarityPolicy::new(table());
        policy.prepare("https://en.wikipedia.org/wiki/Dog").unwrap();

        let map = candidates(&[("x/unknown", "zeppelin"), ("x/anti", "anti"), ("x/other", "blimp")]);
        assert_eq!(policy.select(&map).as_deref(), Some("x/unknown"));
    }

    #[test]
    fn test_semantic_ties_keep_first() {
        let mut policy = MaxSimilarityPolicy::new(table());
        policy.prepare("https://en.wikipedia.org/wiki/Dog").unwrap();

        let map = candidates(&[("x/first", "car"), ("x/second", "car")]);
        assert_eq!(policy.select(&map).as_deref(), Some("x/first"));
    }

    #[test]
    fn test_semantic_on_empty_is_none() {
        let mut policy = MaxSimilarityPolicy::new(table());
        policy.prepare("https://en.wikipedia.org/wiki/Dog").unwrap();
        assert_eq!(policy.select(&CandidateMap::new()), None);
    }
}
