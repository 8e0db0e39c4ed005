use crate::site::{Site, VisitedSet};
use std::collections::HashMap;
use tracing::debug;
use url::Url;
use wikiwalk_scanner::Anchor;

/// Separator between the words of a label or article title.
pub const LABEL_DELIMITER: char = '_';

/// Normalize anchor text (or a locator) for scoring: parentheses dropped, lower-cased, trimmed.
pub fn clean_label(text: &str) -> String {
    text.replace(['(', ')'], "").to_lowercase().trim().to_string()
}

/// Eligible outbound links of one page, keyed by resolved locator.
///
/// Iteration follows first-insertion order; re-inserting a locator replaces its label but keeps
/// its position.
#[derive(Debug, Clone, Default)]
pub struct CandidateMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl CandidateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: String, label: String) {
        match self.index.get(&locator) {
            Some(&position) => self.entries[position].1 = label,
            None => {
                self.index.insert(locator.clone(), self.entries.len());
                self.entries.push((locator, label));
            }
        }
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.index.contains_key(locator)
    }

    pub fn label(&self, locator: &str) -> Option<&str> {
        self.index
            .get(locator)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(locator, label)` pairs in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(locator, label)| (locator.as_str(), label.as_str()))
    }

    pub fn locators(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(locator, _)| locator.as_str())
    }
}

/// Resolve every anchor against `base` and keep the ones `site` accepts as unvisited articles.
pub fn extract_links(site: &Site, base: &Url, anchors: &[Anchor], visited: &VisitedSet) -> CandidateMap {
    let mut candidates = CandidateMap::new();

    for anchor in anchors {
        let Ok(resolved) = base.join(&anchor.href) else {
            debug!("Unresolvable href {:?}", anchor.href);
            continue;
        };
        let locator = resolved.to_string();

        if site.is_valid(&locator, Some(visited)) {
            candidates.insert(locator, clean_label(&anchor.text));
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::WIKIPEDIA_PREFIX;

    fn extract(anchors: &[Anchor], visited: &VisitedSet) -> CandidateMap {
        let site = Site::wikipedia();
        extract_links(&site, site.base_url(), anchors, visited)
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label("  Dog (Animal) "), "dog animal");
        assert_eq!(clean_label("Domestic_Dog"), "domestic_dog");
        assert_eq!(clean_label("()"), "");
        assert_eq!(
            clean_label("https://en.wikipedia.org/wiki/Python_(Language)"),
            "https://en.wikipedia.org/wiki/python_language"
        );
    }

    #[test]
    fn test_resolves_relative_hrefs() {
        let anchors = vec![
            Anchor::new("/wiki/Dog", "Dog"),
            Anchor::new("Wolf", "Wolf"),
            Anchor::new("//en.wikipedia.org/wiki/Fox", "Fox"),
            Anchor::new("https://en.wikipedia.org/wiki/Otter", "Otter"),
        ];

        let candidates = extract(&anchors, &VisitedSet::new());

        let locators: Vec<&str> = candidates.locators().collect();
        assert_eq!(
            locators,
            vec![
                "https://en.wikipedia.org/wiki/Dog",
                "https://en.wikipedia.org/wiki/Wolf",
                "https://en.wikipedia.org/wiki/Fox",
                "https://en.wikipedia.org/wiki/Otter",
            ]
        );
        assert_eq!(candidates.label("https://en.wikipedia.org/wiki/Dog"), Some("dog"));
    }

    #[test]
    fn test_filters_ineligible_links() {
        let anchors = vec![
            Anchor::new("/wiki/Special:Random", "Random article"),
            Anchor::new("/wiki/Category:Dogs", "Dogs"),
            Anchor::new("/wiki/Main_Page", "Main page"),
            Anchor::new("/w/index.php?title=Dog&action=edit", "edit"),
            Anchor::new("https://www.wikidata.org/wiki/Q144", "Wikidata"),
            Anchor::new("", "self"),
            Anchor::new("/wiki/", "root"),
            Anchor::new("/wiki/Puppy", "Puppy"),
        ];

        let candidates = extract(&anchors, &VisitedSet::new());

        assert_eq!(candidates.len(), 1);
        assert!(candidates.contains("https://en.wikipedia.org/wiki/Puppy"));
    }

    #[test]
    fn test_later_anchor_label_wins() {
        let anchors = vec![
            Anchor::new("/wiki/Dog", "Dog"),
            Anchor::new("/wiki/Cat", "Cat"),
            Anchor::new("https://en.wikipedia.org/wiki/Dog", "Domestic (dog)"),
        ];

        let candidates = extract(&anchors, &VisitedSet::new());

        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates.label("https://en.wikipedia.org/wiki/Dog"),
            Some("domestic dog")
        );
        // overwritten entry keeps its original position
        assert_eq!(
            candidates.locators().next(),
            Some("https://en.wikipedia.org/wiki/Dog")
        );
    }

    #[test]
    fn test_visited_links_are_dropped() {
        let mut visited = VisitedSet::new();
        visited.insert(format!("{}Dog", WIKIPEDIA_PREFIX));

        let anchors = vec![Anchor::new("/wiki/Dog", "Dog"), Anchor::new("/wiki/Cat", "Cat")];
        let candidates = extract(&anchors, &visited);

        assert!(!candidates.contains("https://en.wikipedia.org/wiki/Dog"));
        assert!(candidates.contains("https://en.wikipedia.org/wiki/Cat"));
    }

    #[test]
    fn test_no_anchors_is_empty() {
        assert!(extract(&[], &VisitedSet::new()).is_empty());
    }
}
