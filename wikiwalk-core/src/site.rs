use crate::error::{Result, WalkError};
use std::collections::HashSet;
use url::Url;

pub const WIKIPEDIA_PREFIX: &str = "https://en.wikipedia.org/wiki/";

/// Substrings that mark a locator as outside the article namespace.
///
/// Matching is by plain substring anywhere in the locator, so an article whose title merely
/// contains one of these (say `Portal:` inside a longer title) is rejected as well.
pub const EXCLUDED_NAMESPACES: [&str; 13] = [
    "Special:",
    "File:",
    "Category:",
    "MOS:",
    "Portal:",
    "Wikipedia:",
    "Help:",
    "Talk:",
    "Wikipedia_talk:",
    "Template:",
    "Template_talk:",
    "Main_Page",
    "User:",
];

/// Locators already walked to during one run.
pub type VisitedSet = HashSet<String>;

/// The wiki being played on: its canonical article prefix and its random-page escape hatch.
#[derive(Debug, Clone)]
pub struct Site {
    prefix: String,
    base_url: Url,
    fallback: String,
}

impl Site {
    /// Site rooted at the article prefix `prefix`.
    ///
    /// The prefix is normalized the same way start and target locators are, and its path always
    /// ends in `/`, so `https://en.wikipedia.org/wiki` and `HTTPS://EN.WIKIPEDIA.ORG/wiki/` both
    /// name the English Wikipedia article space.
    pub fn new(prefix: &str) -> Result<Self> {
        let mut base_url = Url::parse(prefix.trim())
            .map_err(|e| WalkError::InvalidSite(format!("{}: {}", prefix, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(WalkError::InvalidSite(prefix.to_string()));
        }
        base_url.set_query(None);
        base_url.set_fragment(None);
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let prefix = base_url.to_string();
        Ok(Self {
            fallback: format!("{}Special:Random", prefix),
            prefix,
            base_url,
        })
    }

    pub fn wikipedia() -> Self {
        Self::new(WIKIPEDIA_PREFIX).expect("built-in prefix is a valid URL")
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Base that relative hrefs are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Locator that always lands on some article, used to climb out of dead ends.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Whether `locator` is an article the walk may move to.
    ///
    /// `visited` is optional so the same check can vet start and target before a run begins.
    pub fn is_valid(&self, locator: &str, visited: Option<&VisitedSet>) -> bool {
        if !locator.contains(&self.prefix) {
            return false;
        }
        if locator == self.prefix {
            return false;
        }
        if visited.is_some_and(|visited| visited.contains(locator)) {
            return false;
        }
        !EXCLUDED_NAMESPACES
            .iter()
            .any(|excluded| locator.contains(excluded))
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::wikipedia()
    }
}

/// Canonical absolute form of a user-supplied locator, or `None` if it is not a URL at all.
pub fn normalize_locator(raw: &str) -> Option<String> {
    Url::parse(raw.trim()).ok().map(|url| url.to_string())
}
