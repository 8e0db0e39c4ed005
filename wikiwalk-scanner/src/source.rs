use crate::anchor::Anchor;
use crate::error::Result;
use std::future::Future;

/// Anything that can turn a locator into the anchors found on that page.
///
/// The traversal engine only ever talks to the graph through this trait, so a walk can run
/// against the live site ([`crate::WikiClient`]) or against a fixed in-memory link table.
pub trait PageSource {
    fn fetch_anchors(&self, locator: &str) -> impl Future<Output = Result<Vec<Anchor>>> + Send;
}
