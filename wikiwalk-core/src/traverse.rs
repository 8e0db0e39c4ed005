use crate::error::{Result, WalkError};
use crate::links::extract_links;
use crate::policy::SelectionPolicy;
use crate::report::{Budget, WalkOutcome, WalkReport};
use crate::site::{Site, VisitedSet, normalize_locator};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wikiwalk_scanner::{Anchor, PageSource};

pub const DEFAULT_MAX_STEPS: usize = 500;

/// Called with `(step, locator)` each time the walk commits to its next page.
pub type StepCallback = Arc<dyn Fn(usize, &str) + Send + Sync>;

/// Limits and policies for a single walk.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Hops allowed before the walk gives up.
    pub max_steps: usize,
    /// Optional wall-clock limit for the whole walk.
    pub max_duration: Option<Duration>,
    /// Extra attempts after a failed fetch.
    pub fetch_retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub retry_backoff: Duration,
    /// Refuse start/target pages that are not articles instead of only warning.
    pub strict_locators: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_duration: None,
            fetch_retries: 2,
            retry_backoff: Duration::from_millis(500),
            strict_locators: true,
        }
    }
}

/// Walks the link graph from a start page towards a target page.
///
/// Generic over where pages come from and over how the next hop is chosen.
pub struct Navigator<S, P> {
    source: S,
    policy: P,
    site: Site,
    config: WalkConfig,
    step_callback: Option<StepCallback>,
}

impl<S: PageSource, P: SelectionPolicy> Navigator<S, P> {
    pub fn new(source: S, policy: P) -> Self {
        Self {
            source,
            policy,
            site: Site::default(),
            config: WalkConfig::default(),
            step_callback: None,
        }
    }

    pub fn with_site(mut self, site: Site) -> Self {
        self.site = site;
        self
    }

    pub fn with_config(mut self, config: WalkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_step_callback(mut self, callback: StepCallback) -> Self {
        self.step_callback = Some(callback);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Play one game from `start` to `target`.
    ///
    /// Running out of model vocabulary or budget is reported through the returned outcome;
    /// only bad locators and fetch failures are errors.
    pub async fn walk(&mut self, start: &str, target: &str) -> Result<WalkReport> {
        let started = Instant::now();
        let start = self.check_locator("start", start)?;
        let target = self.check_locator("target", target)?;

        let mut path = Vec::new();
        let mut fetches = 0;

        let outcome = 'walk: {
            if let Err(reason) = self.policy.prepare(&target) {
                info!(
                    "Unfortunately, your target page is not compatible with the model: {}",
                    reason
                );
                break 'walk WalkOutcome::Unreachable { reason };
            }

            if start == target {
                info!("Start and target were the same page.");
                break 'walk WalkOutcome::Found { steps: 0 };
            }

            info!("Starting {} traversal -----", self.policy.strategy());
            info!("Start page: {}", start);
            info!("Target page: {}", target);

            let mut visited = VisitedSet::new();
            let mut steps = 0;
            let mut current = start.clone();
            visited.insert(current.clone());

            loop {
                let anchors = self.fetch_with_retry(&current).await?;
                fetches += 1;
                path.push(current.clone());

                let candidates =
                    extract_links(&self.site, self.site.base_url(), &anchors, &visited);
                debug!(
                    "{} anchors, {} candidates on {}",
                    anchors.len(),
                    candidates.len(),
                    current
                );

                if candidates.contains(&target) {
                    info!("Success! Found your target page in {} steps", steps);
                    path.push(target.clone());
                    break 'walk WalkOutcome::Found { steps };
                }

                if steps >= self.config.max_steps {
                    warn!("Step budget of {} exhausted", self.config.max_steps);
                    break 'walk WalkOutcome::Exhausted {
                        steps,
                        budget: Budget::Steps,
                    };
                }
                if let Some(limit) = self
                    .config
                    .max_duration
                    .filter(|limit| started.elapsed() >= *limit)
                {
                    warn!("Time budget of {:?} exhausted", limit);
                    break 'walk WalkOutcome::Exhausted {
                        steps,
                        budget: Budget::Time,
                    };
                }

                let next = match self.policy.select(&candidates) {
                    Some(next) => next,
                    None => {
                        info!("You've reached a dead end. Picking a random wiki link to re-route.");
                        self.site.fallback().to_string()
                    }
                };

                info!("{}", next);
                visited.insert(next.clone());
                steps += 1;
                if let Some(ref callback) = self.step_callback {
                    callback(steps, &next);
                }
                current = next;
            }
        };

        Ok(WalkReport {
            strategy: self.policy.strategy(),
            start,
            target,
            outcome,
            path,
            fetches,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn check_locator(&self, role: &'static str, raw: &str) -> Result<String> {
        let locator = normalize_locator(raw).unwrap_or_else(|| raw.trim().to_string());

        if !self.site.is_valid(&locator, None) {
            if self.config.strict_locators {
                return Err(WalkError::InvalidLocator { role, locator });
            }
            warn!(
                "Provided {} page is not compatible with the wiki game: {}",
                role, locator
            );
        }

        Ok(locator)
    }

    async fn fetch_with_retry(&self, locator: &str) -> Result<Vec<Anchor>> {
        let mut attempts = 0;
        let mut backoff = self.config.retry_backoff;

        loop {
            attempts += 1;
            match self.source.fetch_anchors(locator).await {
                Ok(anchors) => return Ok(anchors),
                Err(e) if attempts <= self.config.fetch_retries => {
                    warn!(
                        "Fetch of {} failed ({}), retry {}/{} in {:?}",
                        locator, e, attempts, self.config.fetch_retries, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(source) => {
                    return Err(WalkError::Fetch {
                        locator: locator.to_string(),
                        attempts,
                        source,
                    });
                }
            }
        }
    }
}
