//! Pagination driver - the main fetch/extract/write loop
//!
//! This module coordinates one scraping run:
//! - Pops the next page from the frontier
//! - Fetches it through the run's HTTP session
//! - Extracts products and hands them to the output sink
//! - Queues the next-page link (and in-scope links when following)
//! - Stops on the page limit, the time limit, or an empty frontier

use crate::config::{Config, ScraperConfig};
use crate::crawler::extractor::{CompiledRules, ListingPage, ProductRecord};
use crate::crawler::fetcher::{FetchedPage, HttpSession};
use crate::crawler::frontier::{Frontier, PageKind, QueuedUrl};
use crate::output::{RecordSink, RunSummary, StopReason};
use crate::url::LinkScope;
use crate::ScrapeError;
use rand::Rng;
use std::time::{Duration, Instant};
use url::Url;

/// Limits and pacing for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Maximum number of fetches issued
    pub page_limit: Option<u32>,

    /// No fetch starts once this much time has elapsed
    pub time_limit: Option<Duration>,

    /// Fixed pause between pages
    pub delay: Duration,

    /// Upper bound of the random extra pause
    pub delay_jitter: Duration,
}

impl RunLimits {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            page_limit: config.page_limit,
            time_limit: config.time_limit(),
            delay: config.delay(),
            delay_jitter: Duration::from_millis(config.delay_jitter_ms),
        }
    }
}

/// What came out of one fetched page
#[derive(Debug, Default)]
struct PageOutcome {
    records: Vec<ProductRecord>,
    skipped: u64,
    extracted: bool,
}

/// Drives a scraping run from the start URL until a stop condition is met
pub struct Paginator {
    session: HttpSession,
    rules: CompiledRules,
    scope: LinkScope,
    follow_links: bool,
    frontier: Frontier,
    limits: RunLimits,
}

impl Paginator {
    /// Creates a paginator for the given configuration
    ///
    /// Builds the HTTP session, compiles the extraction rules and seeds the
    /// frontier with the start URL.
    ///
    /// # Returns
    ///
    /// * `Ok(Paginator)` - Ready to run
    /// * `Err(ScrapeError)` - Invalid start URL, selector or pattern, or the
    ///   HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        let session = HttpSession::new(&config.scraper, &config.user_agent)?;
        let rules = CompiledRules::compile(&config.rules)?;
        let scope = LinkScope::from_rules(&config.rules.follow)?;

        let start_url = Url::parse(&config.scraper.start_url)?;
        let mut frontier = Frontier::new();
        frontier.push(start_url, PageKind::Start);

        Ok(Self {
            session,
            rules,
            scope,
            follow_links: config.rules.follow.enabled,
            frontier,
            limits: RunLimits::from_config(&config.scraper),
        })
    }

    /// Replaces the limits derived from the configuration
    pub fn with_limits(mut self, limits: RunLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &RunLimits {
        &self.limits
    }

    /// Runs the fetch/extract/write loop
    ///
    /// Records are written to `sink` page by page. A failed fetch is logged and
    /// skipped; a failed write aborts the run.
    pub async fn run(&mut self, sink: &mut dyn RecordSink) -> Result<RunSummary, ScrapeError> {
        let start = Instant::now();
        let deadline = self
            .limits
            .time_limit
            .and_then(|limit| start.checked_add(limit));

        let mut pages_fetched = 0u32;
        let mut pages_failed = 0u32;
        let mut pages_extracted = 0u32;
        let mut entries_skipped = 0u64;

        let stop_reason = loop {
            if self
                .limits
                .page_limit
                .is_some_and(|limit| pages_fetched >= limit)
            {
                break StopReason::PageLimit;
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break StopReason::TimeLimit;
            }

            let Some(queued) = self.frontier.pop() else {
                break StopReason::FrontierExhausted;
            };

            pages_fetched += 1;
            tracing::info!(
                "Fetching page {} ({:?}): {}",
                pages_fetched,
                queued.kind,
                queued.url
            );

            match self.session.fetch_page(&queued.url, deadline).await {
                Ok(page) => {
                    let outcome = self.process_page(&queued, page);

                    if outcome.extracted {
                        pages_extracted += 1;
                    }
                    entries_skipped += outcome.skipped;

                    if !outcome.records.is_empty() {
                        sink.write_records(&outcome.records)?;
                    }

                    tracing::info!(
                        "Page {} done: {} products, {} skipped, {} in frontier",
                        pages_fetched,
                        outcome.records.len(),
                        outcome.skipped,
                        self.frontier.len()
                    );
                }
                Err(e) => {
                    pages_failed += 1;
                    tracing::warn!("Skipping {} due to errors: {}", queued.url, e);
                }
            }

            if self.has_more_work(pages_fetched) {
                self.pause(deadline).await;
            }
        };

        sink.finish()?;

        let summary = RunSummary {
            pages_fetched,
            pages_failed,
            pages_extracted,
            products_written: sink.records_written(),
            entries_skipped,
            stop_reason,
            elapsed: start.elapsed(),
        };

        tracing::info!(
            "Scrape finished ({}): {} pages fetched, {} products written in {:?}",
            summary.stop_reason,
            summary.pages_fetched,
            summary.products_written,
            summary.elapsed
        );

        Ok(summary)
    }

    /// Extracts products and queues follow-up pages
    ///
    /// Kept synchronous: the parsed document never lives across an await.
    fn process_page(&mut self, queued: &QueuedUrl, page: FetchedPage) -> PageOutcome {
        if page.final_url != queued.url {
            tracing::debug!("{} redirected to {}", queued.url, page.final_url);
            self.frontier.mark_seen(&page.final_url);
        }

        let listing = ListingPage::parse(&page.body, page.final_url);
        let mut outcome = PageOutcome::default();

        if self.should_extract(queued.kind, listing.url()) {
            outcome.extracted = true;

            for result in listing.products(&self.rules) {
                match result {
                    Ok(record) => outcome.records.push(record),
                    Err(e) => {
                        tracing::debug!("Skipping product entry: {}", e);
                        outcome.skipped += 1;
                    }
                }
            }
        }

        if let Some(next) = listing.next_page(&self.rules) {
            if self.frontier.push(next.clone(), PageKind::NextPage) {
                tracing::debug!("Queued next page: {}", next);
            }
        }

        if self.follow_links {
            for link in listing.links(&self.rules) {
                if !self.scope.in_scope(&link) {
                    continue;
                }

                let kind = if self.scope.is_listing(&link) {
                    PageKind::Listing
                } else {
                    PageKind::Other
                };
                self.frontier.push(link, kind);
            }
        }

        outcome
    }

    /// Decides whether a fetched page goes through the product extractor
    ///
    /// While following links with a listing pattern, only pages matching the
    /// pattern are extracted, whatever route led to them. Otherwise only the
    /// start URL and the next-page chain are.
    fn should_extract(&self, kind: PageKind, url: &Url) -> bool {
        if self.follow_links && self.scope.has_listing_pattern() {
            return self.scope.is_listing(url);
        }

        matches!(kind, PageKind::Start | PageKind::NextPage)
    }

    fn has_more_work(&self, pages_fetched: u32) -> bool {
        !self.frontier.is_empty()
            && self
                .limits
                .page_limit
                .map_or(true, |limit| pages_fetched < limit)
    }

    /// Sleeps between pages, never past the deadline
    async fn pause(&self, deadline: Option<Instant>) {
        let mut pause = self.limits.delay;

        let jitter_ms = self.limits.delay_jitter.as_millis() as u64;
        if jitter_ms > 0 {
            pause += Duration::from_millis(rand::rng().random_range(0..=jitter_ms));
        }

        if let Some(deadline) = deadline {
            pause = pause.min(deadline.saturating_duration_since(Instant::now()));
        }

        if !pause.is_zero() {
            tracing::trace!("Pausing {:?} before next page", pause);
            tokio::time::sleep(pause).await;
        }
    }
}
