//! The crawl loop.
//!
//! Listing pages are walked one at a time: fetch, hand to the spider, fetch
//! the article pages it found, emit their records, then move on to the next
//! listing page the spider reported.
//!
//! Pagination stops when the spider reports no next page, when a listing URL
//! comes round a second time, when `max_pages` listing pages have been
//! walked, or when a listing page cannot be fetched.
//!
//! Article URLs are deduplicated across the whole crawl. A failed article
//! fetch is logged and counted; the crawl carries on.

use crate::clock::Clock;
use crate::fetch::{Fetch, FetchError};
use crate::models::{ArticleRecord, Page};
use crate::outputs::RecordSink;
use crate::scrapers::Spider;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Counters for one crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub listing_pages: usize,
    pub articles_scheduled: usize,
    pub duplicate_articles: usize,
    pub records_emitted: usize,
    pub failed_requests: usize,
}

#[derive(Debug)]
pub struct Crawler<F, C> {
    fetcher: F,
    clock: C,
    max_pages: Option<usize>,
    concurrency: usize,
}

impl<F: Fetch, C: Clock> Crawler<F, C> {
    /// Create a crawler that walks every listing page and fetches one
    /// article at a time.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of pages; usually a [`crate::fetch::RetryFetch`]
    ///   around a throttled [`crate::fetch::HttpFetcher`]
    /// * `clock` - Supplies the access date stamped on every record
    ///
    /// # Returns
    ///
    /// A crawler with no page limit and a concurrency of one. Use
    /// [`Crawler::max_pages`] and [`Crawler::concurrency`] to change either.
    pub fn new(fetcher: F, clock: C) -> Self {
        Self {
            fetcher,
            clock,
            max_pages: None,
            concurrency: 1,
        }
    }

    /// Stop pagination after `max_pages` listing pages. `None` walks until
    /// the spider reports no next page.
    pub fn max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Number of article fetches in flight at once. Zero is treated as one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Crawl from the spider's start URL, emitting every record into `sink`.
    ///
    /// # Arguments
    ///
    /// * `spider` - Parses listing and article pages for one site
    /// * `sink` - Receives each record as soon as its page has been parsed
    ///
    /// # Returns
    ///
    /// Counters for the whole crawl. Fetch failures are logged and counted,
    /// never returned. Only sink failures and an invalid start URL are
    /// errors.
    ///
    /// `sink.finish()` runs on every path, including after a failed emit, so
    /// records already accepted by a buffering sink are still written out.
    /// The first error wins when both the crawl and `finish` fail.
    #[instrument(level = "info", skip_all, fields(spider = spider.name()))]
    pub async fn crawl<S, K>(&self, spider: &mut S, sink: &mut K) -> Result<CrawlStats, Box<dyn Error>>
    where
        S: Spider,
        K: RecordSink,
    {
        let mut stats = CrawlStats::default();
        let walked = self.walk(spider, sink, &mut stats).await;
        let finished = sink.finish().await;
        if let Err(e) = &walked {
            error!(error = %e, records_emitted = stats.records_emitted, "Crawl aborted");
        }
        walked?;
        finished?;

        info!(
            listing_pages = stats.listing_pages,
            articles_scheduled = stats.articles_scheduled,
            records_emitted = stats.records_emitted,
            failed_requests = stats.failed_requests,
            "Crawl finished"
        );
        Ok(stats)
    }

    async fn walk<S, K>(&self, spider: &mut S, sink: &mut K, stats: &mut CrawlStats) -> Result<(), Box<dyn Error>>
    where
        S: Spider,
        K: RecordSink,
    {
        let mut visited_listings: HashSet<Url> = HashSet::new();
        let mut seen_articles: HashSet<Url> = HashSet::new();
        let mut next = Some(spider.start_url()?);

        while let Some(listing_url) = next.take() {
            if let Some(max) = self.max_pages {
                if stats.listing_pages >= max {
                    info!(max_pages = max, next = %listing_url, "Reached page limit; stopping pagination");
                    break;
                }
            }
            if !visited_listings.insert(listing_url.clone()) {
                warn!(url = %listing_url, "Listing page already visited; stopping pagination");
                break;
            }

            let page = match self.fetcher.fetch(&listing_url).await {
                Ok(page) => page,
                Err(e) => {
                    error!(url = %listing_url, error = %e, "Listing fetch failed; stopping pagination");
                    stats.failed_requests += 1;
                    break;
                }
            };
            stats.listing_pages += 1;

            let outcome = spider.parse_listing(&page);
            if outcome.article_urls.is_empty() {
                debug!(
                    url = %page.url,
                    preview = %truncate_for_log(&page.body, 300),
                    "Listing page had no article links"
                );
            }

            let found = outcome.article_urls.len();
            let fresh: Vec<Url> = outcome
                .article_urls
                .into_iter()
                .filter(|url| seen_articles.insert(url.clone()))
                .collect();
            stats.duplicate_articles += found - fresh.len();
            stats.articles_scheduled += fresh.len();

            self.crawl_articles(&*spider, fresh, sink, stats).await?;
            next = outcome.next_page;
        }
        Ok(())
    }

    async fn crawl_articles<S, K>(
        &self,
        spider: &S,
        urls: Vec<Url>,
        sink: &mut K,
        stats: &mut CrawlStats,
    ) -> Result<(), Box<dyn Error>>
    where
        S: Spider,
        K: RecordSink,
    {
        let mut results = stream::iter(urls)
            .map(|url| async move {
                let outcome: Result<ArticleRecord, FetchError> = self
                    .fetcher
                    .fetch(&url)
                    .await
                    .map(|page: Page| spider.parse_article(&page, &self.clock));
                (url, outcome)
            })
            .buffer_unordered(self.concurrency);

        while let Some((url, outcome)) = results.next().await {
            match outcome {
                Ok(record) => {
                    sink.emit(&record).await?;
                    stats.records_emitted += 1;
                    debug!(%url, "Emitted article record");
                }
                Err(e) => {
                    error!(%url, error = %e, "Article fetch failed");
                    stats.failed_requests += 1;
                }
            }
        }
        Ok(())
    }
}
