//! # Railway News
//!
//! A single-site news crawler for [railway.uz](https://railway.uz). It walks
//! the paginated news listing of one edition of the site, follows every
//! article link, and extracts a uniform record per article: URL, title, body
//! text, publication date, access date and category.
//!
//! ## Usage
//!
//! ```sh
//! railway_news --ws rus -o ./out/ru.jsonl
//! ```
//!
//! ## Architecture
//!
//! 1. **Listing**: the spider reports article links and the "load more" link
//! 2. **Fetching**: article pages are fetched behind a politeness delay, with retries
//! 3. **Extraction**: each article page is normalized into an [`ArticleRecord`](models::ArticleRecord)
//! 4. **Output**: records stream into a JSON Lines or JSON feed

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod clock;
mod config;
mod crawler;
mod fetch;
mod loader;
mod models;
mod outputs;
mod scrapers;
#[cfg(test)]
mod test_utils;
mod utils;

use cli::Cli;
use clock::SystemClock;
use config::load_settings;
use crawler::Crawler;
use fetch::{HttpFetcher, RetryFetch, Throttled};
use outputs::json::FeedSink;
use scrapers::Spider;
use scrapers::railway::RailwaySpider;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("railway_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = match load_settings(&args).await {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid settings");
            return Err(e);
        }
    };
    info!(
        delay_secs = settings.download_delay_secs,
        randomize = settings.randomize_download_delay,
        max_pages = ?settings.max_pages,
        concurrency = settings.concurrent_requests,
        retries = settings.retry_times,
        "Effective settings"
    );

    // ---- Fetcher stack: retries on top of the politeness delay ----
    let http = HttpFetcher::new(&settings.user_agent, settings.download_timeout())?;
    let throttled = Throttled::new(
        http,
        settings.download_delay(),
        settings.randomize_download_delay,
    );
    let fetcher = RetryFetch::new(throttled, settings.retry_times, settings.retry_base_delay());

    let mut spider = RailwaySpider::new(args.ws)?;
    info!(spider = spider.name(), ws = ?args.ws, start_url = %spider.start_url()?, "Spider ready");

    let mut sink = FeedSink::open(args.format, args.output.as_deref()).await?;

    let crawler = Crawler::new(fetcher, SystemClock)
        .max_pages(settings.max_pages)
        .concurrency(settings.concurrent_requests);
    let stats = crawler.crawl(&mut spider, &mut sink).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        listing_pages = stats.listing_pages,
        articles = stats.records_emitted,
        duplicates = stats.duplicate_articles,
        failed = stats.failed_requests,
        "Execution complete"
    );

    Ok(())
}
