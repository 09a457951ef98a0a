//! In-memory stand-ins for the network, the output sink and the clock.

use crate::clock::Clock;
use crate::fetch::{Fetch, FetchError};
use crate::models::{ArticleRecord, Page};
use crate::outputs::RecordSink;
use chrono::NaiveDate;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Mutex;
use url::Url;

/// Serves canned bodies by URL; anything unknown is a 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
    failures: Mutex<HashMap<String, (usize, StatusCode)>>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    /// Serve `to` when `from` is requested, reporting `to` as the page URL.
    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Fail the first `times` requests for `url` with `status`.
    pub fn failing_first(self, url: &str, times: usize, status: StatusCode) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_string(), (times, status));
        self
    }

    /// Every requested URL, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

impl Fetch for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some((remaining, status)) = self.failures.lock().unwrap().get_mut(url.as_str()) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(FetchError::Status {
                    url: url.clone(),
                    status: *status,
                });
            }
        }

        let target = match self.redirects.get(url.as_str()) {
            Some(to) => Url::parse(to).unwrap(),
            None => url.clone(),
        };
        match self.pages.get(target.as_str()) {
            Some(body) => Ok(Page::new(target, body.clone())),
            None => Err(FetchError::Status {
                url: url.clone(),
                status: StatusCode::NOT_FOUND,
            }),
        }
    }
}

/// Collects emitted records. With `fail_after` set, every emit after that
/// many records fails with "sink full".
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<ArticleRecord>,
    pub finished: bool,
    pub fail_after: Option<usize>,
}

impl RecordSink for MemorySink {
    async fn emit(&mut self, record: &ArticleRecord) -> Result<(), Box<dyn Error>> {
        if self.fail_after.is_some_and(|n| self.records.len() >= n) {
            return Err("sink full".into());
        }
        self.records.push(record.clone());
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), Box<dyn Error>> {
        self.finished = true;
        Ok(())
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
