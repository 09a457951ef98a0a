//! Time source for the access date stamped on every record.

use chrono::{Local, NaiveDate};

/// Format of [`ArticleRecord::access_date`](crate::models::ArticleRecord).
pub const ACCESS_DATE_FORMAT: &str = "%Y-%m-%d";

pub trait Clock {
    /// The current calendar date.
    fn today(&self) -> NaiveDate;

    fn access_date(&self) -> String {
        self.today().format(ACCESS_DATE_FORMAT).to_string()
    }
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
