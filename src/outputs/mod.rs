//! Output sinks for extracted records.
//!
//! - [`json`]: JSON Lines and JSON array feeds written to a file or stdout
//!
//! # Output Formats
//!
//! ```text
//! jsonl   {"url":"https://railway.uz/uz/...","title":"...",...}\n
//!         {"url":"https://railway.uz/uz/...","title":"...",...}\n
//!
//! json    [
//!           { "url": "https://railway.uz/uz/...", ... },
//!           ...
//!         ]
//! ```

use crate::models::ArticleRecord;
use std::error::Error;

pub mod json;

/// Destination for records as the crawler produces them.
pub trait RecordSink {
    async fn emit(&mut self, record: &ArticleRecord) -> Result<(), Box<dyn Error>>;

    /// Flush anything buffered. Called once after the last record.
    async fn finish(&mut self) -> Result<(), Box<dyn Error>>;
}
