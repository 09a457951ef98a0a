//! Data models for fetched pages and extracted article records.
//!
//! - [`Page`]: a fetched document together with the address it was served from
//! - [`ArticleRecord`]: the normalized output unit emitted for every article page

use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

/// A fetched HTML page.
///
/// `url` is the resolved address of the response (after redirects), which is
/// the base every relative link on the page is joined against.
#[derive(Debug, Clone)]
pub struct Page {
    /// The address the body was served from.
    pub url: Url,
    /// The raw HTML body.
    pub body: String,
}

impl Page {
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }

    /// Parse the body into a queryable document.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// One extracted news article.
///
/// Every record carries the same six keys when serialized. Fields with no
/// matching markup are empty strings (`title`, `text`) or `null`
/// (`creation_date`, `category`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Address of the article page.
    pub url: String,
    /// Headline, tag-stripped and trimmed.
    pub title: String,
    /// Body paragraphs, tag-stripped, trimmed and joined with `\n`.
    pub text: String,
    /// Date of extraction, `YYYY-MM-DD`.
    pub access_date: String,
    /// Raw value of the page's published-time attribute.
    pub creation_date: Option<String>,
    /// Not populated by any extraction rule.
    pub category: Option<String>,
}
