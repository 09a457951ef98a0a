//! Site spiders.
//!
//! A spider supplies the two page handlers the crawler drives:
//!
//! 1. **Listing**: discover article URLs and the next listing page
//! 2. **Article**: turn one article page into an [`ArticleRecord`]
//!
//! Spiders never fetch anything themselves. Fetching, throttling, retries and
//! deduplication belong to [`crate::crawler`].
//!
//! # Supported Sources
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | railway.uz | [`railway`] | Paginated news listing, four writing systems |

use crate::clock::Clock;
use crate::models::{ArticleRecord, Page};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;
use url::Url;

pub mod railway;

/// What a listing page asks the crawler to fetch next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingOutcome {
    /// Absolute article URLs, in document order.
    pub article_urls: Vec<Url>,
    /// Absolute URL of the following listing page, if the page links one.
    pub next_page: Option<Url>,
}

/// Page handlers for one site.
///
/// The crawler calls [`Spider::parse_listing`] for each listing page in
/// order, one at a time, and [`Spider::parse_article`] for every article page,
/// possibly several at once. Neither handler fails: a page without the
/// expected markup yields empty results rather than an error.
pub trait Spider {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// The first listing page to fetch.
    ///
    /// # Returns
    ///
    /// An absolute URL, or the parse error if the configured address is
    /// malformed.
    fn start_url(&self) -> Result<Url, url::ParseError>;

    /// Handle a fetched listing page.
    ///
    /// # Arguments
    ///
    /// * `page` - The listing page; relative links resolve against `page.url`
    ///
    /// # Returns
    ///
    /// Every article link on the page, duplicates included, and at most one
    /// next listing page. Both are empty when nothing matches.
    fn parse_listing(&mut self, page: &Page) -> ListingOutcome;

    /// Handle a fetched article page.
    ///
    /// # Arguments
    ///
    /// * `page` - The article page; `page.url` becomes the record's `url`
    /// * `clock` - Supplies the record's `access_date`
    ///
    /// # Returns
    ///
    /// Exactly one record, with empty or `None` fields for whatever the page
    /// lacks.
    fn parse_article(&self, page: &Page, clock: &dyn Clock) -> ArticleRecord;
}

/// Resolve the `href` of every element matching `selector` against `base`.
///
/// Elements without an `href` are ignored. Hrefs that cannot be joined are
/// logged and skipped.
pub fn resolve_links(document: &Html, selector: &Selector, base: &Url) -> Vec<Url> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| match base.join(href) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(%href, %base, error = %e, "Skipping unresolvable link");
                None
            }
        })
        .collect()
}

/// Decoded text of `el`, split into one string per `<br>`-separated line.
///
/// Text of nested inline elements joins the line it sits on. Lines with no
/// text at all (e.g. a trailing `<br>`) are dropped.
pub fn text_segments(el: ElementRef<'_>) -> Vec<String> {
    let mut segments = vec![String::new()];
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => {
                if let Some(current) = segments.last_mut() {
                    current.push_str(text);
                }
            }
            Node::Element(e) if e.name() == "br" => segments.push(String::new()),
            _ => {}
        }
    }
    segments.retain(|s| !s.is_empty());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_links_against_base() {
        let html = Html::parse_document(
            r#"<a class="x" href="/ru/a/1/">one</a>
               <a class="x" href="2/">two</a>
               <a class="x">no href</a>
               <a class="x" href="https://other.example/3">three</a>"#,
        );
        let selector = Selector::parse("a.x").unwrap();
        let base = Url::parse("https://railway.uz/ru/list/").unwrap();
        let urls: Vec<String> = resolve_links(&html, &selector, &base)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://railway.uz/ru/a/1/",
                "https://railway.uz/ru/list/2/",
                "https://other.example/3",
            ]
        );
    }

    #[test]
    fn test_text_segments_split_on_br() {
        let html = Html::parse_document(
            "<p>one <i>two</i><br>three &lt;b&gt;<br/><br></p>",
        );
        let selector = Selector::parse("p").unwrap();
        let p = html.select(&selector).next().unwrap();
        assert_eq!(text_segments(p), vec!["one two", "three <b>"]);
    }

    #[test]
    fn test_resolve_links_skips_invalid_href() {
        let html = Html::parse_document(r#"<a class="x" href="http://[::1">bad</a>"#);
        let selector = Selector::parse("a.x").unwrap();
        let base = Url::parse("https://railway.uz/").unwrap();
        assert!(resolve_links(&html, &selector, &base).is_empty());
    }
}
