//! railway.uz news spider.
//!
//! The news section is a paginated listing. Every listing page links its
//! articles with `a.full-link` and the following page with an
//! `a.more-button` "load more" control; the last page has no such control.
//!
//! # URL Pattern
//!
//! Listings live under a language segment, e.g.
//! `https://railway.uz/ru/informatsionnaya_sluzhba/novosti/`. Cyrillic Uzbek
//! has no edition of its own and shares the Latin `uz/` segment.

use super::{ListingOutcome, Spider, resolve_links, text_segments};
use crate::clock::Clock;
use crate::loader::{Field, ItemLoader};
use crate::models::{ArticleRecord, Page};
use clap::ValueEnum;
use scraper::Selector;
use std::error::Error;
use tracing::{debug, info, instrument};
use url::Url;

const BASE_URL: &str = "https://railway.uz/";
const NEWS_PATH: &str = "informatsionnaya_sluzhba/novosti/";

const ARTICLE_LINK: &str = "a.full-link";
const NEXT_PAGE_LINK: &str = "a.more-button";

/// Where a field's raw values come from on a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extract {
    /// The element's decoded text as one value, lines joined by a space.
    Text,
    /// The element's decoded text, one value per `<br>`-separated line.
    Lines,
    /// The value of the named attribute.
    Attr(&'static str),
}

/// Selector table for article pages.
///
/// Body paragraphs are recognised by their inline justification style, the
/// only marker the site puts on article text.
const ARTICLE_FIELDS: &[(Field, &str, Extract)] = &[
    (Field::Title, "h3.inner-content__title", Extract::Text),
    (Field::Text, r#"p[style="text-align: justify;"]"#, Extract::Lines),
    (Field::CreationDate, "time.news-info__time", Extract::Attr("datetime")),
];

/// Edition of the site to crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WritingSystem {
    /// Uzbek, Latin script.
    #[default]
    #[value(name = "uz_lat")]
    UzLat,
    /// Uzbek, Cyrillic script.
    #[value(name = "uz_cyr")]
    UzCyr,
    /// Russian.
    #[value(name = "rus")]
    Rus,
    /// English.
    #[value(name = "eng")]
    Eng,
}

impl WritingSystem {
    /// Path segment of this edition, including the trailing slash.
    pub fn path_segment(self) -> &'static str {
        match self {
            WritingSystem::UzLat | WritingSystem::UzCyr => "uz/",
            WritingSystem::Rus => "ru/",
            WritingSystem::Eng => "en/",
        }
    }
}

/// Spider for the railway.uz news section of one edition.
#[derive(Debug)]
pub struct RailwaySpider {
    writing_system: WritingSystem,
    article_link: Selector,
    next_page_link: Selector,
    fields: Vec<(Field, Selector, Extract)>,
    page_no: usize,
}

impl RailwaySpider {
    /// Compile the spider's selectors for one edition of the site.
    ///
    /// # Arguments
    ///
    /// * `writing_system` - Chooses the edition the crawl starts from
    ///
    /// # Returns
    ///
    /// The spider, or the selector parse error if one of its selectors is
    /// malformed.
    pub fn new(writing_system: WritingSystem) -> Result<Self, Box<dyn Error>> {
        let mut fields = Vec::with_capacity(ARTICLE_FIELDS.len());
        for &(field, css, extract) in ARTICLE_FIELDS {
            fields.push((field, Selector::parse(css)?, extract));
        }
        Ok(Self {
            writing_system,
            article_link: Selector::parse(ARTICLE_LINK)?,
            next_page_link: Selector::parse(NEXT_PAGE_LINK)?,
            fields,
            page_no: 0,
        })
    }
}

impl Spider for RailwaySpider {
    fn name(&self) -> &str {
        "railways"
    }

    fn start_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(BASE_URL)?
            .join(self.writing_system.path_segment())?
            .join(NEWS_PATH)
    }

    #[instrument(level = "debug", skip_all, fields(url = %page.url))]
    fn parse_listing(&mut self, page: &Page) -> ListingOutcome {
        let document = page.document();
        let article_urls = resolve_links(&document, &self.article_link, &page.url);
        let next_page = resolve_links(&document, &self.next_page_link, &page.url)
            .into_iter()
            .next();

        if next_page.is_some() {
            self.page_no += 1;
        }
        info!(
            articles = article_urls.len(),
            has_next = next_page.is_some(),
            page_no = self.page_no,
            "Parsed listing page"
        );
        ListingOutcome {
            article_urls,
            next_page,
        }
    }

    #[instrument(level = "debug", skip_all, fields(url = %page.url))]
    fn parse_article(&self, page: &Page, clock: &dyn Clock) -> ArticleRecord {
        let document = page.document();
        let mut loader = ItemLoader::new();
        loader.add_value(Field::Url, [page.url.as_str()]);

        for (field, selector, extract) in &self.fields {
            let raw = document.select(selector).flat_map(|el| match extract {
                Extract::Text => vec![text_segments(el).join(" ")],
                Extract::Lines => text_segments(el),
                Extract::Attr(name) => el.value().attr(name).map(str::to_string).into_iter().collect(),
            });
            loader.add_value(*field, raw);
        }
        loader.add_value(Field::AccessDate, [clock.access_date()]);

        let record = loader.load_item();
        debug!(
            title = %record.title,
            text_bytes = record.text.len(),
            creation_date = ?record.creation_date,
            "Extracted article"
        );
        record
    }
}
