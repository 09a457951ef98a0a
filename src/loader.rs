//! Per-field normalization of raw selector matches into an [`ArticleRecord`].
//!
//! Each field has an input chain of [`Processor`]s, applied to every raw value
//! as it is added, and an output [`Reduction`] that collapses the collected
//! values into the single stored value when the record is loaded.
//!
//! | Field | Input chain | Reduction |
//! |-------|-------------|-----------|
//! | `title` | strip tags, trim | first non-empty |
//! | `text` | strip tags, trim | join with `\n` |
//! | everything else | none | first non-empty |
//!
//! Raw values are expected to be decoded text (see the spiders). The chain
//! never decodes entities, so running it over its own output changes nothing.

use crate::models::ArticleRecord;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// The fields of an [`ArticleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Url,
    Title,
    Text,
    AccessDate,
    CreationDate,
    Category,
}

/// A single-value text transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processor {
    StripTags,
    Trim,
}

impl Processor {
    /// Apply this transform to one value.
    ///
    /// # Arguments
    ///
    /// * `value` - A raw or partially processed field value
    ///
    /// # Returns
    ///
    /// The transformed value. Both transforms are idempotent.
    pub fn apply(self, value: &str) -> String {
        match self {
            Processor::StripTags => strip_tags(value),
            Processor::Trim => value.trim().to_string(),
        }
    }
}

/// Collapses zero or more values into the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// The first value that is not empty.
    TakeFirst,
    /// All values joined with the separator, in insertion order.
    Join(&'static str),
}

impl Reduction {
    /// Reduce the values collected for a field.
    ///
    /// # Returns
    ///
    /// `TakeFirst` yields `None` when no value is non-empty. `Join` always
    /// yields a string, empty for zero values.
    pub fn apply(self, values: &[String]) -> Option<String> {
        match self {
            Reduction::TakeFirst => values.iter().find(|v| !v.is_empty()).cloned(),
            Reduction::Join(sep) => Some(values.iter().join(sep)),
        }
    }
}

/// Input chain and reduction declared for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldProcessing {
    pub input: &'static [Processor],
    pub output: Reduction,
}

const TEXT_CHAIN: &[Processor] = &[Processor::StripTags, Processor::Trim];

/// The processing table for article fields.
pub fn processing(field: Field) -> FieldProcessing {
    match field {
        Field::Title => FieldProcessing {
            input: TEXT_CHAIN,
            output: Reduction::TakeFirst,
        },
        Field::Text => FieldProcessing {
            input: TEXT_CHAIN,
            output: Reduction::Join("\n"),
        },
        _ => FieldProcessing {
            input: &[],
            output: Reduction::TakeFirst,
        },
    }
}

/// Remove anything that looks like a tag from `text`.
///
/// Every `<` up to the next `>` is dropped. Entities are left alone. A `<`
/// that survives has no `>` after it, so a second pass finds nothing.
pub fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

/// Collects raw values per field and loads them into an [`ArticleRecord`].
///
/// # Examples
///
/// ```ignore
/// let mut loader = ItemLoader::new();
/// loader.add_value(Field::Url, ["https://railway.uz/uz/n/1/"]);
/// loader.add_value(Field::Text, ["  first ", "second"]);
/// let record = loader.load_item();
/// assert_eq!(record.text, "first\nsecond");
/// ```
#[derive(Debug, Default)]
pub struct ItemLoader {
    values: HashMap<Field, Vec<String>>,
}

impl ItemLoader {
    /// Create a loader with no values collected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run each value through the field's input chain and store the result.
    ///
    /// # Arguments
    ///
    /// * `field` - The record field the values belong to
    /// * `values` - Raw values in document order; may be empty
    pub fn add_value<I, S>(&mut self, field: Field, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chain = processing(field).input;
        let slot = self.values.entry(field).or_default();
        for raw in values {
            let value = chain
                .iter()
                .fold(raw.as_ref().to_string(), |acc, p| p.apply(&acc));
            slot.push(value);
        }
    }

    /// The reduced value of `field`, or `None` if nothing survives reduction.
    pub fn get_output_value(&self, field: Field) -> Option<String> {
        let values = self.values.get(&field).map(Vec::as_slice).unwrap_or(&[]);
        processing(field).output.apply(values)
    }

    /// Reduce every field and build the record.
    ///
    /// # Returns
    ///
    /// An [`ArticleRecord`] in which `url`, `title`, `text` and `access_date`
    /// fall back to empty strings, and `creation_date` and `category` to
    /// `None`, when no value was collected.
    pub fn load_item(&self) -> ArticleRecord {
        ArticleRecord {
            url: self.get_output_value(Field::Url).unwrap_or_default(),
            title: self.get_output_value(Field::Title).unwrap_or_default(),
            text: self.get_output_value(Field::Text).unwrap_or_default(),
            access_date: self.get_output_value(Field::AccessDate).unwrap_or_default(),
            creation_date: self.get_output_value(Field::CreationDate),
            category: self.get_output_value(Field::Category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(value: &str) -> String {
        TEXT_CHAIN
            .iter()
            .fold(value.to_string(), |acc, p| p.apply(&acc))
    }

    #[test]
    fn test_strip_tags_removes_markup() {
        assert_eq!(strip_tags("<b>bold</b> and <i>italic</i>"), "bold and italic");
        assert_eq!(strip_tags("a <a href=\"/x\">link</a>."), "a link.");
    }

    #[test]
    fn test_strip_tags_leaves_entities_alone() {
        assert_eq!(strip_tags("Tom &amp; Jerry"), "Tom &amp; Jerry");
        assert_eq!(strip_tags("a &lt;b&gt; c"), "a &lt;b&gt; c");
    }

    #[test]
    fn test_strip_tags_drops_unterminated_runs_once() {
        assert_eq!(strip_tags("<<b>b>"), "b>");
        assert_eq!(strip_tags("b>"), "b>");
        assert_eq!(strip_tags("3 < 5"), "3 < 5");
    }

    #[test]
    fn test_strip_tags_plain_text_unchanged() {
        assert_eq!(strip_tags("  plain text  "), "  plain text  ");
    }

    #[test]
    fn test_chain_is_idempotent() {
        for raw in [
            "  <i>a</i> ",
            "<p> Toshkent &amp; Samarqand </p>",
            "already clean",
            "",
            "\n\t<span>x</span>\n",
            "a &amp;lt;b&amp;gt; c",
            "a &lt;b&gt; c",
            "a <b> c",
            "<<b>b> and < open",
            "2 < 3 > 1",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn test_text_joins_fragments_with_newline() {
        let mut loader = ItemLoader::new();
        loader.add_value(Field::Text, ["  <i>a</i> ", "b  "]);
        assert_eq!(loader.load_item().text, "a\nb");
    }

    #[test]
    fn test_text_without_fragments_is_empty() {
        let loader = ItemLoader::new();
        assert_eq!(loader.get_output_value(Field::Text), Some(String::new()));
        assert_eq!(loader.load_item().text, "");
    }

    #[test]
    fn test_title_takes_first_value() {
        let mut loader = ItemLoader::new();
        loader.add_value(Field::Title, ["<b>First</b>", "Second"]);
        assert_eq!(loader.load_item().title, "First");
    }

    #[test]
    fn test_take_first_skips_empty_values() {
        let mut loader = ItemLoader::new();
        loader.add_value(Field::Title, ["   ", "<br>", "Real title"]);
        assert_eq!(loader.load_item().title, "Real title");
    }

    #[test]
    fn test_default_fields_are_not_transformed() {
        let mut loader = ItemLoader::new();
        loader.add_value(Field::CreationDate, [" 2024-02-28 10:15 ", "2023-01-01"]);
        assert_eq!(
            loader.load_item().creation_date.as_deref(),
            Some(" 2024-02-28 10:15 ")
        );
    }

    #[test]
    fn test_missing_fields_load_as_empty() {
        let mut loader = ItemLoader::new();
        loader.add_value(Field::Url, ["https://railway.uz/uz/a/"]);
        let record = loader.load_item();
        assert_eq!(record.url, "https://railway.uz/uz/a/");
        assert_eq!(record.title, "");
        assert_eq!(record.creation_date, None);
        assert_eq!(record.category, None);
    }

    #[test]
    fn test_processing_table() {
        assert_eq!(processing(Field::Text).output, Reduction::Join("\n"));
        assert_eq!(processing(Field::Title).input, TEXT_CHAIN);
        assert!(processing(Field::Url).input.is_empty());
        assert_eq!(processing(Field::Category).output, Reduction::TakeFirst);
    }
}
