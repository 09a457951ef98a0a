//! Command-line interface definitions.
//!
//! Flags given here override values from the optional YAML settings file
//! (see [`crate::config`]).

use crate::outputs::json::OutputFormat;
use crate::scrapers::railway::WritingSystem;
use clap::Parser;

/// Crawl the railway.uz news section and emit one JSON record per article.
///
/// # Examples
///
/// ```sh
/// # Latin Uzbek edition, JSON Lines on stdout
/// railway_news
///
/// # Russian edition into a file, first three listing pages only
/// railway_news --ws rus -o ./out/ru.jsonl --max-pages 3
///
/// # English edition as a single JSON array, settings from a file
/// railway_news --ws eng --format json -o ./out/en.json -c crawl.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Edition of the site to crawl
    #[arg(long, value_enum, default_value_t = WritingSystem::UzLat)]
    pub ws: WritingSystem,

    /// File to write records to (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Feed format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Jsonl)]
    pub format: OutputFormat,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Seconds to wait between requests
    #[arg(long)]
    pub download_delay: Option<f64>,

    /// Stop after this many listing pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Article pages fetched concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["railway_news"]);
        assert_eq!(cli.ws, WritingSystem::UzLat);
        assert_eq!(cli.format, OutputFormat::Jsonl);
        assert!(cli.output.is_none());
        assert!(cli.download_delay.is_none());
    }

    #[test]
    fn test_cli_writing_system_names() {
        for (name, ws) in [
            ("uz_lat", WritingSystem::UzLat),
            ("uz_cyr", WritingSystem::UzCyr),
            ("rus", WritingSystem::Rus),
            ("eng", WritingSystem::Eng),
        ] {
            let cli = Cli::parse_from(["railway_news", "--ws", name]);
            assert_eq!(cli.ws, ws);
        }
    }

    #[test]
    fn test_cli_rejects_unknown_writing_system() {
        assert!(Cli::try_parse_from(["railway_news", "--ws", "kaz"]).is_err());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "railway_news",
            "-o",
            "/tmp/feed.json",
            "-f",
            "json",
            "-c",
            "/tmp/crawl.yaml",
        ]);
        assert_eq!(cli.output.as_deref(), Some("/tmp/feed.json"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config.as_deref(), Some("/tmp/crawl.yaml"));
    }
}
