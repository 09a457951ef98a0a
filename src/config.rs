//! Crawl settings.
//!
//! Settings come from built-in defaults, optionally overlaid by a YAML file
//! (`--config`), and finally by command-line flags.
//!
//! ```yaml
//! download_delay_secs: 2.0
//! randomize_download_delay: true
//! max_pages: 50
//! concurrent_requests: 8
//! retry_times: 2
//! retry_base_delay_ms: 1000
//! download_timeout_secs: 180
//! user_agent: "railway_news/0.1.0"
//! ```

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlSettings {
    /// Minimum pause between consecutive requests, in seconds.
    pub download_delay_secs: f64,
    /// Draw each pause from 0.5x to 1.5x the delay.
    pub randomize_download_delay: bool,
    /// Stop after this many listing pages. Unbounded when absent.
    pub max_pages: Option<usize>,
    /// Article pages in flight at once.
    pub concurrent_requests: usize,
    /// Extra attempts for a failed request.
    pub retry_times: usize,
    /// First retry backoff, doubled on each further attempt.
    pub retry_base_delay_ms: u64,
    pub download_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            download_delay_secs: 2.0,
            randomize_download_delay: true,
            max_pages: None,
            concurrent_requests: 8,
            retry_times: 2,
            retry_base_delay_ms: 1000,
            download_timeout_secs: 180,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl CrawlSettings {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Overlay flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(delay) = cli.download_delay {
            self.download_delay_secs = delay;
        }
        if let Some(max_pages) = cli.max_pages {
            self.max_pages = Some(max_pages);
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrent_requests = concurrency;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.download_delay_secs.is_finite() || self.download_delay_secs < 0.0 {
            return Err(format!(
                "download_delay_secs must be a non-negative number, got {}",
                self.download_delay_secs
            ));
        }
        if self.concurrent_requests == 0 {
            return Err("concurrent_requests must be at least 1".to_string());
        }
        if self.max_pages == Some(0) {
            return Err("max_pages must be at least 1 when set".to_string());
        }
        Ok(())
    }

    pub fn download_delay(&self) -> Duration {
        Duration::from_secs_f64(self.download_delay_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Build the effective settings for this run.
#[instrument(level = "info", skip_all, fields(config = ?cli.config))]
pub async fn load_settings(cli: &Cli) -> Result<CrawlSettings, Box<dyn Error>> {
    let mut settings = match &cli.config {
        Some(path) => {
            let yaml = fs::read_to_string(path).await?;
            let settings = CrawlSettings::from_yaml(&yaml)?;
            info!(%path, "Loaded settings file");
            settings
        }
        None => CrawlSettings::default(),
    };
    settings.apply_cli(cli);
    settings.validate()?;
    Ok(settings)
}
