//! Scrape configuration shared by the parsers and the pipeline.

use std::time::Duration;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Options controlling page loads and pagination
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Scholar host or mirror, without trailing slash
    pub base_url: String,
    /// Settle delay after each navigation
    pub load_delay: Duration,
    /// Settle delay after each "show more" click
    pub more_delay: Duration,
    /// Upper bound on "show more" clicks per profile
    pub max_expansions: usize,
    /// Draw progress bars on stderr
    pub show_progress: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SCHOLAR_URL.to_string(),
            load_delay: Duration::from_millis(1000),
            more_delay: Duration::from_millis(2000),
            max_expansions: 50,
            show_progress: true,
        }
    }
}

impl ScrapeOptions {
    /// Base URL with any trailing slash removed
    pub fn scholar_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
