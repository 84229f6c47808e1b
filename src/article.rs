//! Per-article citation histories.
//!
//! Reads the "Cited by" bar chart on an article page
//! (`/citations?view_op=view_citation&...`) into a year to count mapping.

use crate::browser::{ensure_not_blocked, PageSession};
use crate::error::{Result, ScholarError};
use crate::html::{element_text, selector};
use crate::options::ScrapeOptions;
use crate::profile::NOT_AVAILABLE;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};
use url::Url;

/// Id of the histogram container on an article page
pub const HISTOGRAM_ID: &str = "gsc_oci_graph_bars";

/// Elements present on every rendered article page
const ARTICLE_CONTENT: &str = "#gsc_oci_title, #gsc_oci_table, #gsc_oci_graph_bars";

/// Citation count for one article in one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationYearRecord {
    pub article_id: String,
    pub year: String,
    pub num_of_citations: u64,
}

/// Outcome of reading one article's histogram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CitationHistory {
    /// Histogram found; may still be empty
    Counts(BTreeMap<String, u64>),
    /// Page loaded but has no histogram
    NoHistogram,
    /// Navigation or page-level failure
    Failed(String),
}

impl CitationHistory {
    /// Year to count mapping; empty unless counts were found.
    pub fn into_counts(self) -> BTreeMap<String, u64> {
        match self {
            CitationHistory::Counts(counts) => counts,
            CitationHistory::NoHistogram | CitationHistory::Failed(_) => BTreeMap::new(),
        }
    }

    /// Flatten into records tagged with `article_id`, ordered by year.
    pub fn into_records(self, article_id: &str) -> Vec<CitationYearRecord> {
        self.into_counts()
            .into_iter()
            .map(|(year, num_of_citations)| CitationYearRecord {
                article_id: article_id.to_string(),
                year,
                num_of_citations,
            })
            .collect()
    }
}

/// Absolute URL for an article link found on a profile page.
///
/// Relative links are appended to `base_url` as-is, so a mirror's path
/// prefix is kept the same way [`crate::profile::profile_url`] keeps it.
pub fn article_page_url(base_url: &str, article_url: &str) -> Result<Url> {
    let full = if article_url.starts_with("http://") || article_url.starts_with("https://") {
        article_url.to_string()
    } else {
        let base = base_url.trim_end_matches('/');
        if article_url.starts_with('/') {
            format!("{}{}", base, article_url)
        } else {
            format!("{}/{}", base, article_url)
        }
    };
    Url::parse(&full).map_err(|e| ScholarError::Parse(format!("Invalid article URL '{}': {}", full, e)))
}

/// Fetch an article page and read its citation histogram.
///
/// Never returns an error: failures are logged and reported as
/// [`CitationHistory::Failed`].
pub async fn parse_citation_history<S: PageSession>(
    session: &mut S,
    article_id: &str,
    article_url: &str,
    options: &ScrapeOptions,
) -> CitationHistory {
    if article_url == NOT_AVAILABLE {
        warn!(article_id = %article_id, "No article link, skipping");
        return CitationHistory::Failed("missing article link".to_string());
    }

    match fetch_histogram(session, article_url, options).await {
        Ok(Some(counts)) => {
            info!(article_id = %article_id, years = counts.len(), "Parsed citation history");
            CitationHistory::Counts(counts)
        }
        Ok(None) => {
            warn!(article_id = %article_id, url = %article_url, "No citation histogram found");
            CitationHistory::NoHistogram
        }
        Err(e) => {
            error!(article_id = %article_id, url = %article_url, error = %e, "Failed to read article");
            CitationHistory::Failed(e.to_string())
        }
    }
}

async fn fetch_histogram<S: PageSession>(
    session: &mut S,
    article_url: &str,
    options: &ScrapeOptions,
) -> Result<Option<BTreeMap<String, u64>>> {
    let url = article_page_url(options.scholar_url(), article_url)?;
    let html = session.fetch(url.as_str(), options.load_delay).await?;
    ensure_not_blocked(url.as_str(), &html, ARTICLE_CONTENT)?;
    parse_histogram(&html)
}

/// Read the histogram of an article page.
///
/// Returns `None` when the page has no histogram container. Year labels and
/// bars are paired by position; extra entries on either side are dropped.
/// Bars without a numeric label are skipped.
pub fn parse_histogram(html: &str) -> Result<Option<BTreeMap<String, u64>>> {
    let document = Html::parse_document(html);
    let container_sel = selector(&format!("div#{}", HISTOGRAM_ID))?;
    let year_sel = selector("span.gsc_oci_g_t")?;
    let bar_sel = selector("a.gsc_oci_g_a")?;
    let label_sel = selector("span.gsc_oci_g_al")?;

    let Some(container) = document.select(&container_sel).next() else {
        return Ok(None);
    };

    let years: Vec<String> = container.select(&year_sel).map(element_text).collect();
    let bars: Vec<_> = container.select(&bar_sel).collect();
    if years.len() != bars.len() {
        debug!(years = years.len(), bars = bars.len(), "Histogram labels and bars differ in length");
    }

    let mut counts = BTreeMap::new();
    for (year, bar) in years.into_iter().zip(bars) {
        let label = bar.select(&label_sel).next().map(element_text);
        match label.as_deref().map(str::parse::<u64>) {
            Some(Ok(count)) => {
                counts.insert(year, count);
            }
            _ => warn!(year = %year, label = ?label, "Skipping non-numeric citation count"),
        }
    }

    Ok(Some(counts))
}
