//! Google Scholar profile scraping.
//!
//! Turns a researcher's profile page (`/citations?user=...`) into a list of
//! [`PublicationRecord`]s. The page is fully expanded with the "show more"
//! button before the publication table is parsed.

use crate::browser::{ensure_not_blocked, PageSession};
use crate::error::{OptionExt, Result, ScholarError};
use crate::html::{element_text, selector};
use crate::options::ScrapeOptions;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

/// Id of the "show more" button under the publication table
pub const SHOW_MORE_ID: &str = "gsc_bpf_more";

/// Query parameter that carries the article id in a title link
pub const ARTICLE_ID_MARKER: &str = "citation_for_view=";

/// Placeholder for a missing link or article id
pub const NOT_AVAILABLE: &str = "N/A";

/// Elements present on every rendered profile, even one without publications
const PROFILE_CONTENT: &str = "#gsc_prf, #gsc_a_b, tr.gsc_a_tr";

/// One row of a researcher's publication table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub scholar_id: String,
    pub title: String,
    /// Comma-joined author list as rendered
    pub authors: String,
    /// Venue line as rendered
    pub publisher: String,
    /// May be empty
    pub year: String,
    /// Raw "Cited by" cell, may be empty
    pub citations: String,
    /// Relative link to the article page, or `N/A`
    pub article_url: String,
    pub article_id: String,
}

/// Build the profile URL for a researcher.
pub fn profile_url(base_url: &str, scholar_id: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/citations", base_url.trim_end_matches('/')))
        .map_err(|e| ScholarError::Config(format!("Invalid base URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("user", scholar_id)
        .append_pair("hl", "en");

    Ok(url)
}

/// Everything after the first `citation_for_view=`, or `N/A`.
pub fn article_id_from_url(article_url: &str) -> String {
    if article_url == NOT_AVAILABLE {
        return NOT_AVAILABLE.to_string();
    }
    match article_url.split_once(ARTICLE_ID_MARKER) {
        Some((_, id)) => id.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Scrape all publications listed on a researcher's profile.
///
/// Malformed rows are skipped with a warning. A profile without rows yields
/// an empty list.
///
/// # Errors
///
/// Returns error if navigation fails or a block page is served.
pub async fn parse_publications<S: PageSession>(
    session: &mut S,
    scholar_id: &str,
    options: &ScrapeOptions,
) -> Result<Vec<PublicationRecord>> {
    let url = profile_url(options.scholar_url(), scholar_id)?;
    let html = session.fetch(url.as_str(), options.load_delay).await?;
    ensure_not_blocked(url.as_str(), &html, PROFILE_CONTENT)?;

    let expansions = expand_all(session, options).await;
    let html = if expansions > 0 {
        session.content().await?
    } else {
        html
    };
    ensure_not_blocked(url.as_str(), &html, PROFILE_CONTENT)?;

    let mut records = Vec::new();
    for (index, row) in parse_publication_rows(scholar_id, &html)?.into_iter().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => warn!(scholar_id = %scholar_id, row = index, error = %e, "Skipping malformed row"),
        }
    }

    info!(scholar_id = %scholar_id, count = records.len(), expansions, "Parsed publications");
    Ok(records)
}

/// Click "show more" until it stops responding or the bound is reached.
async fn expand_all<S: PageSession>(session: &mut S, options: &ScrapeOptions) -> usize {
    let mut expansions = 0;
    while expansions < options.max_expansions {
        if !session.expand(SHOW_MORE_ID, options.more_delay).await {
            return expansions;
        }
        expansions += 1;
        debug!(expansions, "Loaded more publications");
    }
    warn!(max = options.max_expansions, "Pagination bound reached, list may be incomplete");
    expansions
}

struct RowSelectors {
    row: Selector,
    title: Selector,
    year: Selector,
    citations: Selector,
    description: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            row: selector("tr.gsc_a_tr")?,
            title: selector("a.gsc_a_at")?,
            year: selector(".gsc_a_hc")?,
            citations: selector(".gsc_a_ac")?,
            description: selector("div.gs_gray")?,
        })
    }
}

/// Parse every publication row of a profile page, in table order.
///
/// The outer error only covers selector construction; each row carries its
/// own result.
pub fn parse_publication_rows(scholar_id: &str, html: &str) -> Result<Vec<Result<PublicationRecord>>> {
    let document = Html::parse_document(html);
    let selectors = RowSelectors::new()?;

    Ok(document
        .select(&selectors.row)
        .map(|row| parse_row(scholar_id, row, &selectors))
        .collect())
}

fn parse_row(scholar_id: &str, row: ElementRef<'_>, sel: &RowSelectors) -> Result<PublicationRecord> {
    let title_link = row.select(&sel.title).next().ok_or_parse("missing title link")?;
    let title = element_text(title_link);
    if title.is_empty() {
        return Err(ScholarError::Parse("empty title".to_string()));
    }

    let year = row.select(&sel.year).next().map(element_text).ok_or_parse("missing year cell")?;
    // Uncited papers render an empty or missing count
    let citations = row.select(&sel.citations).next().map(element_text).unwrap_or_default();

    let mut description = row.select(&sel.description).map(element_text);
    let authors = description.next().ok_or_parse("missing authors line")?;
    let publisher = description.next().ok_or_parse("missing publisher line")?;

    let article_url = title_link
        .value()
        .attr("href")
        .map(str::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let article_id = article_id_from_url(&article_url);

    Ok(PublicationRecord {
        scholar_id: scholar_id.to_string(),
        title,
        authors,
        publisher,
        year,
        citations,
        article_url,
        article_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast_options, profile_page, publication_row, StaticPages};

    #[test]
    fn test_profile_url() -> Result<()> {
        let url = profile_url("https://scholar.google.com/", "X1-abc")?;
        assert_eq!(url.as_str(), "https://scholar.google.com/citations?user=X1-abc&hl=en");
        Ok(())
    }

    #[test]
    fn test_article_id_from_url() {
        assert_eq!(
            article_id_from_url("/citations?view_op=view_citation&hl=en&user=X1&citation_for_view=X1:ABC123"),
            "X1:ABC123"
        );
        assert_eq!(article_id_from_url("N/A"), "N/A");
        assert_eq!(article_id_from_url("/citations?user=X1"), "N/A");
        // Only the first marker splits
        assert_eq!(article_id_from_url("?citation_for_view=a&citation_for_view=b"), "a&citation_for_view=b");
    }

    #[test]
    fn test_parse_row_fields() -> Result<()> {
        let html = profile_page(&[publication_row("Paper1", "2020", "5", "A, B", "Journal Z", Some("ABC123"))]);
        let rows = parse_publication_rows("X1", &html)?;
        assert_eq!(rows.len(), 1);

        let record = rows.into_iter().next().ok_or_parse("no row")??;
        assert_eq!(record.scholar_id, "X1");
        assert_eq!(record.title, "Paper1");
        assert_eq!(record.authors, "A, B");
        assert_eq!(record.publisher, "Journal Z");
        assert_eq!(record.year, "2020");
        assert_eq!(record.citations, "5");
        assert_eq!(record.article_id, "ABC123");
        assert!(record.article_url.ends_with("citation_for_view=ABC123"));
        Ok(())
    }

    #[test]
    fn test_link_without_href_is_not_available() -> Result<()> {
        let row = "<tr class='gsc_a_tr'><td class='gsc_a_t'><a class='gsc_a_at'>No link</a>\
                   <div class='gs_gray'>C</div><div class='gs_gray'>Proc</div></td>\
                   <td class='gsc_a_c'><a class='gsc_a_ac gs_ibl'></a></td>\
                   <td class='gsc_a_y'><span class='gsc_a_h gsc_a_hc gs_ibl'></span></td></tr>";
        let rows = parse_publication_rows("X1", &profile_page(&[row.to_string()]))?;
        let record = rows.into_iter().next().ok_or_parse("no row")??;
        assert_eq!(record.article_url, NOT_AVAILABLE);
        assert_eq!(record.article_id, NOT_AVAILABLE);
        assert_eq!(record.citations, "");
        assert_eq!(record.year, "");
        Ok(())
    }

    #[test]
    fn test_malformed_row_is_error() -> Result<()> {
        let row = "<tr class='gsc_a_tr'><td><a class='gsc_a_at' href='/x?citation_for_view=Q'>T</a>\
                   <div class='gs_gray'>Only authors</div></td>\
                   <td><span class='gsc_a_hc'>2019</span></td></tr>";
        let rows = parse_publication_rows("X1", &profile_page(&[row.to_string()]))?;
        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0], Err(ScholarError::Parse(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_publications_is_empty() -> Result<()> {
        let url = profile_url("https://scholar.google.com", "EMPTY")?;
        let mut session = StaticPages::new().page(url.as_str(), profile_page(&[])).session();

        let records = parse_publications(&mut session, "EMPTY", &fast_options()).await?;
        assert!(records.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped() -> Result<()> {
        let broken = "<tr class='gsc_a_tr'><td>no title here</td></tr>".to_string();
        let html = profile_page(&[
            publication_row("First", "2018", "1", "A", "J1", Some("P1")),
            broken,
            publication_row("Third", "2021", "", "A, C", "J3", Some("P3")),
        ]);
        let url = profile_url("https://scholar.google.com", "X1")?;
        let mut session = StaticPages::new().page(url.as_str(), html).session();

        let records = parse_publications(&mut session, "X1", &fast_options()).await?;
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Third"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_show_more_is_followed() -> Result<()> {
        let first = profile_page(&[publication_row("P1", "2020", "2", "A", "J", Some("ID1"))]);
        let expanded = profile_page(&[
            publication_row("P1", "2020", "2", "A", "J", Some("ID1")),
            publication_row("P2", "2019", "9", "A", "J", Some("ID2")),
        ]);
        let url = profile_url("https://scholar.google.com", "X1")?;
        let mut session = StaticPages::new()
            .page(url.as_str(), first)
            .expansion(expanded)
            .session();

        let records = parse_publications(&mut session, "X1", &fast_options()).await?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].article_id, "ID2");
        Ok(())
    }

    #[tokio::test]
    async fn test_pagination_is_bounded() -> Result<()> {
        let html = profile_page(&[publication_row("P1", "2020", "2", "A", "J", Some("ID1"))]);
        let url = profile_url("https://scholar.google.com", "X1")?;
        let mut session = StaticPages::new().page(url.as_str(), html).always_expand().session();

        let mut options = fast_options();
        options.max_expansions = 4;
        let records = parse_publications(&mut session, "X1", &options).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(session.expand_calls(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_block_wording_in_title_is_kept() -> Result<()> {
        let html = profile_page(&[publication_row(
            "Detecting unusual traffic in campus networks",
            "2021",
            "12",
            "A, B",
            "Computer Networks",
            Some("NET1"),
        )]);
        let url = profile_url("https://scholar.google.com", "X1")?;
        let mut session = StaticPages::new().page(url.as_str(), html).session();

        let records = parse_publications(&mut session, "X1", &fast_options()).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Detecting unusual traffic in campus networks");
        Ok(())
    }

    #[tokio::test]
    async fn test_block_page_is_error() -> Result<()> {
        let url = profile_url("https://scholar.google.com", "X1")?;
        let mut session = StaticPages::new()
            .page(url.as_str(), "<html>Please show you're not a robot: unusual traffic</html>")
            .session();

        let result = parse_publications(&mut session, "X1", &fast_options()).await;
        assert!(matches!(result, Err(ScholarError::Captcha(_))));
        Ok(())
    }
}
