//! Two-phase scrape pipeline.
//!
//! Phase 1 collects every researcher's publications in one browser session.
//! Phase 2 restarts the browser and collects the citation history of every
//! publication. The fragments are then joined into the output table.

use crate::article::{parse_citation_history, CitationHistory, CitationYearRecord};
use crate::browser::{PageSession, SessionLauncher};
use crate::error::Result;
use crate::join::{join_tables, JoinedRow};
use crate::options::ScrapeOptions;
use crate::profile::{parse_publications, PublicationRecord};
use crate::roster::ResearcherRef;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub researchers: usize,
    pub failed_researchers: usize,
    pub publications: usize,
    pub articles_with_history: usize,
    pub articles_without_histogram: usize,
    pub failed_articles: usize,
    pub citation_records: usize,
    pub joined_rows: usize,
}

/// Result of [`run`]
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub rows: Vec<JoinedRow>,
    pub stats: RunStats,
}

fn progress_bar(len: usize, message: &'static str, options: &ScrapeOptions) -> ProgressBar {
    if !options.show_progress {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta})") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar
}

/// Scrape all researchers and return the joined table.
///
/// Per-researcher and per-article failures are logged and skipped.
///
/// # Errors
///
/// Returns error only if a browser session cannot be launched. A session
/// that fails to close is logged and left behind.
pub async fn run<L: SessionLauncher>(
    launcher: &L,
    researchers: &[ResearcherRef],
    options: &ScrapeOptions,
) -> Result<PipelineOutput> {
    let mut stats = RunStats {
        researchers: researchers.len(),
        ..RunStats::default()
    };

    let mut session = launcher.launch().await?;
    let publications = collect_publications(&mut session, researchers, options, &mut stats).await;
    close_session(session, "publications").await;

    let mut session = launcher.launch().await?;
    let citations = collect_citations(&mut session, &publications, options, &mut stats).await;
    close_session(session, "citations").await;

    let rows = join_tables(&citations, &publications, researchers);
    stats.joined_rows = rows.len();
    info!(
        publications = stats.publications,
        citation_records = stats.citation_records,
        rows = stats.joined_rows,
        "Pipeline complete"
    );

    Ok(PipelineOutput { rows, stats })
}

async fn close_session<S: PageSession>(session: S, phase: &'static str) {
    if let Err(e) = session.close().await {
        warn!(phase, error = %e, "Failed to close browser session");
    }
}

/// Phase 1: publication tables in researcher order.
async fn collect_publications<S: PageSession>(
    session: &mut S,
    researchers: &[ResearcherRef],
    options: &ScrapeOptions,
    stats: &mut RunStats,
) -> Vec<PublicationRecord> {
    let bar = progress_bar(researchers.len(), "Getting publication data", options);
    let mut publications = Vec::new();

    for researcher in researchers {
        info!(scholar_id = %researcher.scholar_id, name = %researcher.display_name, "Scraping profile");
        match parse_publications(session, &researcher.scholar_id, options).await {
            Ok(records) => publications.extend(records),
            Err(e) => {
                stats.failed_researchers += 1;
                error!(scholar_id = %researcher.scholar_id, error = %e, "Failed to scrape profile");
            }
        }
        bar.inc(1);
    }

    bar.finish_and_clear();
    stats.publications = publications.len();
    publications
}

/// Phase 2: citation histories in publication order.
async fn collect_citations<S: PageSession>(
    session: &mut S,
    publications: &[PublicationRecord],
    options: &ScrapeOptions,
    stats: &mut RunStats,
) -> Vec<CitationYearRecord> {
    let bar = progress_bar(publications.len(), "Getting citation data per article", options);
    let mut citations = Vec::new();

    for publication in publications {
        let history =
            parse_citation_history(session, &publication.article_id, &publication.article_url, options).await;
        match &history {
            CitationHistory::Counts(_) => stats.articles_with_history += 1,
            CitationHistory::NoHistogram => stats.articles_without_histogram += 1,
            CitationHistory::Failed(_) => stats.failed_articles += 1,
        }
        citations.extend(history.into_records(&publication.article_id));
        bar.inc(1);
    }

    bar.finish_and_clear();
    stats.citation_records = citations.len();
    citations
}
