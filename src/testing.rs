//! In-memory sessions serving canned HTML, for tests.

use crate::browser::{PageSession, SessionLauncher};
use crate::error::{Result, ScholarError};
use crate::options::ScrapeOptions;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Options with no settle delays and no progress bars.
pub(crate) fn fast_options() -> ScrapeOptions {
    ScrapeOptions {
        load_delay: Duration::ZERO,
        more_delay: Duration::ZERO,
        show_progress: false,
        ..ScrapeOptions::default()
    }
}

/// A profile table row in Google Scholar's markup.
pub(crate) fn publication_row(
    title: &str,
    year: &str,
    citations: &str,
    authors: &str,
    publisher: &str,
    article_id: Option<&str>,
) -> String {
    let href = article_id
        .map(|id| {
            format!(
                " href=\"/citations?view_op=view_citation&amp;hl=en&amp;user=X&amp;citation_for_view={}\"",
                id
            )
        })
        .unwrap_or_default();
    format!(
        "<tr class=\"gsc_a_tr\"><td class=\"gsc_a_t\"><a class=\"gsc_a_at\"{}>{}</a>\
         <div class=\"gs_gray\">{}</div><div class=\"gs_gray\">{}</div></td>\
         <td class=\"gsc_a_c\"><a class=\"gsc_a_ac gs_ibl\">{}</a></td>\
         <td class=\"gsc_a_y\"><span class=\"gsc_a_h gsc_a_hc gs_ibl\">{}</span></td></tr>",
        href, title, authors, publisher, citations, year
    )
}

/// A profile page wrapping the given rows.
pub(crate) fn profile_page(rows: &[String]) -> String {
    format!(
        "<html><body><table id=\"gsc_a_t\"><tbody id=\"gsc_a_b\">{}</tbody></table></body></html>",
        rows.concat()
    )
}

/// An article page whose histogram has the given year labels and bar labels.
pub(crate) fn article_page(years: &[&str], counts: &[&str]) -> String {
    let labels: String = years
        .iter()
        .map(|y| format!("<span class=\"gsc_oci_g_t\">{}</span>", y))
        .collect();
    let bars: String = counts
        .iter()
        .map(|c| {
            format!(
                "<a href=\"#\" class=\"gsc_oci_g_a\"><span class=\"gsc_oci_g_al\">{}</span></a>",
                c
            )
        })
        .collect();
    format!(
        "<html><body><div id=\"gsc_oci_graph\"><div id=\"gsc_oci_graph_bars\">{}{}</div></div></body></html>",
        labels, bars
    )
}

/// Builder for canned pages keyed by URL.
#[derive(Debug, Clone, Default)]
pub(crate) struct StaticPages {
    pages: HashMap<String, String>,
    expansions: Vec<String>,
    always_expand: bool,
    failing_close: bool,
}

impl StaticPages {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// Document shown after the next successful "show more" click.
    pub(crate) fn expansion(mut self, html: impl Into<String>) -> Self {
        self.expansions.push(html.into());
        self
    }

    /// Every "show more" poll reports a click.
    pub(crate) fn always_expand(mut self) -> Self {
        self.always_expand = true;
        self
    }

    /// Closing a session reports a crashed browser.
    pub(crate) fn failing_close(mut self) -> Self {
        self.failing_close = true;
        self
    }

    pub(crate) fn session(&self) -> StaticSession {
        StaticSession {
            pages: self.pages.clone(),
            expansions: self.expansions.iter().cloned().collect(),
            always_expand: self.always_expand,
            failing_close: self.failing_close,
            current: String::new(),
            visited: Vec::new(),
            expand_calls: 0,
            closed: None,
        }
    }
}

/// Session that serves [`StaticPages`]; unknown URLs fail to navigate.
pub(crate) struct StaticSession {
    pages: HashMap<String, String>,
    expansions: VecDeque<String>,
    always_expand: bool,
    failing_close: bool,
    current: String,
    visited: Vec<String>,
    expand_calls: usize,
    closed: Option<Arc<AtomicUsize>>,
}

impl StaticSession {
    pub(crate) fn expand_calls(&self) -> usize {
        self.expand_calls
    }

    pub(crate) fn visited(&self) -> &[String] {
        &self.visited
    }
}

#[async_trait]
impl PageSession for StaticSession {
    async fn fetch(&mut self, url: &str, _settle: Duration) -> Result<String> {
        self.visited.push(url.to_string());
        let html = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScholarError::Browser(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)))?;
        self.current = html.clone();
        Ok(html)
    }

    async fn expand(&mut self, _element_id: &str, _settle: Duration) -> bool {
        self.expand_calls += 1;
        match self.expansions.pop_front() {
            Some(next) => {
                self.current = next;
                true
            }
            None => self.always_expand,
        }
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn close(self) -> Result<()> {
        if let Some(closed) = self.closed {
            closed.fetch_add(1, Ordering::SeqCst);
        }
        if self.failing_close {
            return Err(ScholarError::Browser("browser process exited".to_string()));
        }
        Ok(())
    }
}

/// Launcher handing out [`StaticSession`]s and counting their lifecycle.
pub(crate) struct StaticLauncher {
    pages: StaticPages,
    launched: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl StaticLauncher {
    pub(crate) fn new(pages: StaticPages) -> Self {
        Self {
            pages,
            launched: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for StaticLauncher {
    type Session = StaticSession;

    async fn launch(&self) -> Result<StaticSession> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        let mut session = self.pages.session();
        session.closed = Some(Arc::clone(&self.closed));
        Ok(session)
    }
}
