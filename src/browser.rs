//! Headless browser sessions.
//!
//! A [`PageSession`] owns one browser tab. The parsers navigate it with
//! [`PageSession::fetch`], drive pagination with [`PageSession::expand`] and
//! re-read the rendered document with [`PageSession::content`]. Sessions are
//! created by a [`SessionLauncher`], so the pipeline can restart the browser
//! between phases.

use crate::error::{Result, ScholarError};
use crate::html::selector;
use async_trait::async_trait;
use chromiumoxide::browser::HeadlessMode;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use scraper::Html;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Elements that only exist on Google's CAPTCHA and "sorry" pages
const CAPTCHA_SELECTOR: &str = "#gs_captcha_f, #gs_captcha_ccl, form#captcha-form, #recaptcha";

/// Block page wording, trusted only when the page has none of its expected content
const BLOCK_MARKERS: &[&str] = &["Solving the above CAPTCHA", "unusual traffic"];

/// One browser tab that can be navigated and inspected.
#[async_trait]
pub trait PageSession: Send + Sized {
    /// Navigate to `url`, wait `settle`, and return the rendered HTML.
    async fn fetch(&mut self, url: &str, settle: Duration) -> Result<String>;

    /// Click the element with id `element_id` if it exists, is visible and is
    /// enabled, then wait `settle`. Returns whether a click happened; every
    /// failure is reported as `false`.
    async fn expand(&mut self, element_id: &str, settle: Duration) -> bool;

    /// Rendered HTML of the current page, without navigating.
    async fn content(&mut self) -> Result<String>;

    /// Shut the browser down.
    async fn close(self) -> Result<()>;
}

/// Factory for fresh sessions.
#[async_trait]
pub trait SessionLauncher: Sync {
    type Session: PageSession;

    async fn launch(&self) -> Result<Self::Session>;
}

/// Return `Captcha` if `html` is a block page rather than content.
///
/// `content` is a CSS selector for elements the expected page always has.
/// Block wording in page text (a paper title, an abstract) only counts when
/// none of those elements are present.
pub fn ensure_not_blocked(url: &str, html: &str, content: &str) -> Result<()> {
    let document = Html::parse_document(html);
    let has_captcha = document.select(&selector(CAPTCHA_SELECTOR)?).next().is_some();
    let has_content = document.select(&selector(content)?).next().is_some();
    let has_markers = BLOCK_MARKERS.iter().any(|marker| html.contains(marker));

    if has_captcha || (!has_content && has_markers) {
        warn!(url = %url, "CAPTCHA detected");
        return Err(ScholarError::Captcha(url.to_string()));
    }
    Ok(())
}

/// Options for launching Chrome
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    /// Explicit Chrome/Chromium executable; auto-detected when `None`
    pub chrome_executable: Option<PathBuf>,
}

/// Launches headless Chrome through the DevTools protocol.
pub struct ChromeLauncher {
    options: BrowserOptions,
}

impl ChromeLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    /// Chrome flags required for unattended runs
    fn config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .headless_mode(HeadlessMode::True)
            .no_sandbox()
            .incognito()
            .arg("--ignore-certificate-errors");

        if let Some(path) = &self.options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(ScholarError::Browser)
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        let (browser, mut handler) = Browser::launch(self.config()?).await?;

        // The handler must be polled for any command on the browser to complete
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        info!("Browser session started");

        Ok(ChromeSession {
            browser,
            page,
            handler_task,
        })
    }
}

/// A running Chrome instance with a single tab.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

/// Clicks a visible, enabled element by id and reports whether it did.
fn click_script(element_id: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.getElementById({:?});
    if (!el || el.disabled || el.offsetParent === null) return false;
    el.click();
    return true;
}})()"#,
        element_id
    )
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn fetch(&mut self, url: &str, settle: Duration) -> Result<String> {
        debug!(url = %url, "Navigating");
        self.page.goto(url).await?;
        tokio::time::sleep(settle).await;
        self.content().await
    }

    async fn expand(&mut self, element_id: &str, settle: Duration) -> bool {
        let clicked = match self.page.evaluate(click_script(element_id)).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(e) => {
                debug!(element = element_id, error = %e, "Expand script failed");
                false
            }
        };

        if clicked {
            tokio::time::sleep(settle).await;
        }
        clicked
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        self.handler_task.abort();
        info!("Browser session closed");
        Ok(())
    }
}
