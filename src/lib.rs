//! # gscholar-metrics
//!
//! Google Scholar profile scraper - publication lists and per-year citation counts
//!
//! ## Modules
//!
//! - [`roster`] - Researcher roster loading and sampling
//! - [`browser`] - Headless Chrome sessions
//! - [`profile`] - Publication table scraping
//! - [`article`] - Per-article citation histograms
//! - [`join`] - Final relational join
//! - [`pipeline`] - Two-phase orchestration
//! - [`export`] - CSV output and preview
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gscholar_metrics::browser::{BrowserOptions, ChromeLauncher};
//! use gscholar_metrics::{pipeline, roster, ScrapeOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let researchers = roster::load_roster("dosen.xlsx".as_ref())?;
//!     let launcher = ChromeLauncher::new(BrowserOptions::default());
//!     let output = pipeline::run(&launcher, &researchers, &ScrapeOptions::default()).await?;
//!     println!("Joined {} rows", output.rows.len());
//!     Ok(())
//! }
//! ```

pub mod article;
pub mod browser;
pub mod error;
pub mod export;
mod html;
pub mod join;
pub mod options;
pub mod pipeline;
pub mod profile;
pub mod roster;

#[cfg(test)]
mod testing;

pub use error::{Result, ScholarError};
pub use options::ScrapeOptions;
