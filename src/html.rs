//! Small helpers shared by the profile and article parsers.

use crate::error::{Result, ScholarError};
use scraper::{ElementRef, Selector};

/// Compile a CSS selector, mapping failures into a parse error.
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScholarError::Parse(format!("selector '{}': {}", css, e)))
}

/// Concatenated text content of an element, trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
