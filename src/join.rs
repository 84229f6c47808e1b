//! Final relational join.
//!
//! `citations ⋈ publications` on `article_id`, then `⋈ researchers` on
//! `scholar_id`, both inner joins. Rows without a counterpart are dropped,
//! and the `N/A` placeholder never matches anything. Extra roster columns
//! follow `NAMA` in the output.

use crate::article::CitationYearRecord;
use crate::profile::{PublicationRecord, NOT_AVAILABLE};
use crate::roster::ResearcherRef;
use std::collections::HashMap;

/// CSV column order for the joined output
pub const JOINED_COLUMNS: &[&str] = &[
    "article_id",
    "year",
    "num_of_citations",
    "scholar_id",
    "title",
    "authors",
    "publisher",
    "publication_year",
    "total_citations",
    "article_url",
    "NAMA",
];

/// Suffix for a roster column whose name clashes with a fixed column
const ROSTER_SUFFIX: &str = "_roster";

/// One output row: a citation year with its publication and researcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinedRow {
    pub article_id: String,
    /// Year the citations were received
    pub year: String,
    pub num_of_citations: u64,
    pub scholar_id: String,
    pub title: String,
    pub authors: String,
    pub publisher: String,
    /// Year the article was published
    pub publication_year: String,
    /// Raw "Cited by" value from the profile
    pub total_citations: String,
    pub article_url: String,
    /// Written as `NAMA`
    pub display_name: String,
    /// Roster columns other than `NAMA` and `scholar_id`
    pub extra: Vec<(String, String)>,
}

impl JoinedRow {
    /// Field values in [`joined_header`] order.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.article_id.clone(),
            self.year.clone(),
            self.num_of_citations.to_string(),
            self.scholar_id.clone(),
            self.title.clone(),
            self.authors.clone(),
            self.publisher.clone(),
            self.publication_year.clone(),
            self.total_citations.clone(),
            self.article_url.clone(),
            self.display_name.clone(),
        ];
        record.extend(self.extra.iter().map(|(_, value)| value.clone()));
        record
    }
}

/// Output header: [`JOINED_COLUMNS`] then the roster's extra columns.
///
/// Every row comes from the same roster, so the first row names the extras.
pub fn joined_header(rows: &[JoinedRow]) -> Vec<String> {
    let mut header: Vec<String> = JOINED_COLUMNS.iter().map(|c| c.to_string()).collect();
    if let Some(first) = rows.first() {
        for (name, _) in &first.extra {
            if JOINED_COLUMNS.contains(&name.as_str()) {
                header.push(format!("{}{}", name, ROSTER_SUFFIX));
            } else {
                header.push(name.clone());
            }
        }
    }
    header
}

/// Group rows by key, keeping input order within each group.
fn index_by<'a, T>(items: &'a [T], key: impl Fn(&T) -> &str) -> HashMap<&'a str, Vec<&'a T>> {
    let mut index: HashMap<&str, Vec<&T>> = HashMap::new();
    for item in items {
        let k = key(item);
        if k != NOT_AVAILABLE {
            index.entry(k).or_default().push(item);
        }
    }
    index
}

/// Join the three tables. Output follows citation order; duplicate keys on
/// the right fan out in their own order.
pub fn join_tables(
    citations: &[CitationYearRecord],
    publications: &[PublicationRecord],
    researchers: &[ResearcherRef],
) -> Vec<JoinedRow> {
    let by_article = index_by(publications, |p| p.article_id.as_str());
    let by_scholar = index_by(researchers, |r| r.scholar_id.as_str());

    let mut rows = Vec::new();
    for citation in citations {
        let Some(matches) = by_article.get(citation.article_id.as_str()) else {
            continue;
        };
        for publication in matches {
            let Some(owners) = by_scholar.get(publication.scholar_id.as_str()) else {
                continue;
            };
            for researcher in owners {
                rows.push(JoinedRow {
                    article_id: citation.article_id.clone(),
                    year: citation.year.clone(),
                    num_of_citations: citation.num_of_citations,
                    scholar_id: publication.scholar_id.clone(),
                    title: publication.title.clone(),
                    authors: publication.authors.clone(),
                    publisher: publication.publisher.clone(),
                    publication_year: publication.year.clone(),
                    total_citations: publication.citations.clone(),
                    article_url: publication.article_url.clone(),
                    display_name: researcher.display_name.clone(),
                    extra: researcher.extra.clone(),
                });
            }
        }
    }
    rows
}
