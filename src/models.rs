//! Normalized output records.
//!
//! Field names follow the JSON contract consumed by the page layer, so the
//! serde renames here are part of the wire format.

use serde::{Deserialize, Serialize};

/// Data source tag used when every strategy failed.
pub const UNAVAILABLE_SOURCE: &str = "unavailable";

/// Title applied to works that arrive without one.
pub const UNTITLED: &str = "Untitled";

/// Citations received in one calendar year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCitations {
    pub year: i32,
    pub citations: u64,
}

/// One scholarly work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Article title, never empty
    pub title: String,
    /// Number of citations
    pub citations: u64,
    /// Publication year, omitted from JSON when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Authors as printed by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    /// Journal/Conference venue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// Link to the work
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Paper {
    /// Create a paper with only title and citations set.
    pub fn new(title: impl Into<String>, citations: u64, year: Option<i32>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };
        Self {
            title,
            citations,
            year,
            authors: None,
            venue: None,
            link: None,
        }
    }
}

/// Normalized citation metrics for one author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorMetrics {
    /// Total citations across all works
    #[serde(rename = "citations")]
    pub citation_count: u64,
    /// Number of known works
    #[serde(rename = "publications")]
    pub publication_count: u64,
    pub h_index: u64,
    pub i10_index: u64,
    /// Ascending by year, unique years
    #[serde(rename = "citationsByYear")]
    pub citations_by_year: Vec<YearCitations>,
    /// Citations descending, then year descending
    pub papers: Vec<Paper>,
    pub author_name: String,
    pub author_affiliation: String,
    /// Which strategy (or strategies) produced the record
    pub data_source: String,
}

impl AuthorMetrics {
    /// Zeroed record returned when no strategy produced data.
    pub fn unavailable() -> Self {
        Self {
            citation_count: 0,
            publication_count: 0,
            h_index: 0,
            i10_index: 0,
            citations_by_year: Vec::new(),
            papers: Vec::new(),
            author_name: String::new(),
            author_affiliation: String::new(),
            data_source: UNAVAILABLE_SOURCE.to_string(),
        }
    }

    /// True when this is the degraded record from total exhaustion.
    pub fn is_unavailable(&self) -> bool {
        self.data_source == UNAVAILABLE_SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unavailable_is_zeroed() {
        let metrics = AuthorMetrics::unavailable();
        assert!(metrics.is_unavailable());
        assert_eq!(metrics.citation_count, 0);
        assert!(metrics.papers.is_empty());
    }

    #[test]
    fn test_wire_field_names() {
        let mut metrics = AuthorMetrics::unavailable();
        metrics.papers.push(Paper::new("A study", 3, None));
        metrics.citations_by_year.push(YearCitations {
            year: 2023,
            citations: 3,
        });

        let value = serde_json::to_value(&metrics).expect("serialize");
        for key in [
            "citations",
            "publications",
            "h_index",
            "i10_index",
            "citationsByYear",
            "papers",
            "author_name",
            "author_affiliation",
            "data_source",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(value["citationsByYear"][0], json!({"year": 2023, "citations": 3}));
        assert!(value["papers"][0].get("year").is_none());
    }

    #[test]
    fn test_blank_title_defaults() {
        assert_eq!(Paper::new("  ", 0, None).title, UNTITLED);
        assert_eq!(Paper::new("Graphs", 0, None).title, "Graphs");
    }
}
