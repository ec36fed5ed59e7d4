//! Normalization of raw strategy payloads into [`AuthorMetrics`].
//!
//! Normalization runs in two phases. [`extract`] reads a payload through the
//! field policies in [`crate::fields`] and keeps explicit upstream values as
//! `Option`s, so "absent" stays distinguishable from "zero". [`Extracted::finalize`]
//! then derives what is missing (indices, yearly series, totals) and fixes the
//! ordering of every sequence. Merging across sources happens between the two.

use crate::fields::{self, parse_count, parse_year};
use crate::models::{AuthorMetrics, Paper, YearCitations};
use crate::strategy::RawPayload;
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Number of title characters compared when deduplicating works across sources.
pub const TITLE_KEY_CHARS: usize = 50;

/// Citation threshold for the i10-index.
const I10_THRESHOLD: u64 = 10;

/// Values read from one or more payloads, before derivation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub author_name: Option<String>,
    pub author_affiliation: Option<String>,
    /// Explicit author-level total
    pub total_citations: Option<u64>,
    /// Explicit h-index from the source
    pub h_index: Option<u64>,
    /// Explicit i10-index from the source
    pub i10_index: Option<u64>,
    /// Yearly series as found upstream; `None` when no usable graph exists
    pub graph: Option<Vec<YearCitations>>,
    pub papers: Vec<Paper>,
    /// Strategy ids that contributed, in preference order
    pub sources: Vec<String>,
}

/// Read everything the policies can find on a payload.
pub fn extract(payload: &RawPayload) -> Extracted {
    let body = &payload.body;

    let papers: Vec<Paper> = match fields::WORKS.array(body) {
        Some(works) => works.iter().map(extract_paper).collect(),
        None => {
            debug!(source = %payload.source, field = fields::WORKS.name, "Field not found");
            Vec::new()
        }
    };

    let graph = fields::CITATION_GRAPH
        .array(body)
        .map(|entries| entries.iter().filter_map(extract_graph_entry).collect::<Vec<_>>())
        .filter(|entries| !entries.is_empty());
    if graph.is_none() {
        debug!(
            source = %payload.source,
            field = fields::CITATION_GRAPH.name,
            "No usable series, deriving from works"
        );
    }

    let extracted = Extracted {
        author_name: fields::AUTHOR_NAME.text(body),
        author_affiliation: fields::AUTHOR_AFFILIATION.text(body),
        total_citations: fields::TOTAL_CITATIONS.count(body),
        h_index: fields::H_INDEX.count(body),
        i10_index: fields::I10_INDEX.count(body),
        graph,
        papers,
        sources: vec![payload.source.clone()],
    };

    debug!(
        source = %payload.source,
        works = extracted.papers.len(),
        total = ?extracted.total_citations,
        h_index = ?extracted.h_index,
        i10_index = ?extracted.i10_index,
        graph_years = extracted.graph.as_ref().map_or(0, Vec::len),
        "Extracted payload"
    );

    extracted
}

fn extract_paper(work: &Value) -> Paper {
    let title = fields::WORK_TITLE.text(work).unwrap_or_default();
    let citations = fields::WORK_CITATIONS.count(work).unwrap_or(0);
    let year = fields::WORK_YEAR.year(work);

    let mut paper = Paper::new(title, citations, year);
    paper.authors = fields::WORK_AUTHORS.text(work);
    paper.venue = fields::WORK_VENUE.text(work);
    paper.link = fields::WORK_LINK.text(work);
    paper
}

fn extract_graph_entry(entry: &Value) -> Option<YearCitations> {
    let year = entry.get("year").and_then(parse_year)?;
    let citations = entry.get("citations").and_then(parse_count).unwrap_or(0);
    Some(YearCitations { year, citations })
}

/// Dedup key: lowercased, whitespace-collapsed title prefix.
pub fn title_key(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .take(TITLE_KEY_CHARS)
        .collect()
}

impl Extracted {
    /// Fold a lower-preference source into this one.
    ///
    /// Scalars keep the value from `self` when present. Works from `other`
    /// are appended only if their title key is not already known.
    pub fn merge(mut self, other: Extracted) -> Self {
        self.author_name = self.author_name.or(other.author_name);
        self.author_affiliation = self.author_affiliation.or(other.author_affiliation);
        // an explicit zero total counts as absent, same as in finalize
        self.total_citations = self
            .total_citations
            .filter(|t| *t > 0)
            .or(other.total_citations);
        self.h_index = self.h_index.or(other.h_index);
        self.i10_index = self.i10_index.or(other.i10_index);
        self.graph = self.graph.or(other.graph);

        let mut seen: HashSet<String> = self.papers.iter().map(|p| title_key(&p.title)).collect();
        let before = self.papers.len();
        for paper in other.papers {
            if seen.insert(title_key(&paper.title)) {
                self.papers.push(paper);
            }
        }
        debug!(added = self.papers.len() - before, "Merged works from secondary source");

        self.sources.extend(other.sources);
        self
    }

    /// Derive missing fields and produce the final record.
    pub fn finalize(self) -> AuthorMetrics {
        let mut papers = self.papers;

        let mut counts: Vec<u64> = papers
            .iter()
            .map(|p| p.citations)
            .filter(|c| *c > 0)
            .collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));

        let derived_h = h_index(&counts);
        let derived_i10 = i10_index(&counts);
        debug!(
            citation_counts = ?counts,
            h_index = derived_h,
            i10_index = derived_i10,
            "Derived indices from works"
        );

        let citations_by_year = match self.graph {
            Some(graph) => citations_by_year(graph),
            None => series_from_papers(&papers),
        };

        let citation_count = match self.total_citations {
            Some(total) if total > 0 => total,
            _ => citations_by_year
                .iter()
                .map(|y| y.citations)
                .fold(0u64, u64::saturating_add),
        };

        sort_papers(&mut papers);

        AuthorMetrics {
            citation_count,
            publication_count: papers.len() as u64,
            h_index: self.h_index.unwrap_or(derived_h),
            i10_index: self.i10_index.unwrap_or(derived_i10),
            citations_by_year,
            papers,
            author_name: self.author_name.unwrap_or_default(),
            author_affiliation: self.author_affiliation.unwrap_or_default(),
            data_source: self.sources.join("+"),
        }
    }
}

/// Normalize a single payload.
pub fn normalize(payload: &RawPayload) -> AuthorMetrics {
    extract(payload).finalize()
}

/// Classic h-index over citation counts sorted in descending order.
pub fn h_index(sorted_desc: &[u64]) -> u64 {
    sorted_desc
        .iter()
        .zip(1u64..)
        .take_while(|(count, rank)| **count >= *rank)
        .last()
        .map_or(0, |(_, rank)| rank)
}

/// Number of works with at least ten citations.
pub fn i10_index(counts: &[u64]) -> u64 {
    counts.iter().filter(|c| **c >= I10_THRESHOLD).count() as u64
}

/// Ascending, duplicate-free yearly series. The first entry for a year wins.
pub fn citations_by_year(graph: Vec<YearCitations>) -> Vec<YearCitations> {
    let mut by_year: BTreeMap<i32, u64> = BTreeMap::new();
    for entry in graph.into_iter().filter(|e| e.year > 0) {
        by_year.entry(entry.year).or_insert(entry.citations);
    }
    by_year
        .into_iter()
        .map(|(year, citations)| YearCitations { year, citations })
        .collect()
}

/// Group papers with a known year and sum their citations.
pub fn series_from_papers(papers: &[Paper]) -> Vec<YearCitations> {
    let mut by_year: BTreeMap<i32, u64> = BTreeMap::new();
    for paper in papers {
        if let Some(year) = paper.year.filter(|y| *y > 0) {
            let total = by_year.entry(year).or_insert(0);
            *total = total.saturating_add(paper.citations);
        }
    }
    by_year
        .into_iter()
        .map(|(year, citations)| YearCitations { year, citations })
        .collect()
}

/// Citations descending, then year descending (unknown year sorts as 0).
pub fn sort_papers(papers: &mut [Paper]) {
    papers.sort_by_key(|p| (Reverse(p.citations), Reverse(p.year.unwrap_or(0))));
}
