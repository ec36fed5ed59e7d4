//! Field resolution policy for upstream payloads.
//!
//! The Scholar author payload is not contractually stable: the same number can
//! live under several keys depending on the endpoint version. Each
//! [`FieldPolicy`] is a ranked list of JSON pointers; the first location that
//! holds a usable value wins.

use serde_json::Value;

/// Ranked list of locations for one logical field
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy {
    /// Logical field name, used in logs
    pub name: &'static str,
    /// JSON pointers, most preferred first
    pub paths: &'static [&'static str],
}

impl FieldPolicy {
    /// First location holding a parseable, non-negative count.
    pub fn count(&self, value: &Value) -> Option<u64> {
        self.paths
            .iter()
            .filter_map(|p| value.pointer(p))
            .find_map(parse_count)
    }

    /// First location holding a valid (positive) year.
    pub fn year(&self, value: &Value) -> Option<i32> {
        self.paths
            .iter()
            .filter_map(|p| value.pointer(p))
            .find_map(parse_year)
    }

    /// First location holding a non-blank string.
    pub fn text(&self, value: &Value) -> Option<String> {
        self.paths
            .iter()
            .filter_map(|p| value.pointer(p))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// First location holding an array.
    pub fn array<'a>(&self, value: &'a Value) -> Option<&'a Vec<Value>> {
        self.paths
            .iter()
            .filter_map(|p| value.pointer(p))
            .find_map(Value::as_array)
    }
}

/// Citation count of a single work.
pub const WORK_CITATIONS: FieldPolicy = FieldPolicy {
    name: "work.citations",
    paths: &["/cited_by/value", "/cited_by_count", "/citations", "/num_citations"],
};

/// Publication year of a single work.
pub const WORK_YEAR: FieldPolicy = FieldPolicy {
    name: "work.year",
    paths: &["/year", "/publication_year"],
};

pub const WORK_TITLE: FieldPolicy = FieldPolicy {
    name: "work.title",
    paths: &["/title"],
};

pub const WORK_AUTHORS: FieldPolicy = FieldPolicy {
    name: "work.authors",
    paths: &["/authors"],
};

pub const WORK_VENUE: FieldPolicy = FieldPolicy {
    name: "work.venue",
    paths: &["/publication", "/venue"],
};

pub const WORK_LINK: FieldPolicy = FieldPolicy {
    name: "work.link",
    paths: &["/link", "/url"],
};

/// List of works on the payload.
pub const WORKS: FieldPolicy = FieldPolicy {
    name: "works",
    paths: &["/articles", "/papers", "/works"],
};

/// Author-level total citations.
pub const TOTAL_CITATIONS: FieldPolicy = FieldPolicy {
    name: "citations",
    paths: &[
        "/author/cited_by/total",
        "/cited_by/total",
        "/author/cited_by_total",
        "/citations",
        "/cited_by/table/0/citations/all",
    ],
};

pub const H_INDEX: FieldPolicy = FieldPolicy {
    name: "h_index",
    paths: &[
        "/author/indices/h_index",
        "/h_index",
        "/author/h_index",
        "/indices/h_index",
        "/cited_by/table/1/h_index/all",
    ],
};

pub const I10_INDEX: FieldPolicy = FieldPolicy {
    name: "i10_index",
    paths: &[
        "/author/indices/i10_index",
        "/i10_index",
        "/author/i10_index",
        "/indices/i10_index",
        "/cited_by/table/2/i10_index/all",
    ],
};

/// Per-year citation graph.
pub const CITATION_GRAPH: FieldPolicy = FieldPolicy {
    name: "graph",
    paths: &["/author/cited_by/graph", "/cited_by/graph", "/graph"],
};

pub const AUTHOR_NAME: FieldPolicy = FieldPolicy {
    name: "author_name",
    paths: &["/author/name", "/author_name", "/name"],
};

pub const AUTHOR_AFFILIATION: FieldPolicy = FieldPolicy {
    name: "author_affiliation",
    paths: &[
        "/author/affiliations/0",
        "/author/affiliations",
        "/author_affiliation",
    ],
};

/// Leading run of ASCII digits, after dropping thousands separators.
fn leading_digits(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}

/// Parse a count from a JSON number or numeric string.
///
/// Negative numbers and non-numeric strings yield `None`.
pub fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            let digits = leading_digits(&cleaned);
            if digits.is_empty() {
                None
            } else {
                digits.parse().ok()
            }
        }
        _ => None,
    }
}

/// Parse a year from a JSON number or string; only positive years are valid.
pub fn parse_year(value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => {
            let digits = leading_digits(s.trim());
            if digits.is_empty() {
                return None;
            }
            digits.parse::<i64>().ok()?
        }
        _ => return None,
    };
    i32::try_from(year).ok().filter(|y| *y > 0)
}
