//! Google Scholar profile page scraping.
//!
//! Fetches the public `citations?user=` page and rebuilds the author payload
//! in the same shape the structured API uses, so normalization does not care
//! which strategy produced it. Only values actually found on the page are
//! written into the payload.

use super::{DataSourceStrategy, RawPayload};
use crate::error::{MetricsError, Result};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use url::Url;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Rows requested per profile page (Scholar's maximum)
const PAGE_SIZE: &str = "100";

/// Profile page scraping strategy
#[derive(Debug, Clone)]
pub struct ProfileScrapeStrategy {
    client: reqwest::Client,
    base_url: String,
}

impl ProfileScrapeStrategy {
    /// Create a new scraper
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (carries the timeout and proxy)
    /// * `base_url` - Custom base URL for mirror sites
    pub fn new(client: reqwest::Client, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SCHOLAR_URL.to_string());
        Self { client, base_url }
    }

    fn profile_url(&self, author_id: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/citations", self.base_url))
            .map_err(|e| MetricsError::Config(format!("Invalid base URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("user", author_id)
            .append_pair("hl", "en") // Force English locale for consistent parsing
            .append_pair("cstart", "0")
            .append_pair("pagesize", PAGE_SIZE);

        Ok(url)
    }

    async fn fetch_page(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.as_str())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricsError::from_status(status, "Google Scholar"));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl DataSourceStrategy for ProfileScrapeStrategy {
    fn id(&self) -> &str {
        "scrape"
    }

    async fn fetch_raw(&self, author_id: &str) -> Result<RawPayload> {
        if author_id.trim().is_empty() {
            return Err(MetricsError::Validation("author id is empty".to_string()));
        }

        let url = self.profile_url(author_id)?;
        info!(author_id, url = %url, "Scraping Scholar profile");

        let html = self.fetch_page(&url).await?;

        if html.contains("Solving the above CAPTCHA") || html.contains("unusual traffic") {
            warn!(author_id, "CAPTCHA detected");
            return Err(MetricsError::Captcha);
        }

        let body = parse_profile(&html, &self.base_url)?;
        Ok(RawPayload::new(self.id(), body))
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| MetricsError::Parse(e.to_string()))
}

fn regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| MetricsError::Parse(e.to_string()))
}

fn element_text(elem: ElementRef<'_>) -> String {
    elem.text().collect::<String>().trim().to_string()
}

/// Parse a Scholar profile page into an author payload.
///
/// # Arguments
///
/// * `html` - Raw HTML of the profile page
/// * `base_url` - Used to absolutize relative article links
///
/// # Errors
///
/// Returns a parse error when the page carries none of the profile markers
/// (name, stats table, article rows).
pub fn parse_profile(html: &str, base_url: &str) -> Result<Value> {
    let document = Html::parse_document(html);

    let name_selector = selector("#gsc_prf_in")?;
    let affiliation_selector = selector(".gsc_prf_il")?;
    let stat_selector = selector("#gsc_rsb_st td.gsc_rsb_std")?;
    let row_selector = selector("tr.gsc_a_tr")?;

    let mut author = Map::new();
    let mut markers = 0usize;

    if let Some(name) = document.select(&name_selector).next().map(element_text) {
        markers += 1;
        if !name.is_empty() {
            author.insert("name".into(), json!(name));
        }
    }

    if let Some(affiliation) = document
        .select(&affiliation_selector)
        .next()
        .map(element_text)
        .filter(|a| !a.is_empty())
    {
        author.insert("affiliations".into(), json!([affiliation]));
    }

    // Stats table: [citations all, since], [h-index all, since], [i10 all, since]
    let stats: Vec<String> = document.select(&stat_selector).map(element_text).collect();
    if !stats.is_empty() {
        markers += 1;
    }
    let stat = |idx: usize| stats.get(idx).filter(|s| !s.is_empty()).map(|s| json!(s));

    let mut cited_by = Map::new();
    if let Some(total) = stat(0) {
        cited_by.insert("total".into(), total);
    }
    let graph = parse_graph(&document)?;
    if !graph.is_empty() {
        cited_by.insert("graph".into(), Value::Array(graph));
    }
    if !cited_by.is_empty() {
        author.insert("cited_by".into(), Value::Object(cited_by));
    }

    let mut indices = Map::new();
    if let Some(h) = stat(2) {
        indices.insert("h_index".into(), h);
    }
    if let Some(i10) = stat(4) {
        indices.insert("i10_index".into(), i10);
    }
    if !indices.is_empty() {
        author.insert("indices".into(), Value::Object(indices));
    }

    let articles: Vec<Value> = document
        .select(&row_selector)
        .map(|row| parse_article_row(row, base_url))
        .collect::<Result<_>>()?;
    if !articles.is_empty() {
        markers += 1;
    }

    if markers == 0 {
        return Err(MetricsError::Parse(
            "page has no Scholar profile markers".to_string(),
        ));
    }

    debug!(
        articles = articles.len(),
        stats = stats.len(),
        "Parsed Scholar profile"
    );

    Ok(json!({
        "author": Value::Object(author),
        "articles": articles,
    }))
}

/// Extract one `tr.gsc_a_tr` paper row.
fn parse_article_row(row: ElementRef<'_>, base_url: &str) -> Result<Value> {
    let title_selector = selector("a.gsc_a_at")?;
    let gray_selector = selector("div.gs_gray")?;
    let cite_selector = selector("a.gsc_a_ac")?;
    let year_selector = selector(".gsc_a_h")?;
    let trailing_year = regex(r",\s*(19|20)\d{2}\s*$")?;

    let mut article = Map::new();

    if let Some(link) = row.select(&title_selector).next() {
        article.insert("title".into(), json!(element_text(link)));
        if let Some(href) = link.value().attr("href").filter(|h| !h.is_empty()) {
            article.insert("link".into(), json!(absolute_link(base_url, href)));
        }
    }

    let mut gray = row.select(&gray_selector).map(element_text);
    if let Some(authors) = gray.next().filter(|a| !a.is_empty()) {
        article.insert("authors".into(), json!(authors));
    }
    if let Some(venue) = gray.next() {
        let venue = trailing_year.replace(&venue, "").trim().to_string();
        if !venue.is_empty() {
            article.insert("publication".into(), json!(venue));
        }
    }

    if let Some(cites) = row
        .select(&cite_selector)
        .next()
        .map(element_text)
        .filter(|c| !c.is_empty())
    {
        article.insert("cited_by".into(), json!({ "value": cites }));
    }

    if let Some(year) = row
        .select(&year_selector)
        .next()
        .map(element_text)
        .filter(|y| !y.is_empty())
    {
        article.insert("year".into(), json!(year));
    }

    Ok(Value::Object(article))
}

/// Rebuild the per-year bar chart.
///
/// Years without citations have no bar. Each bar's `z-index` counts from the
/// right edge of the chart, which places it against the year labels; bars
/// without a `z-index` fall back to positional order.
fn parse_graph(document: &Html) -> Result<Vec<Value>> {
    let year_selector = selector(".gsc_g_t")?;
    let bar_selector = selector(".gsc_g_a")?;
    let count_selector = selector(".gsc_g_al")?;
    let z_index = regex(r"z-index:\s*(\d+)")?;

    let years: Vec<String> = document.select(&year_selector).map(element_text).collect();
    if years.is_empty() {
        return Ok(Vec::new());
    }

    let mut counts: Vec<Option<String>> = vec![None; years.len()];
    for (position, bar) in document.select(&bar_selector).enumerate() {
        let count = bar
            .select(&count_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let slot = bar
            .value()
            .attr("style")
            .and_then(|style| z_index.captures(style))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .and_then(|z| years.len().checked_sub(z))
            .unwrap_or(position);

        if let Some(entry) = counts.get_mut(slot) {
            *entry = Some(count);
        }
    }

    Ok(years
        .into_iter()
        .zip(counts)
        .map(|(year, count)| {
            json!({
                "year": year,
                "citations": count.unwrap_or_else(|| "0".to_string()),
            })
        })
        .collect())
}

fn absolute_link(base_url: &str, href: &str) -> String {
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
