//! Listing pagination: walk the result pages of one filter path and gather book records.
//!
//! A page is the last one when it shows the "no results" notice, holds no entry fragments, or
//! has no next-page link. Independently of that, at most `max_pages` pages are fetched.

use crate::export::{assemble, ExportTable};
use crate::model::{BookRecord, FilterPath};
use crate::scraper::catalog::{Catalog, Markers};
use crate::scraper::error::{PaginationError, PaginationFailure, ParseError};
use crate::scraper::record::{element_text, parse_entry};
use crate::scraper::{CancelToken, PageSource};
use reqwest::Url;
use scraper::Html;

/// Safety cap on pages fetched per collection run.
pub const DEFAULT_MAX_PAGES: u32 = 200;

/// What to do with an entry that lacks a title or detail link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Log it and keep going (default).
    #[default]
    Skip,
    /// Stop the run with a [PaginationError] carrying the rows gathered so far.
    Abort,
}

/// Progress after each collected page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectProgress {
    /// 1-based index of the page just processed.
    pub page: u32,
    pub rows: usize,
    pub skipped: usize,
    /// Total result count announced by the site, when the first page carries one.
    pub total_results: Option<u64>,
}

/// Options for a collection run: safety cap, parse policy, cancellation, progress.
pub struct CollectOptions<'a> {
    pub max_pages: u32,
    pub parse_policy: ParsePolicy,
    pub cancel: Option<&'a CancelToken>,
    pub progress: Option<&'a dyn Fn(&CollectProgress)>,
}

impl Default for CollectOptions<'_> {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            parse_policy: ParsePolicy::Skip,
            cancel: None,
            progress: None,
        }
    }
}

/// One parsed listing page. Entries keep their in-page order.
#[derive(Debug)]
pub struct ResultPage {
    pub entries: Vec<Result<BookRecord, ParseError>>,
    pub has_next: bool,
    pub no_results: bool,
    pub total_results: Option<u64>,
}

impl ResultPage {
    /// Termination predicate: nothing more to fetch after this page.
    pub fn is_final_page(&self) -> bool {
        self.no_results || self.entries.is_empty() || !self.has_next
    }

    pub fn records(&self) -> impl Iterator<Item = &BookRecord> {
        self.entries.iter().filter_map(|e| e.as_ref().ok())
    }
}

/// Parse a listing page: every entry fragment, the next-page link, the no-results notice, and the result count.
pub fn parse_result_page(html: &str, markers: &Markers, page_url: &Url) -> ResultPage {
    let doc = Html::parse_document(html);
    let entries = doc
        .select(markers.entry.selector())
        .map(|entry| parse_entry(entry, markers, page_url))
        .collect();
    let has_next = doc
        .select(markers.next_page.selector())
        .filter_map(|a| a.value().attr("href"))
        .any(|h| {
            let h = h.trim();
            !h.is_empty() && h != "#"
        });
    let no_results = doc.select(markers.no_results.selector()).next().is_some();
    let total_results = doc
        .select(markers.result_count.selector())
        .next()
        .and_then(|el| parse_count(&element_text(el)));
    ResultPage {
        entries,
        has_next,
        no_results,
        total_results,
    }
}

/// First integer in `s`, thousands separators allowed ("1,234 results" -> 1234).
fn parse_count(s: &str) -> Option<u64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Walks the listing pages of one filter path.
pub struct ListingPaginator<'a, S: PageSource + ?Sized> {
    source: &'a mut S,
    catalog: &'a Catalog,
    options: &'a CollectOptions<'a>,
}

impl<'a, S: PageSource + ?Sized> ListingPaginator<'a, S> {
    pub fn new(source: &'a mut S, catalog: &'a Catalog, options: &'a CollectOptions<'a>) -> Self {
        Self {
            source,
            catalog,
            options,
        }
    }

    /// Fetch pages 1.. in order until the termination predicate holds or the safety cap is hit.
    ///
    /// Records keep site page order and in-page order; nothing is deduplicated. A fetch failure,
    /// cancellation, or (with [ParsePolicy::Abort]) a bad entry stops the run and returns the rows
    /// gathered so far inside the error.
    pub fn collect(&mut self, path: &FilterPath) -> Result<ExportTable, PaginationError> {
        let slugs = path.slugs();
        let max_pages = self.options.max_pages.max(1);
        let mut rows: Vec<BookRecord> = Vec::new();
        let mut skipped = 0usize;
        let mut total_results = None;

        for page in 1..=max_pages {
            if self.options.cancel.is_some_and(CancelToken::is_cancelled) {
                tracing::info!(%path, page, rows = rows.len(), "collection cancelled");
                return Err(stopped(path, page, PaginationFailure::Cancelled, rows));
            }

            let url = match self.catalog.listing_url(&slugs, Some(page)) {
                Ok(u) => u,
                Err(reason) => return Err(stopped(path, page, PaginationFailure::Url { reason }, rows)),
            };
            let html = match self.source.fetch(&url) {
                Ok(h) => h,
                Err(e) => return Err(stopped(path, page, PaginationFailure::Fetch(e), rows)),
            };

            let result = parse_result_page(&html, self.catalog.markers(), &url);
            let is_final = result.is_final_page();
            total_results = total_results.or(result.total_results);
            let entry_count = result.entries.len();

            for (i, entry) in result.entries.into_iter().enumerate() {
                match entry {
                    Ok(record) => rows.push(record),
                    Err(e) => match self.options.parse_policy {
                        ParsePolicy::Skip => {
                            skipped += 1;
                            tracing::warn!(%url, entry = i + 1, error = %e, "entry skipped");
                        }
                        ParsePolicy::Abort => {
                            let cause = PaginationFailure::Parse {
                                entry: i + 1,
                                source: e,
                            };
                            return Err(stopped(path, page, cause, rows));
                        }
                    },
                }
            }

            tracing::info!(%path, page, entries = entry_count, rows = rows.len(), "listing page collected");
            if let Some(report) = self.options.progress {
                report(&CollectProgress {
                    page,
                    rows: rows.len(),
                    skipped,
                    total_results,
                });
            }

            if is_final {
                tracing::info!(%path, pages = page, rows = rows.len(), skipped, "collection complete");
                return Ok(assemble(rows));
            }
        }

        tracing::warn!(%path, max_pages, rows = rows.len(), "page cap reached before the last listing page; stopping");
        Ok(assemble(rows).truncated())
    }
}

fn stopped(
    path: &FilterPath,
    page: u32,
    cause: PaginationFailure,
    partial: Vec<BookRecord>,
) -> PaginationError {
    PaginationError {
        path: path.to_string(),
        page,
        cause,
        partial,
    }
}
