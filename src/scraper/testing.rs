//! In-memory catalog for pipeline tests.

use crate::scraper::{Catalog, CatalogConfig, FetchError, PageSource};
use reqwest::Url;
use std::collections::HashMap;

pub(crate) const TEST_BASE: &str = "https://books.test";

pub(crate) fn test_catalog() -> Catalog {
    Catalog::new(&CatalogConfig {
        base_url: TEST_BASE.to_string(),
        ..CatalogConfig::default()
    })
    .expect("test catalog config is valid")
}

/// Full URL for a listing path under the test catalog, e.g. `url("fiction/mystery/?page=2")`.
pub(crate) fn url(rest: &str) -> String {
    format!("{}/en-us/subjects/{}", TEST_BASE, rest)
}

/// Fixed URL -> response map. Unknown URLs answer 404. Records every request.
#[derive(Debug, Default)]
pub(crate) struct MockSite {
    pages: HashMap<String, Result<String, u16>>,
    pub requests: Vec<String>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), Ok(html.into()));
        self
    }

    pub fn status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.pages.insert(url.into(), Err(status));
        self
    }
}

impl PageSource for MockSite {
    fn fetch(&mut self, url: &Url) -> Result<String, FetchError> {
        self.requests.push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(Ok(html)) => Ok(html.clone()),
            Some(Err(status)) => Err(FetchError::HttpStatus {
                status: *status,
                url: url.to_string(),
            }),
            None => Err(FetchError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

/// Filter widget markup for `level` ("category", "subject", "topic") with `(label, href)` options.
pub(crate) fn widget(level: &str, options: &[(&str, &str)]) -> String {
    let items: String = options
        .iter()
        .map(|(label, href)| format!(r#"<li><a href="{}">{}</a></li>"#, href, label))
        .collect();
    format!(
        r#"<aside><ul class="filter-list" data-level="{}">{}</ul></aside>"#,
        level, items
    )
}

/// One entry fragment with title, link, one author, and a price.
pub(crate) fn entry(title: &str, href: &str) -> String {
    format!(
        r#"<div class="book-result"><h3 class="book-title"><a href="{href}">{title}</a></h3><p class="book-authors"><span class="author">Author of {title}</span></p><span class="book-format">EPUB</span><span class="book-price">$9.99</span></div>"#
    )
}

/// Listing page wrapping `entries`; a next link is emitted when `next` is set.
pub(crate) fn listing(entries: &[String], next: Option<&str>) -> String {
    let pagination = match next {
        Some(href) => format!(r#"<div class="pagination"><a class="next" href="{}">Next</a></div>"#, href),
        None => r#"<div class="pagination"><span class="next disabled">Next</span></div>"#.to_string(),
    };
    format!(
        "<html><body><main>{}</main>{}</body></html>",
        entries.concat(),
        pagination
    )
}
