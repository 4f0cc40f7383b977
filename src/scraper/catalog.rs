//! Site layout: how listing URLs are built and which markup markers locate filters, entries, and fields.
//!
//! Listing pages live at `{base_url}/{catalog_path}/{category}/{subject}/{topic}/?{page_param}=N`.
//! Every marker is a CSS selector and can be overridden from the config file.

use crate::model::is_valid_slug;
use crate::model::FilterLevel;
use crate::scraper::error::CatalogError;
use reqwest::Url;
use scraper::Selector;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://www.ebooks.com";
pub const DEFAULT_CATALOG_PATH: &str = "en-us/subjects";
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// CSS selectors for each structural marker, as strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct MarkerConfig {
    /// Option links in the category filter widget (catalog root page).
    pub category_options: String,
    /// Option links in the subject filter widget (category page).
    pub subject_options: String,
    /// Option links in the topic filter widget (subject page).
    pub topic_options: String,
    /// One book entry fragment on a listing page.
    pub entry: String,
    /// Title text, inside an entry.
    pub title: String,
    /// Detail link (`href`), inside an entry.
    pub link: String,
    /// One element per author, inside an entry.
    pub authors: String,
    pub format: String,
    pub price: String,
    /// Rating element; `data-rating` attribute preferred over text.
    pub rating: String,
    /// Link to the next listing page.
    pub next_page: String,
    /// Explicit "no more entries" notice.
    pub no_results: String,
    /// Total result count text, e.g. "1,234 results".
    pub result_count: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            category_options: r#"ul.filter-list[data-level="category"] a[href]"#.to_string(),
            subject_options: r#"ul.filter-list[data-level="subject"] a[href]"#.to_string(),
            topic_options: r#"ul.filter-list[data-level="topic"] a[href]"#.to_string(),
            entry: "div.book-result".to_string(),
            title: ".book-title".to_string(),
            link: ".book-title a[href]".to_string(),
            authors: ".book-authors .author".to_string(),
            format: ".book-format".to_string(),
            price: ".book-price".to_string(),
            rating: ".book-rating".to_string(),
            next_page: ".pagination a.next[href]".to_string(),
            no_results: ".no-results".to_string(),
            result_count: ".result-count".to_string(),
        }
    }
}

/// Everything needed to address and read the catalog. Passed explicitly into each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub base_url: String,
    pub catalog_path: String,
    pub page_param: String,
    pub markers: MarkerConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            page_param: DEFAULT_PAGE_PARAM.to_string(),
            markers: MarkerConfig::default(),
        }
    }
}

/// A compiled selector that remembers its source text for error messages.
#[derive(Debug, Clone)]
pub struct Marker {
    raw: String,
    selector: Selector,
}

impl Marker {
    fn compile(name: &'static str, raw: &str) -> Result<Self, CatalogError> {
        let selector = Selector::parse(raw).map_err(|e| CatalogError::InvalidSelector {
            name,
            selector: raw.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: raw.to_string(),
            selector,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Compiled [MarkerConfig].
#[derive(Debug, Clone)]
pub struct Markers {
    pub category_options: Marker,
    pub subject_options: Marker,
    pub topic_options: Marker,
    pub entry: Marker,
    pub title: Marker,
    pub link: Marker,
    pub authors: Marker,
    pub format: Marker,
    pub price: Marker,
    pub rating: Marker,
    pub next_page: Marker,
    pub no_results: Marker,
    pub result_count: Marker,
}

impl Markers {
    pub fn compile(cfg: &MarkerConfig) -> Result<Self, CatalogError> {
        Ok(Self {
            category_options: Marker::compile("category_options", &cfg.category_options)?,
            subject_options: Marker::compile("subject_options", &cfg.subject_options)?,
            topic_options: Marker::compile("topic_options", &cfg.topic_options)?,
            entry: Marker::compile("entry", &cfg.entry)?,
            title: Marker::compile("title", &cfg.title)?,
            link: Marker::compile("link", &cfg.link)?,
            authors: Marker::compile("authors", &cfg.authors)?,
            format: Marker::compile("format", &cfg.format)?,
            price: Marker::compile("price", &cfg.price)?,
            rating: Marker::compile("rating", &cfg.rating)?,
            next_page: Marker::compile("next_page", &cfg.next_page)?,
            no_results: Marker::compile("no_results", &cfg.no_results)?,
            result_count: Marker::compile("result_count", &cfg.result_count)?,
        })
    }

    /// Filter widget listing the options of `level`.
    pub fn options_for(&self, level: FilterLevel) -> &Marker {
        match level {
            FilterLevel::Category => &self.category_options,
            FilterLevel::Subject => &self.subject_options,
            FilterLevel::Topic => &self.topic_options,
        }
    }
}

/// Validated site layout with compiled markers.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: Url,
    page_param: String,
    markers: Markers,
}

impl Catalog {
    pub fn new(cfg: &CatalogConfig) -> Result<Self, CatalogError> {
        let invalid = |reason: String| CatalogError::InvalidBaseUrl {
            input: cfg.base_url.clone(),
            reason,
        };
        let mut root = Url::parse(cfg.base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(root.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https".to_string()));
        }
        if root.host_str().is_none() {
            return Err(invalid("URL has no host".to_string()));
        }
        root.set_query(None);
        root.set_fragment(None);
        {
            let mut segments = root
                .path_segments_mut()
                .map_err(|_| invalid("URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            segments.extend(cfg.catalog_path.split('/').filter(|s| !s.is_empty()));
        }
        let page_param = cfg.page_param.trim();
        if page_param.is_empty() {
            return Err(invalid("page parameter name is empty".to_string()));
        }
        Ok(Self {
            root,
            page_param: page_param.to_string(),
            markers: Markers::compile(&cfg.markers)?,
        })
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Listing URL scoped to `slugs` (category first). `page` adds the page-index query parameter.
    ///
    /// An empty slug list addresses the catalog root, which carries the category widget.
    pub fn listing_url(&self, slugs: &[&str], page: Option<u32>) -> Result<Url, String> {
        if let Some(bad) = slugs.iter().find(|s| !is_valid_slug(s)) {
            return Err(format!("'{}' is not a usable slug", bad));
        }
        let mut url = self.root.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| "catalog URL cannot be a base".to_string())?;
            segments.extend(slugs.iter().copied());
            // Trailing slash: listing pages are directories.
            segments.push("");
        }
        if let Some(n) = page {
            url.query_pairs_mut()
                .append_pair(&self.page_param, &n.to_string());
        }
        Ok(url)
    }
}
