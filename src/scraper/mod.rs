//! Catalog extraction pipeline: page source, hierarchy resolution, listing pagination, and entry parsing.

mod catalog;
mod client;
mod error;

pub mod hierarchy;
pub mod listing;
pub mod record;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{
    Catalog, CatalogConfig, Marker, MarkerConfig, Markers, DEFAULT_BASE_URL, DEFAULT_CATALOG_PATH,
    DEFAULT_PAGE_PARAM,
};
pub use client::{
    PoliteClient, PoliteClientBuilder, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_DELAY_SECS,
    DEFAULT_RETRY_COUNT, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
pub use error::{
    CatalogError, FetchError, FilterPathError, PaginationError, PaginationFailure, ParseError,
    ResolutionError,
};
pub use hierarchy::HierarchyResolver;
pub use listing::{CollectOptions, CollectProgress, ListingPaginator, ParsePolicy, ResultPage};

use crate::export::ExportTable;
use crate::model::{FilterPath, FilterSelector};
use reqwest::Url;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where pages come from. The polite HTTP client in production, a fixed page map in tests.
pub trait PageSource {
    /// Fetch `url` and return its body. Non-2xx responses are errors.
    fn fetch(&mut self, url: &Url) -> Result<String, FetchError>;
}

/// Caller-held abort signal for a collection run. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Categories offered on the catalog root page, in site order.
pub fn list_categories<S: PageSource + ?Sized>(
    source: &mut S,
    catalog: &Catalog,
) -> Result<Vec<FilterSelector>, ResolutionError> {
    HierarchyResolver::new(source, catalog).list_categories()
}

/// Subjects under `category`, in site order.
pub fn list_subjects<S: PageSource + ?Sized>(
    source: &mut S,
    catalog: &Catalog,
    category: &str,
) -> Result<Vec<FilterSelector>, ResolutionError> {
    HierarchyResolver::new(source, catalog).list_subjects(category)
}

/// Topics under `category`/`subject`, in site order. Empty when the subject has none.
pub fn list_topics<S: PageSource + ?Sized>(
    source: &mut S,
    catalog: &Catalog,
    category: &str,
    subject: &str,
) -> Result<Vec<FilterSelector>, ResolutionError> {
    HierarchyResolver::new(source, catalog).list_topics(category, subject)
}

/// Collect every book listed under `path`, page by page.
pub fn collect<S: PageSource + ?Sized>(
    source: &mut S,
    catalog: &Catalog,
    path: &FilterPath,
    options: &CollectOptions<'_>,
) -> Result<ExportTable, PaginationError> {
    ListingPaginator::new(source, catalog, options).collect(path)
}
