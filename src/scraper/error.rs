//! Error types for fetching, hierarchy resolution, entry parsing, and pagination.

use crate::model::{BookRecord, FilterLevel};
use thiserror::Error;

/// One page request failed (transport or non-2xx status).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: could not reach {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead { url: String, source: reqwest::Error },
}

impl FetchError {
    /// Worth another attempt: timeouts, connection failures, and 5xx. Never 4xx.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            FetchError::HttpStatus { status, .. } => *status >= 500,
            FetchError::BodyRead { source, .. } => source.is_timeout(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::HttpStatus { url, .. }
            | FetchError::BodyRead { url, .. } => url,
        }
    }
}

/// Listing the options of one filter level failed. An empty option list is not an error.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("{level} lookup failed under '{parent}': {source}")]
    Fetch {
        level: FilterLevel,
        parent: String,
        source: FetchError,
    },

    #[error("Could not build {level} lookup URL under '{parent}': {reason}")]
    Url {
        level: FilterLevel,
        parent: String,
        reason: String,
    },
}

impl ResolutionError {
    /// Level whose options were being listed.
    pub fn level(&self) -> FilterLevel {
        match self {
            ResolutionError::Fetch { level, .. } | ResolutionError::Url { level, .. } => *level,
        }
    }

    pub fn parent(&self) -> &str {
        match self {
            ResolutionError::Fetch { parent, .. } | ResolutionError::Url { parent, .. } => parent,
        }
    }
}

/// A book entry lacks a mandatory field (title or detail link).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("entry has no {field} (marker `{selector}` not found or empty)")]
    MissingField {
        field: &'static str,
        selector: String,
    },

    #[error("entry detail link '{href}' is not a valid URL: {reason}")]
    InvalidUrl { href: String, reason: String },
}

/// Why a collection run stopped early.
#[derive(Debug, Error)]
pub enum PaginationFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("entry {entry} rejected: {source}")]
    Parse { entry: usize, source: ParseError },

    #[error("Could not build listing URL: {reason}")]
    Url { reason: String },

    #[error("cancelled")]
    Cancelled,
}

/// Collection stopped before the last page. Carries every row gathered before the failure.
#[derive(Debug, Error)]
#[error("Collection of '{path}' stopped at page {page}: {cause} ({} rows collected before the failure)", .partial.len())]
pub struct PaginationError {
    pub path: String,
    /// 1-based page index that failed.
    pub page: u32,
    #[source]
    pub cause: PaginationFailure,
    pub partial: Vec<BookRecord>,
}

impl PaginationError {
    pub fn partial(&self) -> &[BookRecord] {
        &self.partial
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, PaginationFailure::Cancelled)
    }
}

/// Filter values that cannot form a valid filter path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterPathError {
    #[error("Invalid {level} slug '{slug}': use letters, digits, '-', '_', '.' or '~' only.")]
    InvalidSlug { level: FilterLevel, slug: String },

    #[error("A {level} needs its parent filter to be selected first.")]
    MissingParent { level: FilterLevel },

    #[error("Expected a {expected} selector, got a {found} selector.")]
    WrongLevel {
        expected: FilterLevel,
        found: FilterLevel,
    },
}

/// Site configuration that cannot be used (bad base URL or marker selector).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid base URL: {input}: {reason}")]
    InvalidBaseUrl { input: String, reason: String },

    #[error("Invalid marker `{name}` selector {selector:?}: {reason}")]
    InvalidSelector {
        name: &'static str,
        selector: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_transience() {
        let not_found = FetchError::HttpStatus {
            status: 404,
            url: "https://x/".into(),
        };
        let unavailable = FetchError::HttpStatus {
            status: 503,
            url: "https://x/".into(),
        };
        let rate_limited = FetchError::HttpStatus {
            status: 429,
            url: "https://x/".into(),
        };
        assert!(!not_found.is_transient());
        assert!(unavailable.is_transient());
        assert!(!rate_limited.is_transient());
        assert_eq!(not_found.status(), Some(404));
    }

    #[test]
    fn pagination_error_message_counts_partial_rows() {
        let err = PaginationError {
            path: "fiction/mystery".into(),
            page: 3,
            cause: PaginationFailure::Fetch(FetchError::HttpStatus {
                status: 404,
                url: "https://x/?page=3".into(),
            }),
            partial: vec![BookRecord {
                title: "T".into(),
                authors: vec![],
                format: None,
                price: None,
                rating: None,
                url: "https://x/book".into(),
            }],
        };
        let msg = err.to_string();
        assert!(msg.contains("page 3"));
        assert!(msg.contains("HTTP 404"));
        assert!(msg.contains("1 rows collected"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn resolution_error_names_level_and_parent() {
        let err = ResolutionError::Fetch {
            level: FilterLevel::Topic,
            parent: "fiction/mystery".into(),
            source: FetchError::HttpStatus {
                status: 500,
                url: "https://x/".into(),
            },
        };
        assert_eq!(err.level(), FilterLevel::Topic);
        assert_eq!(err.parent(), "fiction/mystery");
        assert!(err.to_string().starts_with("topic lookup failed under 'fiction/mystery'"));
    }
}
