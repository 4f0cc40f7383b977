//! ebookscrape: extract eBooks.com catalog listings by category, subject, and topic into CSV.

pub mod cli;
pub mod config;
pub mod export;
pub mod logging;
pub mod model;
pub mod scraper;

// Re-exports for CLI and consumers.
pub use export::{assemble, write_table, ExportTable, FormatError, OutputFormat, COLUMNS};
pub use model::{BookRecord, FilterLevel, FilterPath, FilterSelector};
pub use scraper::{
    collect, list_categories, list_subjects, list_topics, CancelToken, Catalog, CatalogConfig,
    CollectOptions, PageSource, PaginationError, ParsePolicy, PoliteClient, PoliteClientBuilder,
    ResolutionError,
};
