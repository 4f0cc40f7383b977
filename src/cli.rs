//! CLI parsing and orchestration. Lists filter options or collects a listing to CSV/JSON. Maps errors to exit codes.

use crate::config::{self, Config};
use crate::export::{assemble, write_table, FormatError, OutputFormat};
use crate::logging;
use crate::model::{FilterPath, FilterSelector};
use crate::scraper::listing::DEFAULT_MAX_PAGES;
use crate::scraper::{
    collect, list_categories, list_subjects, list_topics, Catalog, CatalogConfig, CatalogError,
    CollectOptions, CollectProgress, PaginationError, ParsePolicy, PoliteClient, ResolutionError,
};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    #[error("{0}")]
    Pagination(#[from] PaginationError),

    #[error("{0}")]
    Format(#[from] FormatError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Catalog(_) => 1,
            CliRunError::Resolution(_) | CliRunError::Pagination(_) => 2,
            CliRunError::Format(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ebookscrape")]
#[command(about = "List eBooks.com catalog filters and export the books under a category, subject, or topic")]
#[command(
    after_help = "Config file keys (output_dir, base_url, catalog_path, page_param, user_agent, accept_language, request_delay_secs, timeout_secs, retry_count, retry_backoff_secs, max_pages, parse_errors, [markers]) are read from ./ebookscrape.toml or ~/.config/ebookscrape/config.toml. CLI flags override config."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Site root (overrides config; default https://www.ebooks.com).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// HTTP User-Agent (overrides config).
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Delay between requests in seconds (overrides config; default 1).
    #[arg(long, global = true)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Suppress progress output (warnings and errors only).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug logging and the full error chain.
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List categories on the catalog root page.
    Categories,

    /// List subjects under a category.
    Subjects {
        /// Category slug, e.g. fiction.
        category: String,
    },

    /// List topics under a subject (may be none).
    Topics {
        category: String,
        subject: String,
    },

    /// Collect every book under a category, subject, or topic and write a table.
    Collect(CollectArgs),
}

#[derive(clap::Args, Debug)]
pub struct CollectArgs {
    pub category: String,

    pub subject: Option<String>,

    /// Topic slug; requires a subject.
    pub topic: Option<String>,

    /// Output path. Default: {output_dir}/{category}-{subject}-{topic}.{ext}.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: csv or json.
    #[arg(long, default_value = "csv", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Safety cap on listing pages (overrides config; default 200).
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Stop at the first entry missing a title or link instead of skipping it.
    #[arg(long)]
    pub abort_on_parse_error: bool,

    /// On a mid-run failure, still write the rows collected before it (exit code stays 2).
    #[arg(long)]
    pub keep_partial: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Invalid --format value: '{}'. Use csv or json.", s)),
    }
}

fn parse_policy(s: &str) -> Result<ParsePolicy, String> {
    match s.to_lowercase().as_str() {
        "skip" => Ok(ParsePolicy::Skip),
        "abort" => Ok(ParsePolicy::Abort),
        _ => Err(format!(
            "Invalid parse_errors value: '{}'. Use skip or abort.",
            s
        )),
    }
}

/// Lowercase, non-alphanumerics to `-`, dashes collapsed and trimmed.
fn sanitize_file_stem(name: &str) -> String {
    let mut s = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    while s.contains("--") {
        s = s.replace("--", "-");
    }
    s = s.trim_matches('-').to_string();
    if s.is_empty() {
        s = "books".to_string();
    }
    s
}

fn default_output_path(dir: &Path, path: &FilterPath, format: OutputFormat) -> PathBuf {
    let stem = sanitize_file_stem(&path.slugs().join("-"));
    dir.join(format!("{}.{}", stem, format.extension()))
}

fn validate_output_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write output: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Built-in defaults, overridden by config, overridden by flags.
fn catalog_config(args: &Args, config: Option<&Config>) -> CatalogConfig {
    let mut cfg = CatalogConfig::default();
    if let Some(c) = config {
        if let Some(ref v) = c.base_url {
            cfg.base_url = v.clone();
        }
        if let Some(ref v) = c.catalog_path {
            cfg.catalog_path = v.clone();
        }
        if let Some(ref v) = c.page_param {
            cfg.page_param = v.clone();
        }
        if let Some(ref m) = c.markers {
            cfg.markers = m.clone();
        }
    }
    if let Some(ref v) = args.base_url {
        cfg.base_url = v.clone();
    }
    cfg
}

fn build_client(args: &Args, config: Option<&Config>) -> Result<PoliteClient, CliRunError> {
    let mut builder = PoliteClient::builder();
    if let Some(secs) = args
        .delay
        .or_else(|| config.and_then(|c| c.request_delay_secs))
    {
        builder = builder.delay_secs(secs);
    }
    if let Some(secs) = args.timeout.or_else(|| config.and_then(|c| c.timeout_secs)) {
        builder = builder.timeout_secs(secs);
    }
    if let Some(n) = config.and_then(|c| c.retry_count) {
        builder = builder.retry_count(n);
    }
    if let Some(backoff) = config.and_then(|c| c.retry_backoff_secs.clone()) {
        builder = builder.retry_backoff_secs(backoff);
    }
    if let Some(ua) = args
        .user_agent
        .clone()
        .or_else(|| config.and_then(|c| c.user_agent.clone()))
    {
        builder = builder.user_agent(ua);
    }
    if let Some(lang) = config.and_then(|c| c.accept_language.clone()) {
        builder = builder.accept_language(lang);
    }
    builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))
}

fn print_options(options: &[FilterSelector]) {
    for o in options {
        println!("{}\t{}", o.label, o.slug);
    }
}

fn invalid(e: impl std::fmt::Display) -> CliRunError {
    CliRunError::InvalidInput(e.to_string())
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let catalog = Catalog::new(&catalog_config(args, config.as_ref()))?;
    let mut client = build_client(args, config.as_ref())?;

    match &args.command {
        Command::Categories => {
            let categories = list_categories(&mut client, &catalog)?;
            if categories.is_empty() {
                eprintln!("No categories found on the catalog root page.");
            }
            print_options(&categories);
        }
        Command::Subjects { category } => {
            FilterPath::from_slugs(category, None, None).map_err(invalid)?;
            let subjects = list_subjects(&mut client, &catalog, category)?;
            if subjects.is_empty() {
                eprintln!("No subjects listed under {}.", category);
            }
            print_options(&subjects);
        }
        Command::Topics { category, subject } => {
            FilterPath::from_slugs(category, Some(subject.as_str()), None).map_err(invalid)?;
            let topics = list_topics(&mut client, &catalog, category, subject)?;
            if topics.is_empty() {
                eprintln!(
                    "No topics for {}; collect with the subject alone.",
                    subject
                );
            }
            print_options(&topics);
        }
        Command::Collect(c) => run_collect(args, c, config.as_ref(), &catalog, &mut client)?,
    }
    Ok(())
}

fn run_collect(
    args: &Args,
    c: &CollectArgs,
    config: Option<&Config>,
    catalog: &Catalog,
    client: &mut PoliteClient,
) -> Result<(), CliRunError> {
    let path = FilterPath::from_slugs(&c.category, c.subject.as_deref(), c.topic.as_deref())
        .map_err(invalid)?;

    let output_dir = config
        .and_then(|cfg| cfg.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let output_path = c
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&output_dir, &path, c.format));
    validate_output_path(&output_path)?;

    let parse_policy = if c.abort_on_parse_error {
        ParsePolicy::Abort
    } else {
        match config.and_then(|cfg| cfg.parse_errors.as_deref()) {
            Some(s) => parse_policy(s).map_err(CliRunError::InvalidInput)?,
            None => ParsePolicy::Skip,
        }
    };
    let max_pages = c
        .max_pages
        .or_else(|| config.and_then(|cfg| cfg.max_pages))
        .unwrap_or(DEFAULT_MAX_PAGES);

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |p: &CollectProgress| {
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| new_progress_bar(p.total_results));
        pb.set_position(p.rows as u64);
        pb.set_message(format!("Page {}: {} books collected", p.page, p.rows));
    };
    let progress: Option<&dyn Fn(&CollectProgress)> =
        if args.quiet { None } else { Some(&progress_cb) };

    let options = CollectOptions {
        max_pages,
        parse_policy,
        cancel: None,
        progress,
    };
    let result = collect(client, catalog, &path, &options);

    if let Some(pb) = progress_state.borrow_mut().take() {
        logging::set_progress_bar(None);
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    match result {
        Ok(table) if table.is_empty() => {
            eprintln!("No books available to collect under {}.", path);
            Ok(())
        }
        Ok(table) => {
            write_table(&table, &output_path, c.format)?;
            if !args.quiet {
                eprintln!("Wrote {} books to {}", table.len(), output_path.display());
            }
            if table.is_truncated() {
                eprintln!(
                    "Stopped at the {}-page cap; the listing continues past the books written. Raise --max-pages to collect more.",
                    max_pages
                );
            }
            Ok(())
        }
        Err(e) => {
            if c.keep_partial && !e.partial().is_empty() {
                let partial = assemble(e.partial().to_vec());
                write_table(&partial, &output_path, c.format)?;
                eprintln!(
                    "Wrote {} books collected before the failure to {}",
                    partial.len(),
                    output_path.display()
                );
            }
            Err(e.into())
        }
    }
}

fn new_progress_bar(total: Option<u64>) -> indicatif::ProgressBar {
    let (bar, template) = match total {
        Some(n) if n > 0 => (
            indicatif::ProgressBar::new(n),
            "{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})",
        ),
        _ => (indicatif::ProgressBar::new_spinner(), "{spinner} {msg} ({elapsed})"),
    };
    if let Ok(style) = indicatif::ProgressStyle::default_bar().template(template) {
        bar.set_style(
            style
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    logging::set_progress_bar(Some(bar.clone()));
    bar
}
