//! Export assembly and serialisation: book records -> fixed six-column table -> CSV or JSON.

use crate::model::BookRecord;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column order of every exported row.
pub const COLUMNS: [&str; 6] = ["title", "author", "format", "price", "rating", "url"];

/// Output format selector for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Errors from the export writers.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Failed to write output: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered book rows with the fixed [COLUMNS] schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTable {
    records: Vec<BookRecord>,
    truncated: bool,
}

/// Fix the row set into a table. Order is kept as given.
pub fn assemble(rows: Vec<BookRecord>) -> ExportTable {
    ExportTable {
        records: rows,
        truncated: false,
    }
}

impl ExportTable {
    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    /// Mark the table as cut off by the page cap.
    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    /// The listing continued past the last page fetched.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cells of every row in [COLUMNS] order; missing values are empty strings.
    pub fn rows(&self) -> impl Iterator<Item = [String; 6]> + '_ {
        self.records.iter().map(row_cells)
    }

    /// CSV with a header row. Fields are quoted only when they contain a separator, quote, or newline.
    pub fn write_csv<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        write_csv_row(&mut w, &COLUMNS)?;
        for row in self.rows() {
            write_csv_row(&mut w, &row)?;
        }
        Ok(())
    }

    /// JSON array of objects keyed by column name; missing values are `null`.
    pub fn write_json<W: Write>(&self, w: W) -> Result<(), FormatError> {
        let rows: Vec<JsonRow<'_>> = self.records.iter().map(JsonRow::from).collect();
        serde_json::to_writer_pretty(w, &rows)?;
        Ok(())
    }
}

fn row_cells(rec: &BookRecord) -> [String; 6] {
    [
        rec.title.clone(),
        rec.author_text(),
        rec.format.clone().unwrap_or_default(),
        rec.price.clone().unwrap_or_default(),
        rec.rating.map(|r| r.to_string()).unwrap_or_default(),
        rec.url.clone(),
    ]
}

#[derive(Serialize)]
struct JsonRow<'a> {
    title: &'a str,
    author: Option<String>,
    format: Option<&'a str>,
    price: Option<&'a str>,
    rating: Option<f32>,
    url: &'a str,
}

impl<'a> From<&'a BookRecord> for JsonRow<'a> {
    fn from(rec: &'a BookRecord) -> Self {
        Self {
            title: &rec.title,
            author: (!rec.authors.is_empty()).then(|| rec.author_text()),
            format: rec.format.as_deref(),
            price: rec.price.as_deref(),
            rating: rec.rating,
            url: &rec.url,
        }
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_csv_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> std::io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Write `table` to `path` in `format`.
pub fn write_table(table: &ExportTable, path: &Path, format: OutputFormat) -> Result<(), FormatError> {
    let f = File::create(path).map_err(|e| FormatError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut w = BufWriter::new(f);
    match format {
        OutputFormat::Csv => table.write_csv(&mut w)?,
        OutputFormat::Json => table.write_json(&mut w)?,
    }
    w.flush()?;
    Ok(())
}
