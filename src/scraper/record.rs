//! Per-entry field extraction: one book entry fragment -> one [BookRecord].

use crate::model::BookRecord;
use crate::scraper::catalog::{Marker, Markers};
use crate::scraper::error::ParseError;
use reqwest::Url;
use scraper::{ElementRef, Html};

/// Extract a record from one entry element.
///
/// Title and detail link are mandatory; a missing marker for either is a [ParseError].
/// Optional fields whose marker is absent (or empty) come back as `None`/empty.
pub fn parse_entry(
    entry: ElementRef<'_>,
    markers: &Markers,
    page_url: &Url,
) -> Result<BookRecord, ParseError> {
    let title = first_text(entry, &markers.title).ok_or_else(|| ParseError::MissingField {
        field: "title",
        selector: markers.title.as_str().to_string(),
    })?;

    let href = entry
        .select(markers.link.selector())
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|h| !h.is_empty() && !h.starts_with('#'))
        .ok_or_else(|| ParseError::MissingField {
            field: "detail URL",
            selector: markers.link.as_str().to_string(),
        })?;
    let url = resolve_detail_url(page_url, href)?;

    let authors = entry
        .select(markers.authors.selector())
        .map(element_text)
        .filter(|a| !a.is_empty())
        .collect();

    Ok(BookRecord {
        title,
        authors,
        format: first_text(entry, &markers.format),
        price: first_text(entry, &markers.price),
        rating: entry
            .select(markers.rating.selector())
            .next()
            .and_then(parse_rating),
        url,
    })
}

/// Parse a standalone entry fragment. Uses the first entry marker inside it, or the whole fragment.
pub fn parse_entry_html(
    fragment: &str,
    markers: &Markers,
    page_url: &Url,
) -> Result<BookRecord, ParseError> {
    let doc = Html::parse_fragment(fragment);
    let root = doc.root_element();
    let entry = root.select(markers.entry.selector()).next().unwrap_or(root);
    parse_entry(entry, markers, page_url)
}

fn resolve_detail_url(page_url: &Url, href: &str) -> Result<String, ParseError> {
    let invalid = |reason: String| ParseError::InvalidUrl {
        href: href.to_string(),
        reason,
    };
    let url = page_url.join(href).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url.to_string())
}

/// Text content with runs of whitespace collapsed to single spaces.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(entry: ElementRef<'_>, marker: &Marker) -> Option<String> {
    entry
        .select(marker.selector())
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// `data-rating` attribute if numeric, else the first number in the text ("4.5 out of 5" -> 4.5).
fn parse_rating(el: ElementRef<'_>) -> Option<f32> {
    if let Some(v) = el
        .value()
        .attr("data-rating")
        .and_then(|a| a.trim().parse::<f32>().ok())
    {
        return v.is_finite().then_some(v);
    }
    first_number(&element_text(el))
}

/// First number in `s`. One `.` or `,` is the decimal separator ("4,5" -> 4.5); a token with
/// more than one separator ("1.2.3", "4,5.0") is ambiguous and gives no rating.
fn first_number(s: &str) -> Option<f32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let token: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let is_sep = |c: char| c == '.' || c == ',';
    let token = token.trim_end_matches(is_sep);
    if token.matches(is_sep).count() > 1 {
        return None;
    }
    token
        .replace(',', ".")
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
}
