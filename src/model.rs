//! Catalog data model: filter selectors, filter paths, and scraped book records.
//!
//! The pipeline produces these; the export writer consumes [BookRecord] rows.

use crate::scraper::FilterPathError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Level of the category -> subject -> topic filter hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    Category,
    Subject,
    Topic,
}

impl FilterLevel {
    /// Level whose options are listed on a page scoped to this level. None for Topic.
    pub fn child(self) -> Option<FilterLevel> {
        match self {
            FilterLevel::Category => Some(FilterLevel::Subject),
            FilterLevel::Subject => Some(FilterLevel::Topic),
            FilterLevel::Topic => None,
        }
    }
}

impl fmt::Display for FilterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterLevel::Category => "category",
            FilterLevel::Subject => "subject",
            FilterLevel::Topic => "topic",
        })
    }
}

/// True if `slug` can be used verbatim as one path segment: non-empty, unreserved URL characters only.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
}

/// One filter option as offered by the site: display label plus the slug used in request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSelector {
    pub level: FilterLevel,
    pub label: String,
    pub slug: String,
}

impl FilterSelector {
    pub fn new(
        level: FilterLevel,
        label: impl Into<String>,
        slug: impl Into<String>,
    ) -> Result<Self, FilterPathError> {
        let slug = slug.into();
        if !is_valid_slug(&slug) {
            return Err(FilterPathError::InvalidSlug { level, slug });
        }
        Ok(Self {
            level,
            label: label.into(),
            slug,
        })
    }

    /// Selector built from a bare slug (label unknown, e.g. from the command line).
    pub fn from_slug(level: FilterLevel, slug: &str) -> Result<Self, FilterPathError> {
        Self::new(level, slug.trim(), slug.trim())
    }
}

/// Category, optionally narrowed by a subject, optionally narrowed by a topic.
///
/// A topic is only reachable through [FilterPath::with_topic], which requires a subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterPath {
    category: FilterSelector,
    subject: Option<FilterSelector>,
    topic: Option<FilterSelector>,
}

impl FilterPath {
    pub fn new(category: FilterSelector) -> Result<Self, FilterPathError> {
        expect_level(&category, FilterLevel::Category)?;
        Ok(Self {
            category,
            subject: None,
            topic: None,
        })
    }

    pub fn with_subject(mut self, subject: FilterSelector) -> Result<Self, FilterPathError> {
        expect_level(&subject, FilterLevel::Subject)?;
        self.subject = Some(subject);
        self.topic = None;
        Ok(self)
    }

    pub fn with_topic(mut self, topic: FilterSelector) -> Result<Self, FilterPathError> {
        expect_level(&topic, FilterLevel::Topic)?;
        if self.subject.is_none() {
            return Err(FilterPathError::MissingParent {
                level: FilterLevel::Topic,
            });
        }
        self.topic = Some(topic);
        Ok(self)
    }

    /// Build a path from raw slugs as given by the presentation shell.
    pub fn from_slugs(
        category: &str,
        subject: Option<&str>,
        topic: Option<&str>,
    ) -> Result<Self, FilterPathError> {
        if subject.is_none() && topic.is_some() {
            return Err(FilterPathError::MissingParent {
                level: FilterLevel::Topic,
            });
        }
        let mut path = Self::new(FilterSelector::from_slug(FilterLevel::Category, category)?)?;
        if let Some(s) = subject {
            path = path.with_subject(FilterSelector::from_slug(FilterLevel::Subject, s)?)?;
        }
        if let Some(t) = topic {
            path = path.with_topic(FilterSelector::from_slug(FilterLevel::Topic, t)?)?;
        }
        Ok(path)
    }

    pub fn category(&self) -> &FilterSelector {
        &self.category
    }

    pub fn subject(&self) -> Option<&FilterSelector> {
        self.subject.as_ref()
    }

    pub fn topic(&self) -> Option<&FilterSelector> {
        self.topic.as_ref()
    }

    /// Selectors in application order (category first).
    pub fn selectors(&self) -> impl Iterator<Item = &FilterSelector> {
        std::iter::once(&self.category)
            .chain(self.subject.as_ref())
            .chain(self.topic.as_ref())
    }

    pub fn slugs(&self) -> Vec<&str> {
        self.selectors().map(|s| s.slug.as_str()).collect()
    }

    /// Deepest level present.
    pub fn leaf_level(&self) -> FilterLevel {
        if self.topic.is_some() {
            FilterLevel::Topic
        } else if self.subject.is_some() {
            FilterLevel::Subject
        } else {
            FilterLevel::Category
        }
    }
}

impl fmt::Display for FilterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slugs().join("/"))
    }
}

fn expect_level(sel: &FilterSelector, level: FilterLevel) -> Result<(), FilterPathError> {
    if sel.level != level {
        return Err(FilterPathError::WrongLevel {
            expected: level,
            found: sel.level,
        });
    }
    Ok(())
}

/// One scraped catalog entry.
///
/// `title` and `url` are always present; every other field is `None`/empty when the
/// listing did not carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub format: Option<String>,
    /// Price text as shown, currency included (e.g. "$12.99").
    pub price: Option<String>,
    pub rating: Option<f32>,
    /// Absolute detail page URL.
    pub url: String,
}

impl BookRecord {
    /// Authors joined for a single cell; empty when none were listed.
    pub fn author_text(&self) -> String {
        self.authors.join(AUTHOR_SEPARATOR)
    }
}

/// Separator between multiple authors in one cell.
pub const AUTHOR_SEPARATOR: &str = ", ";
