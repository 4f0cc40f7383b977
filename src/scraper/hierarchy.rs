//! Hierarchy resolution: which subjects exist under a category, which topics under a subject.
//!
//! Each lookup fetches the listing page scoped to the parent path (no pagination) and reads the
//! filter widget for the next level. Options keep the order they have in the markup.

use crate::model::{FilterLevel, FilterPath, FilterSelector};
use crate::scraper::catalog::{Catalog, Marker};
use crate::scraper::error::ResolutionError;
use crate::scraper::record::element_text;
use crate::scraper::PageSource;
use reqwest::Url;
use scraper::Html;
use std::collections::{HashMap, HashSet};

/// Resolves filter options level by level. Holds no state between calls unless built with a cache.
pub struct HierarchyResolver<'a, S: PageSource + ?Sized> {
    source: &'a mut S,
    catalog: &'a Catalog,
    cache: Option<HashMap<(FilterLevel, String), Vec<FilterSelector>>>,
}

impl<'a, S: PageSource + ?Sized> HierarchyResolver<'a, S> {
    pub fn new(source: &'a mut S, catalog: &'a Catalog) -> Self {
        Self {
            source,
            catalog,
            cache: None,
        }
    }

    /// Remember results per `(level, parent path)` for the lifetime of this resolver.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(HashMap::new());
        self
    }

    pub fn list_categories(&mut self) -> Result<Vec<FilterSelector>, ResolutionError> {
        self.list_options(FilterLevel::Category, &[])
    }

    pub fn list_subjects(&mut self, category: &str) -> Result<Vec<FilterSelector>, ResolutionError> {
        self.list_options(FilterLevel::Subject, &[category.trim()])
    }

    /// Topics under a subject. An empty list means the subject has no topics.
    pub fn list_topics(
        &mut self,
        category: &str,
        subject: &str,
    ) -> Result<Vec<FilterSelector>, ResolutionError> {
        self.list_options(FilterLevel::Topic, &[category.trim(), subject.trim()])
    }

    /// Options one level below the deepest selector of `path` (empty for a topic path).
    pub fn list_children(&mut self, path: &FilterPath) -> Result<Vec<FilterSelector>, ResolutionError> {
        match path.leaf_level().child() {
            Some(level) => self.list_options(level, &path.slugs()),
            None => Ok(Vec::new()),
        }
    }

    fn list_options(
        &mut self,
        level: FilterLevel,
        parent: &[&str],
    ) -> Result<Vec<FilterSelector>, ResolutionError> {
        let parent_key = parent.join("/");
        if let Some(hit) = self
            .cache
            .as_ref()
            .and_then(|c| c.get(&(level, parent_key.clone())))
        {
            tracing::debug!(%level, parent = %parent_key, "option cache hit");
            return Ok(hit.clone());
        }

        let parent_label = if parent.is_empty() {
            "catalog root".to_string()
        } else {
            parent_key.clone()
        };
        let url = self
            .catalog
            .listing_url(parent, None)
            .map_err(|reason| ResolutionError::Url {
                level,
                parent: parent_label.clone(),
                reason,
            })?;
        let html = self
            .source
            .fetch(&url)
            .map_err(|e| ResolutionError::Fetch {
                level,
                parent: parent_label.clone(),
                source: e,
            })?;

        let options = parse_options(
            &html,
            self.catalog.markers().options_for(level),
            level,
            &url,
        );
        tracing::debug!(%level, parent = %parent_label, count = options.len(), "resolved filter options");

        if let Some(cache) = self.cache.as_mut() {
            cache.insert((level, parent_key), options.clone());
        }
        Ok(options)
    }
}

/// Read `(label, slug)` options from the filter widget. A missing widget yields an empty list.
///
/// An option counts only when its link is the page path plus exactly one segment; that segment is
/// the slug. Self-links, links elsewhere in the catalog, and repeated slugs are skipped.
pub fn parse_options(
    html: &str,
    marker: &Marker,
    level: FilterLevel,
    page_url: &Url,
) -> Vec<FilterSelector> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut options = Vec::new();
    for a in doc.select(marker.selector()) {
        let label = element_text(a);
        let href = a.value().attr("href").unwrap_or("").trim();
        let slug = match child_slug(page_url, href) {
            ChildLink::Slug(s) => s,
            ChildLink::SamePage => continue,
            ChildLink::Elsewhere => {
                tracing::warn!(%level, %label, href, "filter option does not link one level down; skipped");
                continue;
            }
        };
        if !seen.insert(slug.clone()) {
            continue;
        }
        let label = if label.is_empty() { slug.clone() } else { label };
        match FilterSelector::new(level, label, slug) {
            Ok(sel) => options.push(sel),
            Err(e) => tracing::warn!(%level, href, error = %e, "filter option skipped"),
        }
    }
    options
}

#[derive(Debug, PartialEq, Eq)]
enum ChildLink {
    Slug(String),
    SamePage,
    Elsewhere,
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Classify `href` resolved against `page_url` by its path relative to the page path.
fn child_slug(page_url: &Url, href: &str) -> ChildLink {
    if href.is_empty() || href.starts_with('#') {
        return ChildLink::Elsewhere;
    }
    let url = match page_url.join(href) {
        Ok(u) => u,
        Err(_) => return ChildLink::Elsewhere,
    };
    if url.origin() != page_url.origin() {
        return ChildLink::Elsewhere;
    }
    let base = path_segments(page_url);
    let target = path_segments(&url);
    if !target.starts_with(&base) {
        return ChildLink::Elsewhere;
    }
    match &target[base.len()..] {
        [] => ChildLink::SamePage,
        [slug] => ChildLink::Slug((*slug).to_string()),
        _ => ChildLink::Elsewhere,
    }
}
