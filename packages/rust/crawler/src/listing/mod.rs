//! Listing-page adapters: turn a wiki listing page into item links.
//!
//! MediaWiki `Category:` pages list their members under `#mw-pages`;
//! hand-written overview pages (Grenades, Loot, ...) put items in
//! `wikitable`s. Each layout has an adapter; the table adapter is the
//! always-last fallback.

mod category;
mod table;

use arcdex_shared::ItemLink;
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::html::resolve;

pub use category::CategoryPageListing;
pub use table::TableListing;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Trait for layout-specific link extraction.
pub trait ListingAdapter: Send + Sync {
    /// Whether this adapter handles the page at `page_url`.
    fn detect(&self, doc: &Html, page_url: &Url) -> bool;

    /// Raw `(link text, href)` pairs in document order.
    fn extract_links(&self, doc: &Html) -> Vec<(String, String)>;

    /// Adapter name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered adapters in priority order.
pub struct ListingRegistry {
    adapters: Vec<Box<dyn ListingAdapter>>,
}

impl ListingRegistry {
    /// Create a registry with the built-in adapters (category pages first, tables last).
    pub fn new() -> Self {
        Self {
            adapters: vec![Box::new(CategoryPageListing), Box::new(TableListing)],
        }
    }

    /// Detect the adapter for a page. Always returns one (tables are the fallback).
    pub fn detect(&self, doc: &Html, page_url: &Url) -> &dyn ListingAdapter {
        self.adapters
            .iter()
            .find(|a| a.detect(doc, page_url))
            .map(|a| a.as_ref())
            .unwrap_or(&TableListing)
    }
}

impl Default for ListingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a listing page into item links.
///
/// Only hrefs that point into `/wiki/` and are not themselves category pages
/// are kept; they are resolved against `base_url`.
pub fn parse_listing(html: &str, page_url: &Url, base_url: &Url) -> Vec<ItemLink> {
    let doc = Html::parse_document(html);
    let registry = ListingRegistry::new();
    let adapter = registry.detect(&doc, page_url);

    let links: Vec<ItemLink> = adapter
        .extract_links(&doc)
        .into_iter()
        .filter(|(_, href)| is_item_href(href))
        .filter_map(|(name, href)| {
            resolve(base_url, &href).map(|url| ItemLink { name, url })
        })
        .collect();

    debug!(
        adapter = adapter.name(),
        page = %page_url,
        links = links.len(),
        "parsed listing page"
    );

    links
}

fn is_item_href(href: &str) -> bool {
    href.contains("/wiki/") && !href.contains("Category:")
}
