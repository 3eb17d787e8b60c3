//! Overview pages that list items in `wikitable`s.

use scraper::{Html, Selector};
use url::Url;

use super::ListingAdapter;
use crate::html::text_of;

/// Takes the first link of every non-header row of each `table.wikitable`
/// in the page content. Always matches as the fallback.
pub struct TableListing;

impl ListingAdapter for TableListing {
    fn detect(&self, _doc: &Html, _url: &Url) -> bool {
        true
    }

    fn extract_links(&self, doc: &Html) -> Vec<(String, String)> {
        let content_sel = Selector::parse("div#mw-content-text").unwrap();
        let table_sel = Selector::parse("table.wikitable").unwrap();
        let row_sel = Selector::parse("tr").unwrap();
        let link_sel = Selector::parse("a").unwrap();

        let Some(content) = doc.select(&content_sel).next() else {
            return Vec::new();
        };

        let mut links = Vec::new();
        for table in content.select(&table_sel) {
            for row in table.select(&row_sel).skip(1) {
                let Some(a) = row.select(&link_sel).next() else {
                    continue;
                };
                if let Some(href) = a.value().attr("href") {
                    links.push((text_of(&a), href.to_string()));
                }
            }
        }
        links
    }

    fn name(&self) -> &str {
        "table"
    }
}
