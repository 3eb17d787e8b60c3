//! MediaWiki `Category:` member listings.

use scraper::{Html, Selector};
use url::Url;

use super::ListingAdapter;
use crate::html::text_of;

/// Extracts every link inside `div#mw-pages`.
pub struct CategoryPageListing;

impl ListingAdapter for CategoryPageListing {
    fn detect(&self, _doc: &Html, page_url: &Url) -> bool {
        // Pretty (`/wiki/Category:X`) and query (`index.php?title=Category:X`)
        // forms both count; the title may arrive percent-encoded or raw
        let url = page_url.as_str();
        url.contains("Category:") || url.contains("Category%3A")
    }

    fn extract_links(&self, doc: &Html) -> Vec<(String, String)> {
        let link_sel = Selector::parse("div#mw-pages a").unwrap();
        doc.select(&link_sel)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                Some((text_of(&a), href.to_string()))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "category"
    }
}
