//! Sequential scrape engine.
//!
//! Walks every configured listing page, scrapes each linked item page one
//! request at a time, then dedups by URL and groups items by their final
//! category. Failures are per listing / per item: they are logged, recorded
//! in the report, and the run continues.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use arcdex_shared::{
    ArcdexError, Catalog, CategorySource, HttpConfig, Item, ItemLink, Result,
};
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::client::WikiClient;
use crate::images::ImageStore;
use crate::item::parse_item_page;
use crate::listing::parse_listing;

// ---------------------------------------------------------------------------
// ScrapeReport
// ---------------------------------------------------------------------------

/// Summary of a completed scrape.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// Deduplicated items grouped by category (empty categories removed).
    pub catalog: Catalog,
    /// Item pages parsed successfully, duplicates included.
    pub items_scraped: usize,
    /// Items dropped because their URL was already seen.
    pub duplicates: usize,
    /// Failures as (URL or item name, error message).
    pub errors: Vec<(String, String)>,
    /// Total duration of the scrape.
    pub duration: Duration,
}

/// Progress callbacks for long scrapes.
pub trait ScrapeProgress: Send + Sync {
    /// Called when a listing page is about to be fetched (1-based index).
    fn category(&self, name: &str, index: usize, total: usize);
    /// Called before each item page is fetched (1-based index within the category).
    fn item(&self, name: &str, current: usize, total: usize);
    /// Called once the scrape has finished.
    fn done(&self, report: &ScrapeReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ScrapeProgress for SilentProgress {
    fn category(&self, _name: &str, _index: usize, _total: usize) {}
    fn item(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &ScrapeReport) {}
}

// ---------------------------------------------------------------------------
// Scraper
// ---------------------------------------------------------------------------

/// Wiki scraper.
pub struct Scraper {
    client: WikiClient,
    base_url: Url,
    images: ImageStore,
}

impl Scraper {
    pub fn new(http: &HttpConfig, base_url: &str, images: ImageStore) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ArcdexError::config(format!("invalid wiki base URL '{base_url}': {e}")))?;

        Ok(Self {
            client: WikiClient::new(http)?,
            base_url,
            images,
        })
    }

    /// Scrape every listing page in `categories`, in order.
    ///
    /// Returns an error only when nothing at all could be scraped.
    #[instrument(skip_all, fields(categories = categories.len(), images = %self.images.mode()))]
    pub async fn scrape(
        &self,
        categories: &[CategorySource],
        progress: &dyn ScrapeProgress,
    ) -> Result<ScrapeReport> {
        let start = Instant::now();
        self.images.prepare()?;

        let mut scraped: Vec<Item> = Vec::new();
        let mut errors: Vec<(String, String)> = Vec::new();

        for (index, source) in categories.iter().enumerate() {
            progress.category(&source.name, index + 1, categories.len());
            info!(category = %source.name, url = %source.url, "processing category");

            let links = match self.scrape_listing(source).await {
                Ok(links) => links,
                Err(e) => {
                    error!(category = %source.name, error = %e, "failed to process category");
                    errors.push((source.url.clone(), e.to_string()));
                    continue;
                }
            };

            info!(category = %source.name, items = links.len(), "found items");

            for (i, link) in links.iter().enumerate() {
                progress.item(&link.name, i + 1, links.len());

                match self.scrape_item(link, &source.name).await {
                    Ok(item) => scraped.push(item),
                    Err(e) => {
                        warn!(item = %link.name, url = %link.url, error = %e, "failed to scrape item");
                        errors.push((link.url.clone(), e.to_string()));
                    }
                }
            }
        }

        let items_scraped = scraped.len();
        if items_scraped == 0 {
            return Err(ArcdexError::validation(format!(
                "no items were scraped ({} errors)",
                errors.len()
            )));
        }

        let (catalog, duplicates) = group_items(categories, scraped);

        let report = ScrapeReport {
            catalog,
            items_scraped,
            duplicates,
            errors,
            duration: start.elapsed(),
        };

        info!(
            items = report.catalog.len(),
            categories = report.catalog.category_count(),
            duplicates = report.duplicates,
            errors = report.errors.len(),
            duration_ms = report.duration.as_millis(),
            "scrape completed"
        );

        progress.done(&report);
        Ok(report)
    }

    /// Fetch and parse one listing page.
    async fn scrape_listing(&self, source: &CategorySource) -> Result<Vec<ItemLink>> {
        let page_url = Url::parse(&source.url)
            .map_err(|e| ArcdexError::config(format!("invalid URL '{}': {e}", source.url)))?;
        let html = self.client.fetch_html(page_url.as_str()).await?;
        Ok(parse_listing(&html, &page_url, &self.base_url))
    }

    /// Fetch and parse one item page, then apply the image mode.
    /// Image failures are logged and do not fail the item.
    async fn scrape_item(&self, link: &ItemLink, listing_category: &str) -> Result<Item> {
        let html = self.client.fetch_html(&link.url).await?;
        let mut item = parse_item_page(&html, link, listing_category, &self.base_url)?;

        if let Err(e) = self.images.attach(&self.client, &mut item, listing_category).await {
            warn!(item = %item.name, error = %e, "failed to fetch image");
        }

        Ok(item)
    }
}

/// Dedup by URL (first occurrence wins) and group by final category.
///
/// Configured categories keep their configured order; categories that only
/// appear through reassignment follow in first-seen order. Empty categories
/// are dropped. Returns the catalog and the number of duplicates removed.
pub fn group_items(categories: &[CategorySource], items: Vec<Item>) -> (Catalog, usize) {
    let mut catalog = Catalog::new();
    for source in categories {
        catalog.ensure_category(&source.name);
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = 0;

    for item in items {
        if !seen.insert(item.url.clone()) {
            info!(item = %item.name, "skipping duplicate (already processed)");
            duplicates += 1;
            continue;
        }
        let category = item
            .category
            .clone()
            .unwrap_or_else(|| arcdex_shared::UNCATEGORIZED.to_string());
        catalog.push(&category, item);
    }

    catalog.prune_empty();
    (catalog, duplicates)
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use arcdex_shared::{ATTR_SELL_PRICE, ImageMode};

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn item(name: &str, category: &str) -> Item {
        let mut item = Item::new(name, format!("https://arcraiders.wiki/wiki/{name}"));
        item.category = Some(category.into());
        item
    }

    fn no_delay() -> HttpConfig {
        HttpConfig {
            timeout_secs: 5,
            rate_limit_ms: 0,
        }
    }

    async fn mount_page(server: &wiremock::MockServer, path: &str, body: String) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(path))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn grouping_dedups_and_orders() {
        let categories = vec![
            CategorySource::new("Grenades", "https://arcraiders.wiki/wiki/Grenades"),
            CategorySource::new("Trinkets", "https://arcraiders.wiki/wiki/Category:Trinket"),
            CategorySource::new("Loot", "https://arcraiders.wiki/wiki/Loot"),
        ];
        let items = vec![
            item("Rubber_Duck", "Trinkets"),
            item("Rusty_Gear", "Loot"),
            item("Rubber_Duck", "Trinkets"),
            item("Kettle", "Weapons"),
        ];

        let (catalog, duplicates) = group_items(&categories, items);

        assert_eq!(duplicates, 1);
        assert_eq!(catalog.len(), 3);
        let names: Vec<&str> = catalog.categories().collect();
        // Grenades is empty and removed; Weapons only appeared via reassignment
        assert_eq!(names, vec!["Trinkets", "Loot", "Weapons"]);
    }

    #[tokio::test]
    async fn scrape_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        // The fixtures use site-relative hrefs, so the mock server is the wiki base
        mount_page(&server, "/wiki/Category:Trinket", load_fixture("category_trinket.html")).await;
        mount_page(&server, "/wiki/Loot", load_fixture("loot_table.html")).await;
        mount_page(&server, "/wiki/Rubber_Duck", load_fixture("item_rubber_duck.html")).await;
        mount_page(&server, "/wiki/Kettle", load_fixture("item_kettle.html")).await;
        mount_page(&server, "/wiki/Battery", load_fixture("item_battery.html")).await;
        mount_page(&server, "/wiki/Rusty_Gear", load_fixture("item_battery.html")).await;
        // Air_Freshener and Statuette are not mounted → 404 → per-item errors

        let categories = vec![
            CategorySource::new("Trinkets", format!("{}/wiki/Category:Trinket", server.uri())),
            CategorySource::new("Loot", format!("{}/wiki/Loot", server.uri())),
        ];

        let scraper = Scraper::new(
            &no_delay(),
            &server.uri(),
            ImageStore::new(ImageMode::Link, std::env::temp_dir()),
        )
        .unwrap();

        let report = scraper.scrape(&categories, &SilentProgress).await.unwrap();

        // Trinkets: Rubber Duck ok, two 404s. Loot: Rusty Gear, Battery, Rubber Duck (dup), Kettle.
        assert_eq!(report.items_scraped, 5);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().all(|(_, msg)| msg.contains("404")));

        let catalog = &report.catalog;
        let names: Vec<&str> = catalog.categories().collect();
        assert_eq!(names, vec!["Trinkets", "Loot", "Weapons"]);

        let trinkets = catalog.get("Trinkets").unwrap();
        assert_eq!(trinkets.len(), 1);
        assert_eq!(trinkets[0].name, "Rubber Duck");

        let weapons = catalog.get("Weapons").unwrap();
        assert_eq!(weapons[0].name, "Kettle");
        assert_eq!(weapons[0].attr(ATTR_SELL_PRICE), Some("640"));
        assert!(
            weapons[0]
                .image_url
                .as_deref()
                .unwrap()
                .starts_with(&server.uri())
        );

        assert_eq!(catalog.get("Loot").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_listing_is_skipped() {
        let server = wiremock::MockServer::start().await;
        mount_page(&server, "/wiki/Category:Trinket", load_fixture("category_trinket.html")).await;
        mount_page(&server, "/wiki/Rubber_Duck", load_fixture("item_rubber_duck.html")).await;

        let categories = vec![
            CategorySource::new("Grenades", format!("{}/wiki/Grenades", server.uri())),
            CategorySource::new("Trinkets", format!("{}/wiki/Category:Trinket", server.uri())),
        ];

        let scraper = Scraper::new(
            &no_delay(),
            &server.uri(),
            ImageStore::new(ImageMode::Link, std::env::temp_dir()),
        )
        .unwrap();
        let report = scraper.scrape(&categories, &SilentProgress).await.unwrap();

        assert_eq!(report.catalog.len(), 1);
        assert!(
            report
                .errors
                .iter()
                .any(|(url, _)| url.ends_with("/wiki/Grenades"))
        );
    }

    #[tokio::test]
    async fn nothing_scraped_is_an_error() {
        let server = wiremock::MockServer::start().await;
        let categories = vec![CategorySource::new(
            "Loot",
            format!("{}/wiki/Loot", server.uri()),
        )];

        let scraper = Scraper::new(
            &no_delay(),
            &server.uri(),
            ImageStore::new(ImageMode::Link, std::env::temp_dir()),
        )
        .unwrap();
        let err = scraper
            .scrape(&categories, &SilentProgress)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no items were scraped"));
    }
}
