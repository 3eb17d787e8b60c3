//! End-to-end `build` pipeline: cache or scrape → JSON cache → HTML catalog.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use arcdex_crawler::{ImageStore, ScrapeProgress, ScrapeReport, Scraper, SilentProgress};
use arcdex_render::{RenderOptions, render_catalog};
use arcdex_shared::{AppConfig, ArcdexError, Catalog, Result};
use tracing::{info, instrument, warn};

use crate::cache::{load_cache, save_cache, write_atomic};

/// Options for [`build`], [`refresh_cache`] and [`render_only`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Resolved configuration (file + CLI overrides).
    pub config: AppConfig,
    /// Scrape even when a cache exists.
    pub force_scrape: bool,
}

impl BuildOptions {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            force_scrape: false,
        }
    }

    pub fn json_path(&self) -> PathBuf {
        self.config.output.json_path()
    }

    pub fn html_path(&self) -> PathBuf {
        self.config.output.html_path()
    }
}

/// Where the catalog of a build came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Scraped,
    Cache,
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSource::Scraped => f.write_str("scraped"),
            CatalogSource::Cache => f.write_str("cache"),
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub source: CatalogSource,
    pub item_count: usize,
    pub category_count: usize,
    /// Cache file read or written.
    pub json_path: PathBuf,
    /// HTML file written; `None` for [`refresh_cache`].
    pub html_path: Option<PathBuf>,
    /// Per-listing / per-item failures of the scrape, as (URL, message).
    pub errors: Vec<(String, String)>,
    /// Duplicate items dropped by the scrape.
    pub duplicates: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callbacks for the pipeline, on top of the scrape callbacks.
pub trait BuildProgress: ScrapeProgress {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn finished(&self, result: &BuildResult);
}

impl BuildProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn finished(&self, _result: &BuildResult) {}
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// Produce the HTML catalog.
///
/// 1. Obtain the catalog: scrape when forced or when no cache exists, else
///    load the cache (an unreadable cache falls back to scraping)
/// 2. Save the cache after a scrape
/// 3. Render and write the HTML page
#[instrument(skip_all, fields(force_scrape = options.force_scrape))]
pub async fn build<P: BuildProgress>(options: &BuildOptions, progress: &P) -> Result<BuildResult> {
    let start = Instant::now();
    let json_path = options.json_path();

    let (catalog, source, report) = if options.force_scrape {
        info!("fresh scrape requested");
        scrape_and_save(options, progress).await?
    } else if json_path.exists() {
        progress.phase("Loading cache");
        match load_cache(&json_path) {
            Ok(catalog) => {
                info!(path = %json_path.display(), items = catalog.len(), "using cached data");
                (catalog, CatalogSource::Cache, None)
            }
            Err(e) => {
                warn!(path = %json_path.display(), error = %e, "cache unreadable, scraping instead");
                scrape_and_save(options, progress).await?
            }
        }
    } else {
        info!(path = %json_path.display(), "no cached data, scraping");
        scrape_and_save(options, progress).await?
    };

    progress.phase("Rendering HTML");
    let html_path = options.html_path();
    write_html(&catalog, options, &html_path)?;

    let result = finish(catalog, source, report, json_path, Some(html_path), start);
    progress.finished(&result);
    Ok(result)
}

/// Scrape and save the cache without rendering.
#[instrument(skip_all)]
pub async fn refresh_cache<P: BuildProgress>(
    options: &BuildOptions,
    progress: &P,
) -> Result<BuildResult> {
    let start = Instant::now();
    let (catalog, source, report) = scrape_and_save(options, progress).await?;

    let result = finish(catalog, source, report, options.json_path(), None, start);
    progress.finished(&result);
    Ok(result)
}

/// Render the HTML page from the cache. A missing cache is an error.
#[instrument(skip_all)]
pub fn render_only<P: BuildProgress>(options: &BuildOptions, progress: &P) -> Result<BuildResult> {
    let start = Instant::now();
    let json_path = options.json_path();

    if !json_path.exists() {
        return Err(ArcdexError::validation(format!(
            "no cached data at {}; run a scrape first",
            json_path.display()
        )));
    }

    progress.phase("Loading cache");
    let catalog = load_cache(&json_path)?;

    progress.phase("Rendering HTML");
    let html_path = options.html_path();
    write_html(&catalog, options, &html_path)?;

    let result = finish(
        catalog,
        CatalogSource::Cache,
        None,
        json_path,
        Some(html_path),
        start,
    );
    progress.finished(&result);
    Ok(result)
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

async fn scrape_and_save<P: BuildProgress>(
    options: &BuildOptions,
    progress: &P,
) -> Result<(Catalog, CatalogSource, Option<ScrapeReport>)> {
    let config = &options.config;
    progress.phase("Scraping wiki");

    let images = ImageStore::new(config.output.images, config.output.images_dir());
    let scraper = Scraper::new(&config.http, &config.wiki.base_url, images)?;
    let mut report = scraper.scrape(&config.wiki.categories, progress).await?;

    progress.phase("Saving cache");
    let json_path = options.json_path();
    save_cache(&json_path, &report.catalog)?;
    info!(path = %json_path.display(), items = report.catalog.len(), "saved cache");

    let catalog = std::mem::take(&mut report.catalog);
    Ok((catalog, CatalogSource::Scraped, Some(report)))
}

fn write_html(catalog: &Catalog, options: &BuildOptions, html_path: &Path) -> Result<()> {
    let render_options = RenderOptions::new(options.config.output.title.clone());
    let html = render_catalog(catalog, &render_options);
    write_atomic(html_path, html.as_bytes())?;
    info!(path = %html_path.display(), items = catalog.len(), "wrote HTML catalog");
    Ok(())
}

fn finish(
    catalog: Catalog,
    source: CatalogSource,
    report: Option<ScrapeReport>,
    json_path: PathBuf,
    html_path: Option<PathBuf>,
    start: Instant,
) -> BuildResult {
    let (errors, duplicates) = report
        .map(|r| (r.errors, r.duplicates))
        .unwrap_or_default();

    BuildResult {
        source,
        item_count: catalog.len(),
        category_count: catalog.category_count(),
        json_path,
        html_path,
        errors,
        duplicates,
        elapsed: start.elapsed(),
    }
}
