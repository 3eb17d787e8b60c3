//! Core pipeline orchestration for arcdex.
//!
//! This crate ties together scraping, the JSON cache and HTML rendering into
//! the end-to-end workflows the CLI exposes (`build`, `scrape`, `render`,
//! `list`).

pub mod cache;
pub mod pipeline;
pub mod query;

pub use cache::{load_cache, save_cache};
pub use pipeline::{
    BuildOptions, BuildProgress, BuildResult, CatalogSource, build, refresh_cache, render_only,
};
pub use query::{SortField, SortKey, sorted_items};

// Progress types callers implement alongside `BuildProgress`.
pub use arcdex_crawler::{ScrapeProgress, ScrapeReport, SilentProgress};
