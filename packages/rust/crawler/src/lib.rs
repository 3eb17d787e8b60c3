//! Wiki fetching, listing/item extraction, and the scrape engine.
//!
//! This crate provides:
//! - [`client`]: `reqwest` wrapper with a politeness delay
//! - [`listing`]: listing-page adapters ([`ListingRegistry`]) yielding item links
//! - [`item`]: item page extraction (category, rarity, image, infobox)
//! - [`images`]: download / embed / link handling of item images
//! - [`engine`]: the sequential [`Scraper`]

pub mod client;
pub mod engine;
mod html;
pub mod images;
pub mod item;
pub mod listing;

pub use client::WikiClient;
pub use engine::{ScrapeProgress, ScrapeReport, Scraper, SilentProgress, group_items};
pub use images::{ImageStore, image_file_name, sanitize_filename};
pub use item::parse_item_page;
pub use listing::{CategoryPageListing, ListingAdapter, ListingRegistry, TableListing, parse_listing};
