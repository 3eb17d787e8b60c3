//! Shared types, error model, and configuration for arcdex.
//!
//! This crate is the foundation depended on by all other arcdex crates.
//! It provides:
//! - [`ArcdexError`]: the unified error type
//! - Domain types ([`Item`], [`ItemLink`], [`Catalog`], [`Rarity`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CategorySource, DEFAULT_WIKI_BASE, HttpConfig, IMAGES_SUBDIR, ImageMode,
    OutputConfig, WikiConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{ArcdexError, Result};
pub use types::{
    ATTR_RARITY, ATTR_SELL_PRICE, ATTR_SELL_PRICE_ALL_LEVELS, ATTR_STACK_SIZE, ATTR_WEIGHT,
    Catalog, Item, ItemLink, Rarity, UNCATEGORIZED, category_for_tag, parse_number, title_case,
};
