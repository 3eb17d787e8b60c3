//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use arcdex_core::pipeline;
use arcdex_core::{
    BuildOptions, BuildProgress, BuildResult, CatalogSource, ScrapeProgress, ScrapeReport, SortKey,
    load_cache, sorted_items,
};
use arcdex_shared::{
    ATTR_RARITY, ATTR_SELL_PRICE, ATTR_STACK_SIZE, ATTR_WEIGHT, AppConfig, ImageMode, init_config,
    load_config,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// arcdex: scrape the Arc Raiders wiki into a browsable item catalog.
#[derive(Parser)]
#[command(
    name = "arcdex",
    version,
    about = "Scrape Arc Raiders wiki items into a JSON cache and a sortable HTML catalog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./arcdex.toml, then ~/.arcdex/arcdex.toml).
    #[arg(long, global = true, env = "ARCDEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output directory for the cache, page and images.
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,

    /// Image handling: download, embed (base64) or link.
    #[arg(long, global = true)]
    pub images: Option<ImagesArg>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Fetch fresh data from the wiki even when a cache exists.
    #[arg(long)]
    pub scrape: bool,

    /// Defaults to `build`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Image handling mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ImagesArg {
    Download,
    Embed,
    Link,
}

impl From<ImagesArg> for ImageMode {
    fn from(arg: ImagesArg) -> Self {
        match arg {
            ImagesArg::Download => ImageMode::Download,
            ImagesArg::Embed => ImageMode::Embed,
            ImagesArg::Link => ImageMode::Link,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the HTML catalog, scraping only when there is no cache.
    Build {
        /// Fetch fresh data from the wiki even when a cache exists.
        #[arg(long)]
        scrape: bool,
    },

    /// Scrape the wiki and refresh the JSON cache without rendering.
    Scrape,

    /// Render the HTML catalog from the JSON cache.
    Render,

    /// Print cached items in a table.
    List {
        /// Only show this category.
        #[arg(short, long)]
        category: Option<String>,

        /// Sort order, e.g. name-asc, sellprice-desc, stackvalue-desc.
        #[arg(short, long, default_value = "sellprice-desc")]
        sort: SortKey,

        /// Show at most this many items.
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "arcdex=info",
        1 => "arcdex=debug",
        _ => "arcdex=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        config: cli.config,
        out: cli.out,
        images: cli.images,
    };

    match cli.command {
        None => cmd_build(&overrides, cli.scrape).await,
        Some(Command::Build { scrape }) => cmd_build(&overrides, scrape || cli.scrape).await,
        Some(Command::Scrape) => cmd_scrape(&overrides).await,
        Some(Command::Render) => cmd_render(&overrides),
        Some(Command::List {
            category,
            sort,
            limit,
        }) => cmd_list(&overrides, category.as_deref(), sort, limit),
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(overrides.config.as_deref()),
            ConfigAction::Show => cmd_config_show(&overrides),
        },
    }
}

/// Global flags that override the loaded config.
struct Overrides {
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    images: Option<ImagesArg>,
}

impl Overrides {
    /// Load the config file and apply flag overrides.
    fn resolve(&self) -> Result<AppConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(out) = &self.out {
            config.output.dir = out.to_string_lossy().into_owned();
        }
        if let Some(images) = self.images {
            config.output.images = images.into();
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(overrides: &Overrides, scrape: bool) -> Result<()> {
    let config = overrides.resolve()?;
    let mut options = BuildOptions::new(config);
    options.force_scrape = scrape;

    info!(
        out = %options.config.output.dir,
        images = %options.config.output.images,
        scrape,
        "building item catalog"
    );

    let reporter = CliProgress::new();
    let result = pipeline::build(&options, &reporter).await?;

    print_summary("Catalog built!", &result);
    if result.source == CatalogSource::Cache {
        println!("  Tip: run `arcdex --scrape` to fetch fresh data from the wiki.");
        println!();
    }
    Ok(())
}

async fn cmd_scrape(overrides: &Overrides) -> Result<()> {
    let options = BuildOptions::new(overrides.resolve()?);
    info!(out = %options.config.output.dir, "refreshing cache");

    let reporter = CliProgress::new();
    let result = pipeline::refresh_cache(&options, &reporter).await?;

    print_summary("Cache refreshed!", &result);
    Ok(())
}

fn cmd_render(overrides: &Overrides) -> Result<()> {
    let options = BuildOptions::new(overrides.resolve()?);

    let reporter = CliProgress::new();
    let result = pipeline::render_only(&options, &reporter)?;

    print_summary("Catalog rendered!", &result);
    Ok(())
}

fn cmd_list(
    overrides: &Overrides,
    category: Option<&str>,
    sort: SortKey,
    limit: Option<usize>,
) -> Result<()> {
    let config = overrides.resolve()?;
    let json_path = config.output.json_path();
    if !json_path.exists() {
        return Err(eyre!(
            "no cached data at '{}'. Run `arcdex scrape` first.",
            json_path.display()
        ));
    }

    let catalog = load_cache(&json_path)?;
    let items = sorted_items(&catalog, category, sort, limit);
    info!(shown = items.len(), total = catalog.len(), %sort, "listing items");

    if items.is_empty() {
        match category {
            Some(c) => println!("No items in category '{c}'."),
            None => println!("No items cached."),
        }
        return Ok(());
    }

    let name_width = items
        .iter()
        .map(|(_, item)| item.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);
    let cat_width = items
        .iter()
        .map(|(cat, _)| cat.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    println!(
        "{:<name_width$}  {:<cat_width$}  {:<10}  {:>8}  {:>6}  {:>7}",
        "Name", "Category", "Rarity", "Sell", "Stack", "Weight"
    );
    for (cat, item) in &items {
        println!(
            "{:<name_width$}  {:<cat_width$}  {:<10}  {:>8}  {:>6}  {:>7}",
            item.name,
            cat,
            item.attr(ATTR_RARITY).unwrap_or("-"),
            item.attr(ATTR_SELL_PRICE).unwrap_or("N/A"),
            item.attr(ATTR_STACK_SIZE).unwrap_or("N/A"),
            item.attr(ATTR_WEIGHT).unwrap_or("N/A"),
        );
    }
    println!();
    println!("  {} of {} items", items.len(), catalog.len());

    Ok(())
}

fn cmd_config_init(target: Option<&Path>) -> Result<()> {
    let path = init_config(target)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(overrides: &Overrides) -> Result<()> {
    let config = overrides.resolve()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_summary(headline: &str, result: &BuildResult) {
    println!();
    println!("  {headline}");
    println!("  Source:     {}", result.source);
    println!("  Items:      {}", result.item_count);
    println!("  Categories: {}", result.category_count);
    if result.source == CatalogSource::Scraped {
        println!("  Duplicates: {}", result.duplicates);
        println!("  Errors:     {}", result.errors.len());
    }
    println!("  Cache:      {}", result.json_path.display());
    if let Some(html) = &result.html_path {
        println!("  Page:       {}", html.display());
    }
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();

    for (url, message) in result.errors.iter().take(10) {
        println!("  ! {url}: {message}");
    }
    if result.errors.len() > 10 {
        println!("  ! ... and {} more", result.errors.len() - 10);
    }
    if !result.errors.is_empty() {
        println!();
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ScrapeProgress for CliProgress {
    fn category(&self, name: &str, index: usize, total: usize) {
        self.spinner
            .set_message(format!("Category [{index}/{total}] {name}"));
    }

    fn item(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Scraping [{current}/{total}] {name}"));
    }

    fn done(&self, report: &ScrapeReport) {
        self.spinner.set_message(format!(
            "Scraped {} items in {:.1}s",
            report.catalog.len(),
            report.duration.as_secs_f64()
        ));
    }
}

impl BuildProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn finished(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    // Errors skip `finished`; don't leave the spinner ticking over the report
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcdex_core::SortField;

    #[test]
    fn bare_invocation_builds() {
        let cli = Cli::try_parse_from(["arcdex"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.scrape);

        let cli = Cli::try_parse_from(["arcdex", "--scrape"]).unwrap();
        assert!(cli.scrape);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "arcdex", "build", "--scrape", "--images", "embed", "--out", "site", "-vv",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Build { scrape: true })));
        assert_eq!(cli.images, Some(ImagesArg::Embed));
        assert_eq!(cli.out.as_deref(), Some(Path::new("site")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn list_parses_sort_key() {
        let cli = Cli::try_parse_from([
            "arcdex", "list", "--category", "Loot", "--sort", "weight-asc", "-n", "5",
        ])
        .unwrap();
        let Some(Command::List {
            category,
            sort,
            limit,
        }) = cli.command
        else {
            panic!("expected list");
        };
        assert_eq!(category.as_deref(), Some("Loot"));
        assert_eq!(sort, SortKey::new(SortField::Weight, false));
        assert_eq!(limit, Some(5));

        assert!(Cli::try_parse_from(["arcdex", "list", "--sort", "price"]).is_err());
    }

    #[test]
    fn list_defaults_to_sell_price_descending() {
        let cli = Cli::try_parse_from(["arcdex", "list"]).unwrap();
        let Some(Command::List { sort, .. }) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(sort, SortKey::default());
    }
}
