//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use docdex_core::RetrievalService;
use docdex_crawler::{CrawlSettings, Crawler};
use docdex_shared::{AppConfig, CrawlSnapshot, RetrievalConfig, init_config, load_config};
use docdex_storage::CacheStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docdex — documentation retrieval from the command line.
#[derive(Parser)]
#[command(
    name = "docdex",
    version,
    about = "Crawl documentation sites into a local corpus and answer free-text queries.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl a documentation site and save the snapshot to the cache.
    Crawl {
        /// Base URL to crawl (defaults to the configured site).
        url: Option<String>,

        /// Maximum pages to fetch.
        #[arg(long)]
        max_pages: Option<usize>,

        /// Maximum link depth from the seed page.
        #[arg(long)]
        max_depth: Option<u32>,
    },

    /// Search the corpus and print the rendered response.
    Search {
        /// Free-text query.
        query: String,

        /// Maximum results to return.
        #[arg(short, long, default_value_t = 3)]
        limit: usize,

        /// Site base URL (defaults to the configured site).
        #[arg(long)]
        url: Option<String>,
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
        0 => "docdex=info",
        1 => "docdex=debug",
        _ => "docdex=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Crawl {
            url,
            max_pages,
            max_depth,
        } => cmd_crawl(url.as_deref(), max_pages, max_depth).await,
        Command::Search { query, limit, url } => cmd_search(&query, limit, url.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Merge CLI flags over the loaded config into a runtime config.
fn retrieval_config(
    url: Option<&str>,
    max_pages: Option<usize>,
    max_depth: Option<u32>,
) -> Result<RetrievalConfig> {
    let mut config: AppConfig = load_config()?;

    if let Some(max_pages) = max_pages {
        config.site.max_pages = max_pages;
    }
    if let Some(max_depth) = max_depth {
        config.site.max_depth = max_depth;
    }

    let retrieval = match url {
        Some(url) => RetrievalConfig::for_site_with(url, &config)?,
        None => RetrievalConfig::from_app(&config)?,
    };

    Ok(retrieval)
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

async fn cmd_crawl(
    url: Option<&str>,
    max_pages: Option<usize>,
    max_depth: Option<u32>,
) -> Result<()> {
    let config = retrieval_config(url, max_pages, max_depth)?;

    info!(
        site = %config.base_url,
        max_pages = config.max_pages,
        max_depth = config.max_depth,
        "crawling documentation site"
    );

    let crawler = Crawler::new(CrawlSettings::from(&config))?;

    let progress = spinner(&format!("Crawling {}", config.base_url));
    let outcome = crawler.crawl().await;
    progress.finish_and_clear();

    let store = CacheStore::new(&config.cache_dir);
    let mut snapshot = CrawlSnapshot {
        documents: outcome.documents,
        scraped_urls: outcome.visited,
        timestamp: 0,
    };
    store.save(&config.base_url, &mut snapshot).await;

    println!();
    println!("  Crawl complete!");
    println!("  Pages:   {}", snapshot.documents.len());
    println!("  Visited: {}", snapshot.scraped_urls.len());
    println!("  Failed:  {}", outcome.pages_failed);
    println!("  Cache:   {}", store.snapshot_path(&config.base_url).display());
    println!("  Time:    {:.1}s", outcome.duration.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_search(query: &str, limit: usize, url: Option<&str>) -> Result<()> {
    let config = retrieval_config(url, None, None)?;

    info!(site = %config.base_url, query, limit, "searching corpus");

    let service = RetrievalService::new(config)?;
    service.ensure_ready().await;

    let response = service.search(query, limit).await;
    println!("{response}");

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created config at {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config)?;
    println!("{rendered}");
    Ok(())
}
