mod decoder;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use product_finder_cache::{ASSET_MANIFEST, CacheStorage, CachedTransport, activate, install};
use product_finder_client::{ApiClient, HttpTransport, Transport};
use product_finder_core::{FinderConfig, SearchMode};
use product_finder_ui::{App, BarcodeDecoder, InventoryOutcome, SearchOutcome, ToggleOutcome};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::decoder::LineDecoder;

#[derive(Parser)]
#[command(name = "product-finder")]
#[command(about = "Look up store products by name or JAN code", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "PRODUCT_FINDER_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "PRODUCT_FINDER_URL")]
    base_url: Option<String>,

    /// Result count above which the refinement advisory is shown
    #[arg(long, global = true, env = "PRODUCT_FINDER_OVERFLOW_THRESHOLD")]
    overflow_threshold: Option<u64>,

    /// Asset cache bucket name
    #[arg(long, global = true, env = "PRODUCT_FINDER_CACHE_NAME")]
    cache_name: Option<String>,

    /// Directory the asset cache persists to
    #[arg(long, global = true, env = "PRODUCT_FINDER_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "PRODUCT_FINDER_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search products and print the rendered results
    Search {
        query: String,
        /// Search by JAN code instead of name
        #[arg(long)]
        jan: bool,
        /// Use the AI-assisted endpoint
        #[arg(long)]
        ai: bool,
    },

    /// Print the inventory detail for one product
    Inventory { id: i64 },

    /// Read barcodes from stdin (e.g. `zbarcam --raw`) and search the first one
    Scan {
        #[arg(long)]
        ai: bool,
    },

    /// Print the full page document
    Page {
        /// Run a name search first so the page carries results
        #[arg(long)]
        query: Option<String>,
    },

    /// Manage the offline asset cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Fetch every manifest asset into the current bucket
    Install,
    /// Fetch one URL cache-first and print the body
    Fetch { url: String },
    /// Delete buckets other than the current one
    Activate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(base_url = %config.base_url, "product-finder v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Search { query, jan, ai } => cmd_search(&config, &query, jan, ai).await,
        Commands::Inventory { id } => cmd_inventory(&config, id).await,
        Commands::Scan { ai } => cmd_scan(&config, ai).await,
        Commands::Page { query } => cmd_page(&config, query.as_deref()).await,
        Commands::Cache { command } => cmd_cache(&config, command).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<FinderConfig> {
    let mut config = FinderConfig::load_or_default(cli.config.as_deref())
        .context("loading configuration")?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(threshold) = cli.overflow_threshold {
        config.overflow_threshold = threshold;
    }
    if let Some(name) = &cli.cache_name {
        config.cache_name = name.clone();
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if let Some(secs) = cli.request_timeout_secs {
        config.request_timeout_secs = Some(secs);
    }
    Ok(config)
}

fn network(config: &FinderConfig) -> anyhow::Result<Arc<HttpTransport>> {
    let transport = HttpTransport::from_config(config)
        .with_context(|| format!("invalid base URL {}", config.base_url))?;
    Ok(Arc::new(transport))
}

fn storage(config: &FinderConfig) -> anyhow::Result<Arc<CacheStorage>> {
    let storage = CacheStorage::from_config(config).context("opening asset cache")?;
    Ok(Arc::new(storage))
}

/// Page app whose requests go through the asset cache first.
fn build_app(config: &FinderConfig, decoder: Box<dyn BarcodeDecoder>) -> anyhow::Result<App> {
    let transport: Arc<dyn Transport> =
        Arc::new(CachedTransport::new(storage(config)?, network(config)?));
    App::new(ApiClient::new(transport), decoder, config).context("loading templates")
}

/// Decoder for commands that never scan.
fn idle_decoder() -> Box<dyn BarcodeDecoder> {
    let (decoder, _rx) = LineDecoder::new(BufReader::new(tokio::io::empty()));
    Box::new(decoder)
}

fn search_result(outcome: SearchOutcome) -> anyhow::Result<()> {
    match outcome {
        SearchOutcome::Rendered { count } => {
            eprintln!("{count} products");
            Ok(())
        }
        SearchOutcome::Failed(kind) => bail!("search failed: {kind}"),
        SearchOutcome::Stale => bail!("search superseded"),
        SearchOutcome::Skipped => bail!("empty query"),
    }
}

async fn cmd_search(config: &FinderConfig, query: &str, jan: bool, ai: bool) -> anyhow::Result<()> {
    let app = build_app(config, idle_decoder())?;
    app.set_query(query).await;
    app.set_ai_enabled(ai).await;
    let mode = if jan { SearchMode::Jan } else { SearchMode::Name };
    let outcome = app.submit(mode).await;
    println!("{}", app.page().lock().await.results_html);
    search_result(outcome)
}

async fn cmd_inventory(config: &FinderConfig, id: i64) -> anyhow::Result<()> {
    let app = build_app(config, idle_decoder())?;
    let outcome = app.on_card_click(Some(id)).await;
    println!("{}", app.page().lock().await.modal.content_html);
    match outcome {
        Some(InventoryOutcome::Failed(kind)) => bail!("inventory fetch failed: {kind}"),
        _ => Ok(()),
    }
}

async fn cmd_scan(config: &FinderConfig, ai: bool) -> anyhow::Result<()> {
    let (decoder, mut codes) = LineDecoder::new(BufReader::new(tokio::io::stdin()));
    let app = build_app(config, Box::new(decoder))?;
    app.set_ai_enabled(ai).await;

    if let ToggleOutcome::Failed(kind) = app.on_scan_toggle().await {
        bail!("scanner unavailable: {kind}");
    }
    eprintln!("scanning, waiting for a barcode on stdin...");

    while let Some(code) = codes.recv().await {
        if let Some(outcome) = app.on_detected(&code).await {
            eprintln!("detected {}", app.page().lock().await.query_input);
            println!("{}", app.page().lock().await.results_html);
            return search_result(outcome);
        }
    }

    app.on_scan_toggle().await;
    bail!("input closed before a barcode was detected")
}

async fn cmd_page(config: &FinderConfig, query: Option<&str>) -> anyhow::Result<()> {
    let app = build_app(config, idle_decoder())?;
    if let Some(query) = query {
        app.set_query(query).await;
        app.on_search_click().await;
    }
    println!("{}", app.render_document().await);
    Ok(())
}

async fn cmd_cache(config: &FinderConfig, command: CacheCommand) -> anyhow::Result<()> {
    let storage = storage(config)?;
    if config.cache_dir.is_none() {
        eprintln!("warning: no cache directory configured, cache is not persisted");
    }

    match command {
        CacheCommand::Install => {
            let network = network(config)?;
            let count = install(&storage, &config.cache_name, ASSET_MANIFEST, network.as_ref())
                .await
                .context("installing asset cache")?;
            let bucket = storage.open(&config.cache_name)?;
            eprintln!("cached {count} assets in {}", bucket.name());
            for url in bucket.urls()? {
                eprintln!("  {url}");
            }
        }
        CacheCommand::Fetch { url } => {
            if !storage.has(&config.cache_name)? {
                eprintln!("warning: cache {} is not installed", config.cache_name);
            }
            let shim = CachedTransport::new(storage, network(config)?);
            let (reply, source) = shim
                .fetch(&url)
                .await
                .with_context(|| format!("fetching {url}"))?;
            eprintln!("{} {} ({})", reply.status, reply.url, source.as_str());
            println!("{}", reply.body);
        }
        CacheCommand::Activate => {
            let deleted = activate(&storage, &config.cache_name).context("activating cache")?;
            if deleted.is_empty() {
                eprintln!("no stale caches");
            }
            for name in deleted {
                eprintln!("deleted {name}");
            }
        }
    }
    Ok(())
}
