//! lemmadex main entry point
//!
//! This is the command-line interface for the lemmadex crawler and search
//! engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use lemmadex::config::{load_config, Config};
use lemmadex::crawler::{Coordinator, HttpFetcher, IndexingResponse};
use lemmadex::lemma::{Lemmatizer, RussianMorphology};
use lemmadex::output::{load_statistics, print_statistics};
use lemmadex::search::{SearchEngine, SearchRequest, DEFAULT_LIMIT};
use lemmadex::storage::{open_storage, Storage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// lemmadex: crawl sites and search them by Russian lemmas
///
/// Crawls the sites listed in the configuration, indexes every page by the
/// lemmas of its words, and answers ranked keyword queries.
#[derive(Parser, Debug)]
#[command(name = "lemmadex")]
#[command(version)]
#[command(about = "Site crawler and lemma search engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-crawl every configured site; Ctrl-C stops the crawl
    Crawl,

    /// Fetch and re-index a single page of a configured site
    IndexPage {
        /// Page URL
        url: String,
    },

    /// Search the index
    Search {
        /// Query text
        query: String,

        /// Restrict the search to one configured site
        #[arg(long)]
        site: Option<String>,

        /// Number of results to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum number of results to print
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Show index statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Crawl => handle_crawl(&config).await,
        Command::IndexPage { url } => handle_index_page(&config, &url).await,
        Command::Search {
            query,
            site,
            offset,
            limit,
        } => {
            let mut request = SearchRequest::new(query).offset(offset).limit(limit);
            if let Some(site) = site {
                request = request.site(site);
            }
            handle_search(&config, &request)
        }
        Command::Stats { json } => handle_stats(&config, json),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lemmadex=info,warn"),
            1 => EnvFilter::new("lemmadex=debug,info"),
            2 => EnvFilter::new("lemmadex=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_database(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    let path = Path::new(&config.storage.database_path);
    let storage = open_storage(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(Arc::new(storage))
}

fn build_lemmatizer(config: &Config) -> anyhow::Result<Arc<Lemmatizer>> {
    let morphology = RussianMorphology::from_config(&config.morphology)?;
    tracing::info!(
        "Morphology ready ({} dictionary forms)",
        morphology.dictionary_len()
    );
    Ok(Arc::new(Lemmatizer::new(morphology)))
}

fn build_coordinator(config: &Config) -> anyhow::Result<Coordinator> {
    let storage = open_database(config)?;
    let lemmatizer = build_lemmatizer(config)?;
    let fetcher = Arc::new(HttpFetcher::new(&config.connection, &config.crawler)?);

    let mut coordinator = Coordinator::new(config.sites.clone(), storage, fetcher, lemmatizer);
    if let Some(pool_size) = config.crawler.pool_size {
        coordinator = coordinator.with_pool_size(pool_size);
    }
    Ok(coordinator)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs a full crawl until every site settles or Ctrl-C stops it
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let coordinator = build_coordinator(config)?;

    tracing::info!("Crawling {} sites", config.sites.len());
    let started = IndexingResponse::from(coordinator.start().await);
    print_json(&started)?;
    if !started.result {
        return Ok(());
    }

    tokio::select! {
        _ = coordinator.wait_idle() => {
            tracing::info!("All sites settled");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::warn!("Interrupted, stopping crawl");
            print_json(&IndexingResponse::from(coordinator.stop().await))?;
        }
    }

    let storage = open_database(config)?;
    let stats = load_statistics(storage.as_ref(), &config.sites, false)?;
    print_statistics(&stats);

    Ok(())
}

async fn handle_index_page(config: &Config, url: &str) -> anyhow::Result<()> {
    let coordinator = build_coordinator(config)?;
    print_json(&IndexingResponse::from(coordinator.index_one_page(url).await))
}

fn handle_search(config: &Config, request: &SearchRequest) -> anyhow::Result<()> {
    let engine = SearchEngine::new(open_database(config)?, build_lemmatizer(config)?);
    print_json(&engine.execute(request))
}

fn handle_stats(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    let stats = load_statistics(storage.as_ref(), &config.sites, false)?;

    if json {
        print_json(&stats)
    } else {
        println!("Database: {}\n", config.storage.database_path);
        print_statistics(&stats);
        Ok(())
    }
}
