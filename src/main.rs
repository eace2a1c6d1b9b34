use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vnews::cache::PageCache;
use vnews::config::Config;
use vnews::crawler::{ArticleFetcher, FeedApi};
use vnews::error::VnewsErrorTrait;
use vnews::models::NewsCategory;
use vnews::parser::{ContentBlock, ContentExtractor, ExtractionResult, RunStyle};
use vnews::preload::{FeedSession, PreloadCoordinator};
use vnews::utils::{extract_domain, truncate_text};

#[derive(Parser)]
#[command(
    name = "vnews",
    version,
    about = "Vietnamese news reader core: article extraction and feed preloading",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the content blocks of an article
    Extract {
        /// Article URL to download
        #[arg(short, long, conflicts_with = "file")]
        url: Option<String>,

        /// Local HTML file to read instead
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Page through a category feed
    Feed {
        /// Category id, slug or Vietnamese label
        #[arg(short, long, default_value = "latest")]
        category: String,

        /// Number of pages to load
        #[arg(short, long, default_value = "2")]
        pages: u32,

        /// Print records as JSON lines
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List feed categories
    Categories,

    /// Print the active configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    if let Err(e) = vnews::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    match cli.command {
        Commands::Extract { url, file, format } => {
            tracing::info!(url = ?url, file = ?file, "Starting extract command");
            extract(&config, url, file, &format).await?;
        }

        Commands::Feed {
            category,
            pages,
            json,
        } => {
            tracing::info!(category = %category, pages, "Starting feed command");
            feed(&config, &category, pages, json).await?;
        }

        Commands::Categories => {
            for category in NewsCategory::all() {
                println!(
                    "{:>2}  {:<14} {}",
                    category.id(),
                    category.as_str(),
                    category.display_name()
                );
            }
        }

        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("vnews=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("vnews={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

/// Log a domain error with its classification and turn it into the CLI error
fn report<E: VnewsErrorTrait>(e: &E) -> anyhow::Error {
    tracing::error!(
        error = %e,
        category = e.category().as_str(),
        recoverable = e.is_recoverable(),
        "Request failed"
    );
    anyhow::anyhow!("{} ({e})", e.user_message())
}

async fn extract(
    config: &Config,
    url: Option<String>,
    file: Option<PathBuf>,
    format: &str,
) -> Result<()> {
    let result = match (url, file) {
        (Some(url), _) => {
            let fetcher = ArticleFetcher::new(config)?;
            match fetcher.fetch_article(&url).await {
                Ok(result) => result,
                Err(e) => return Err(report(&e)),
            }
        }
        (None, Some(file)) => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            ContentExtractor::from_settings(&config.extraction).extract(&html)
        }
        (None, None) => anyhow::bail!("either --url or --file is required"),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_blocks(&result),
    }

    Ok(())
}

fn print_blocks(result: &ExtractionResult) {
    for block in &result.blocks {
        match block {
            ContentBlock::Text(text) => {
                let line: String = text
                    .runs
                    .iter()
                    .map(|run| match run.style {
                        RunStyle::Plain => run.text.clone(),
                        RunStyle::Bold => format!("**{}**", run.text),
                        RunStyle::Italic => format!("_{}_", run.text),
                    })
                    .collect();
                println!("{line}\n");
            }
            ContentBlock::Image(image) => {
                println!("[image] {}", image.source_url);
                if !image.caption.is_empty() {
                    println!("        {}", image.caption);
                }
                println!();
            }
        }
    }
}

async fn feed(config: &Config, category: &str, pages: u32, json: bool) -> Result<()> {
    let category = NewsCategory::parse(category)
        .with_context(|| format!("Unknown category: {category}"))?;

    let cache = Arc::new(PageCache::new(config.cache_ttl()));
    let loader = Arc::new(FeedApi::new(&config.api)?);
    let coordinator = PreloadCoordinator::new(cache, loader, (&config.feed).into());
    let mut session = FeedSession::new(coordinator.clone(), category.id(), &config.feed);

    for page in 1..=pages.max(1) {
        let result = if page == 1 {
            session.refresh().await
        } else {
            session.load_more().await
        };

        let added = match result {
            Ok(added) => added,
            Err(e) => return Err(report(&e)),
        };

        tracing::info!(category = %category, page, added, "Loaded feed page");
        if !session.has_more() {
            break;
        }
    }

    for article in session.articles() {
        if json {
            println!("{}", serde_json::to_string(article)?);
        } else {
            let source = match &article.source {
                Some(source) => source.clone(),
                None => extract_domain(&article.url).unwrap_or_default(),
            };
            println!("{:<80}  {source}", truncate_text(&article.title, 80));
        }
    }

    let status = coordinator.status();
    tracing::info!(
        category = %category,
        articles = session.articles().len(),
        has_more = session.has_more(),
        cached = status.cached_key_count,
        in_flight = status.in_flight_count,
        "Feed finished"
    );

    Ok(())
}
