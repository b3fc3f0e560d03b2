use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkmark::bookmark;
use linkmark::captcha::CaptchaResolver;
use linkmark::config::Config;
use linkmark::fetch::FetchExecutor;
use linkmark::proxy::ProxyPool;
use linkmark::runner::BatchRunner;
use linkmark::session::{driver::ChromiumLoginDriver, SessionStore};
use linkmark::url::UrlExtractor;

#[derive(Parser)]
#[command(
    name = "linkmark",
    version,
    about = "Resilient LinkedIn profile fetcher and bookmark generator",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch profiles and write a bookmark file
    Fetch {
        /// File containing profile URLs (plain list or free text)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Profile URLs given directly on the command line
        #[arg(short, long)]
        url: Vec<String>,

        /// Output bookmark file path
        #[arg(short, long, default_value = "bookmarks.html")]
        output: PathBuf,

        /// Record failures and continue instead of aborting on the first one
        #[arg(long)]
        skip_errors: bool,
    },

    /// Scan a text file for profile URLs and print them
    Scan {
        /// File to scan
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    match cli.command {
        Commands::Fetch {
            input,
            url,
            output,
            skip_errors,
        } => {
            if skip_errors {
                config.batch.skip_errors = true;
            }
            fetch(config, input, url, output).await?;
        }
        Commands::Scan { input } => {
            scan(&input)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("linkmark=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("linkmark=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

async fn fetch(
    config: Config,
    input: Option<PathBuf>,
    urls: Vec<String>,
    output: PathBuf,
) -> Result<()> {
    let targets = collect_targets(input.as_deref(), urls)?;
    if targets.is_empty() {
        anyhow::bail!("no profile URLs given; use --input or --url");
    }

    tracing::info!(
        targets = targets.len(),
        proxies = config.fetch.proxies.len(),
        authenticated = config.session.username.is_some(),
        "Starting profile fetch"
    );

    let proxies = Arc::new(ProxyPool::new(&config.fetch.proxies));
    let driver = Arc::new(ChromiumLoginDriver::new(config.session.headless));
    let session = Arc::new(SessionStore::new(driver, &config.session));

    let resolver = CaptchaResolver::new(&config.captcha)?;
    let captcha = resolver.is_configured().then(|| Arc::new(resolver));

    let executor = Arc::new(FetchExecutor::new(
        &config.fetch,
        proxies,
        session,
        captcha,
    ));
    let runner = BatchRunner::new(&config.batch, executor);

    let report = runner.run(&targets).await;

    if !report.records.is_empty() {
        bookmark::write_file(&output, &report.records)
            .await
            .with_context(|| format!("Failed to write bookmark file: {}", output.display()))?;
        println!("Wrote {} bookmarks to {}", report.records.len(), output.display());
    }

    for failure in &report.failures {
        println!("FAILED {} ({})", failure.url, failure.reason);
    }

    if let Some(abort) = &report.aborted {
        anyhow::bail!("batch {abort}; {} URLs not attempted", report.skipped.len());
    }

    Ok(())
}

fn collect_targets(input: Option<&std::path::Path>, urls: Vec<String>) -> Result<Vec<String>> {
    let mut targets = urls;

    if let Some(path) = input {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        targets.extend(UrlExtractor::new().extract_urls(&text));
    }

    // Preserve order while dropping duplicates
    let mut seen = std::collections::HashSet::new();
    targets.retain(|u| seen.insert(u.clone()));

    Ok(targets)
}

fn scan(input: &std::path::Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    for url in UrlExtractor::new().extract_urls(&text) {
        println!("{url}");
    }

    Ok(())
}
