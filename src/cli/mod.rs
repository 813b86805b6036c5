//! Command-line interface.

pub mod output;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::config::Settings;
use crate::extract::Extractor;
use crate::models::{ScrapeMethod, ScrapeTask};
use crate::scrape::{Dispatcher, HybridScraper, SettingsFetcherProvider};
use crate::sites::SiteRegistry;

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(about = "Product price lookup across Ukrainian storefronts")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Look up product codes across sites
    Scrape {
        /// Product codes, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        codes: Vec<String>,

        /// Site ids, comma separated (default: all registered sites)
        #[arg(short, long, value_delimiter = ',')]
        sites: Vec<String>,

        /// Number of concurrent workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Fetch method to try first
        #[arg(short, long)]
        method: Option<MethodArg>,

        /// Disable escalation to the other fetch method
        #[arg(long)]
        no_fallback: bool,

        /// Drop products that don't match the searched code
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: Format,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered site profiles
    Sites,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Fast,
    Browser,
}

impl From<MethodArg> for ScrapeMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Fast => ScrapeMethod::Fast,
            MethodArg::Browser => ScrapeMethod::Browser,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
    Csv,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scrape {
            codes,
            sites,
            workers,
            method,
            no_fallback,
            strict,
            format,
            output,
        } => {
            let mut settings = settings;
            if let Some(workers) = workers {
                settings.workers = workers.max(1);
            }
            if let Some(method) = method {
                settings.primary_method = method.into();
            }
            if no_fallback {
                settings.fallback_enabled = false;
            }
            if strict {
                settings.strict_relevance = true;
            }
            cmd_scrape(settings, codes, sites, format, output).await
        }
        Commands::Sites => cmd_sites(),
    }
}

fn cmd_sites() -> anyhow::Result<()> {
    let registry = SiteRegistry::builtin();
    for id in registry.site_ids() {
        let profile = registry.profile(id)?;
        println!(
            "{:<10} {} ({} direct URL variants)",
            style(id).cyan(),
            profile.base_url,
            profile.direct_urls.len()
        );
    }
    Ok(())
}

async fn cmd_scrape(
    settings: Settings,
    codes: Vec<String>,
    sites: Vec<String>,
    format: Format,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let registry = Arc::new(SiteRegistry::builtin());
    let sites: Vec<String> = if sites.is_empty() {
        registry.site_ids().iter().map(|s| s.to_string()).collect()
    } else {
        sites
    };

    // Cross product: every code against every site
    let mut tasks = Vec::new();
    for code in &codes {
        for site in &sites {
            tasks.push(ScrapeTask::new(code.trim(), site.trim()));
        }
    }
    anyhow::ensure!(!tasks.is_empty(), "no tasks to run");

    let extractor = Extractor::new(settings.strict_relevance);
    let scraper = Arc::new(
        HybridScraper::new(extractor, settings.fallback_enabled)
            .with_delays(settings.delay_range(), (5.0, 10.0)),
    );

    // Ctrl-C requests a graceful stop; in-flight tasks finish
    let cancel = scraper.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after in-flight tasks");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let bar = ProgressBar::new(tasks.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    let progress_bar = bar.clone();

    let provider = Arc::new(SettingsFetcherProvider::new(settings.clone()));
    let dispatcher = Dispatcher::new(registry, scraper, provider, settings.workers)
        .with_worker_delay(settings.delay_range())
        .with_progress(Arc::new(move |_, message| {
            progress_bar.inc(1);
            progress_bar.set_message(message.to_string());
        }));

    let (results, snapshot) = dispatcher.run(tasks).await;
    bar.finish_and_clear();

    let rendered = match format {
        Format::Table => output::render_table(&results),
        Format::Json => output::to_json(&results, &snapshot)?,
        Format::Csv => output::to_csv(&results),
    };
    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)?;
            println!("{} wrote {}", style("✓").green(), path.display());
        }
        None => print!("{rendered}"),
    }
    println!("{}", output::render_summary(&snapshot));
    Ok(())
}
