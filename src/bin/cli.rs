//! Intern Tracker CLI
//!
//! Runs the tracker once, serves it on a schedule, and manages the local
//! store (sources, postings, run history).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use intern_tracker::{
    error::{AppError, Result},
    models::{Config, RunStats, RunSummary, Source},
    pipeline::{Scheduler, Tracker},
    services::{CareerPageCrawler, HttpFetcher, LogNotifier, Notifier, WebhookNotifier},
    storage::{LocalStorage, MemoryStorage, SourceStore},
    utils::report,
};

/// Intern Tracker - career page watcher
#[derive(Parser, Debug)]
#[command(
    name = "intern-tracker",
    version,
    about = "Watches career pages for new intern postings"
)]
struct Cli {
    /// Path to storage directory holding config.toml and the JSON store
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every enabled source once
    Run {
        /// Crawl and log without persisting or sending anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Run on a schedule until Ctrl-C
    Serve {
        /// Cron expression overriding [schedule] cron (seconds first)
        #[arg(long)]
        schedule: Option<String>,

        /// Also run once immediately
        #[arg(long)]
        run_now: bool,
    },

    /// Manage watched career pages
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },

    /// List discovered postings
    Postings {
        /// Only postings whose notification never went out
        #[arg(long)]
        unnotified: bool,
    },

    /// Show recent run summaries
    Runs {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Aggregate statistics over the run history
    Stats,

    /// Validate configuration and stored sources
    Validate,
}

#[derive(Subcommand, Debug)]
enum SourcesAction {
    /// List all sources
    List,

    /// Watch a new career page
    Add {
        name: String,
        career_url: String,
        #[arg(long, default_value = "intern")]
        search_term: String,
    },

    /// Resume crawling a source
    Enable { id: u64 },

    /// Stop crawling a source without deleting it
    Disable { id: u64 },

    /// Delete a source
    Remove { id: u64 },
}

/// Initialize logging; `--verbose` wins over the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(storage_dir: &Path, verbose: bool) -> Config {
    let config_path = storage_dir.join("config.toml");
    let loaded = Config::load(&config_path);

    let level = match &loaded {
        Ok(config) => config.logging.level.clone(),
        Err(_) => "info".to_string(),
    };
    init_logging(verbose, &level);

    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {:?}: {}. Using defaults.",
            config_path,
            e
        );
        Config::default()
    });
    config.apply_env();
    config
}

fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    match &config.notify.webhook_url {
        Some(url) => {
            let timeout = Duration::from_secs(config.crawler.timeout_secs);
            Ok(Arc::new(WebhookNotifier::new(url.clone(), timeout)?))
        }
        None => {
            log::info!("No webhook configured; notifications go to the log");
            Ok(Arc::new(LogNotifier))
        }
    }
}

async fn build_tracker(config: &Config, storage: &LocalStorage, dry_run: bool) -> Result<Tracker> {
    let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);
    let crawler = Arc::new(CareerPageCrawler::new(fetcher));

    let tracker = if dry_run {
        log::info!("Dry run: nothing will be persisted or sent");
        let scratch = Arc::new(
            MemoryStorage::with_sources(storage.list_enabled_sources().await?).await?,
        );
        scratch
            .import_postings(storage.list_postings(false).await?)
            .await;
        Tracker::new(crawler, Arc::new(LogNotifier), scratch)
    } else {
        Tracker::new(crawler, build_notifier(config)?, Arc::new(storage.clone()))
    };

    Ok(tracker
        .with_recipient(config.notify.recipient.clone())
        .with_default_sources(config.default_sources.clone()))
}

fn print_summary(summary: &RunSummary) {
    report::summary(
        "Run Summary",
        &[
            ("Status", summary.status.to_string()),
            ("Sources checked", summary.sources_checked.to_string()),
            ("Jobs found", summary.postings_seen.to_string()),
            ("New positions", summary.new_postings.to_string()),
            ("Notifications sent", summary.notifications_sent.to_string()),
            ("Duration", format!("{}ms", summary.duration_ms)),
        ],
    );
}

fn print_source(source: &Source) {
    report::sub_item(&format!(
        "[{}] {} ({}) term='{}'{}",
        source.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
        source.name,
        source.career_url,
        source.search_term,
        if source.enabled { "" } else { " [disabled]" }
    ));
}

async fn sources_command(storage: &LocalStorage, action: SourcesAction) -> Result<()> {
    match action {
        SourcesAction::List => {
            let sources = storage.list_sources().await?;
            if sources.is_empty() {
                log::info!("No sources configured; runs use the built-in defaults.");
            }
            for source in &sources {
                print_source(source);
            }
        }
        SourcesAction::Add {
            name,
            career_url,
            search_term,
        } => {
            let added = storage
                .add_source(Source::new(name, career_url, search_term))
                .await?;
            log::info!("Added source:");
            print_source(&added);
        }
        SourcesAction::Enable { id } => {
            let source = storage.set_source_enabled(id, true).await?;
            log::info!("Enabled {}", source.name);
        }
        SourcesAction::Disable { id } => {
            let source = storage.set_source_enabled(id, false).await?;
            log::info!("Disabled {}", source.name);
        }
        SourcesAction::Remove { id } => {
            storage.remove_source(id).await?;
            log::info!("Removed source {}", id);
        }
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.storage_dir, cli.verbose);

    log::debug!("Storage directory: {}", cli.storage_dir.display());
    let storage = LocalStorage::new(&cli.storage_dir);

    match cli.command {
        Command::Run { dry_run } => {
            let tracker = build_tracker(&config, &storage, dry_run).await?;
            let summary = tracker.run_now().await?;
            print_summary(&summary);
        }

        Command::Serve { schedule, run_now } => {
            let schedule = schedule.unwrap_or_else(|| config.schedule.cron.clone());
            if schedule.trim().is_empty() {
                return Err(AppError::config("no schedule configured"));
            }
            let tracker = Arc::new(build_tracker(&config, &storage, false).await?);
            let scheduler = Scheduler::new(tracker);

            scheduler.start(&schedule).await?;

            if run_now {
                match scheduler.run_now().await {
                    Ok(summary) => print_summary(&summary),
                    Err(e) => log::error!("Initial run failed: {}", e),
                }
            }

            log::info!("Waiting for scheduled runs. Press Ctrl-C to stop.");
            tokio::signal::ctrl_c().await?;
            log::info!("Shutting down...");
            scheduler.stop().await?;
        }

        Command::Sources { action } => sources_command(&storage, action).await?,

        Command::Postings { unnotified } => {
            let postings = storage.list_postings(unnotified).await?;
            report::header(&format!("{} postings", postings.len()));
            for posting in &postings {
                let line = posting.format("[{id}] {discovered_at} | {company} | {title} | {url}");
                if posting.notified {
                    report::sub_item(&line);
                } else {
                    report::sub_item(&format!("{line} (unnotified)"));
                }
            }
        }

        Command::Runs { limit } => {
            for run in storage.recent_runs(limit).await? {
                report::sub_item(&format!(
                    "{} {} checked={} seen={} new={} sent={} {}ms{}",
                    run.started_at.format("%Y-%m-%d %H:%M:%S"),
                    run.status,
                    run.sources_checked,
                    run.postings_seen,
                    run.new_postings,
                    run.notifications_sent,
                    run.duration_ms,
                    run.error_detail
                        .as_deref()
                        .map(|d| format!(" error: {d}"))
                        .unwrap_or_default()
                ));
            }
        }

        Command::Stats => {
            let stats = RunStats::from_history(&storage.all_runs().await?);
            report::summary(
                "Run Statistics",
                &[
                    ("Total runs", stats.total_runs.to_string()),
                    ("Successful runs", stats.successful_runs.to_string()),
                    ("New positions", stats.total_new_postings.to_string()),
                    ("Average duration", format!("{:.0}ms", stats.avg_duration_ms)),
                    (
                        "Last run",
                        stats
                            .last_run
                            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_else(|| "never".into()),
                    ),
                ],
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let sources = storage.list_sources().await?;
            for source in &sources {
                source.validate()?;
            }
            log::info!("✓ {} stored sources OK", sources.len());

            let postings = storage.list_postings(false).await?;
            log::info!("✓ {} stored postings readable", postings.len());

            log::info!("All validations passed!");
        }
    }

    log::info!("Done!");

    Ok(())
}
