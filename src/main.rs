//! treewatch - Recursive filesystem change monitor
//!
//! Entry point for the treewatch CLI.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use tokio_util::sync::CancellationToken;
use treewatch::observability::init_tracing;
use treewatch::watcher::{GlobFilter, RecursivePolicy};
use treewatch::{Config, Event, Result, Watcher};

/// treewatch - Recursive filesystem change monitor
#[derive(Parser, Debug)]
#[command(name = "treewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to watch
    #[arg(env = "TREEWATCH_ROOT", default_value = ".")]
    path: std::path::PathBuf,

    /// Follow subdirectories
    #[arg(short, long, env = "TREEWATCH_RECURSIVE")]
    recursive: bool,

    /// Only report paths matching this glob, relative to the watched directory
    #[arg(short, long, env = "TREEWATCH_PATTERN")]
    pattern: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TREEWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "TREEWATCH_LOG_JSON")]
    log_json: bool,

    /// Print events as JSON lines
    #[arg(long, env = "TREEWATCH_JSON")]
    json: bool,

    /// Report directories that could not be watched as error events
    #[arg(long, env = "TREEWATCH_REPORT_ADD_ERRORS")]
    report_add_errors: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            root: cli.path,
            recursive: cli.recursive,
            pattern: cli.pattern,
            log_level: cli.log_level,
            log_json: cli.log_json,
            json_events: cli.json,
            report_add_errors: cli.report_add_errors,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from(Cli::parse());

    init_tracing(&config.tracing());
    tracing::debug!(?config, "Configuration loaded");

    config.validate()?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, stopping");
            }
            cancel.cancel();
        }
    });

    let watcher = Watcher::new()?;
    let json = config.json_events;
    let print = move |event: Event| print_event(&event, json);

    if config.is_recursive() {
        let policy = RecursivePolicy::new(config.recursive_options());
        policy.seed(&watcher, &config.root)?;
        tracing::info!(root = %config.root.display(), "Watching recursively");

        match &config.pattern {
            Some(pattern) => {
                let filter = GlobFilter::new(&config.root, pattern)?;
                watcher
                    .watch(cancel, policy.wrap(&watcher, filter.wrap(print)))
                    .await?;
            }
            None => watcher.watch(cancel, policy.wrap(&watcher, print)).await?,
        }
    } else {
        watcher.add(&config.root)?;
        tracing::info!(root = %config.root.display(), "Watching");
        watcher.watch(cancel, print).await?;
    }

    let stats = watcher.stats();
    tracing::info!(
        events = stats.events_delivered,
        errors = stats.errors_delivered,
        dirs_added = stats.dirs_added,
        dirs_removed = stats.dirs_removed,
        add_failures = stats.add_failures,
        "treewatch stopped"
    );
    Ok(())
}

fn print_event(event: &Event, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!("Failed to encode event: {}", e),
        }
    } else if let Some(err) = &event.error {
        println!("Event: {}, Err: {err}", event.op);
    } else {
        println!("Event: {}, Path: {}", event.op, event.path.display());
    }
}
