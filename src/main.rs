// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// - cli:        Command-line flags layered over the config file
// - config:     Configuration structs loaded from JSON
// - schema:     Item / Page / Cursor types
// - error:      Typed errors of sources, collector and exporters
// - util:       Time formatting and small string helpers
// - source:     PageSource trait and the HTTP relay implementation
// - collector:  Pagination, dedup, date filter, limit
// - metrics:    Per-run counters
// - export:     Table, CSV and XLSX output
//
mod cli;
mod config;
mod schema;
mod error;
mod util;
mod source;
mod collector;
mod metrics;
mod export;

use std::fs;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use cli::Cli;
use collector::{CollectionRequest, Collector};
use config::Config;
use export::ExportContext;
use source::relay::RelaySource;

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Load configuration and apply CLI overrides
// - Initialize logging
// - Run one collection against the relay
// - Print the table and write the export files
//
// Ctrl-C cancels the running collection; nothing is exported then.
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config: Config = load_config(&cli.config)?;
    cli.apply(&mut config);

    init_logging(&config);

    let subject = config
        .collection
        .subject
        .clone()
        .context("no subject given (set collection.subject or pass --subject)")?;

    let request = CollectionRequest::new(
        &subject,
        config.collection.limit,
        config.collection.start.map(util::start_of_day),
        config.collection.end.map(util::end_of_day),
    )?;

    let source = RelaySource::new(&config.relay)?;
    let collector = Collector::new(config.collection.options());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling");
                cancel.cancel();
            }
        }
    });

    let result = collector
        .collect(&request, &source, &cancel)
        .await
        .context("collection failed")?;

    info!(
        "got {} posts from {} items seen ({} duplicates, {} without id, {} outside date range)",
        result.len(),
        result.stats.items_seen,
        result.stats.duplicates,
        result.stats.missing_id,
        result.stats.out_of_range
    );

    if result.is_empty() {
        info!("nothing to export for {}", request.subject());
    }

    let ctx = ExportContext::new(&config.export, request.subject());

    if config.export.table {
        println!("{}", export::table::render(&result.items, &ctx));
    }

    if config.export.csv {
        if let Some(path) = export::csv::write_csv(&result.items, &ctx)? {
            println!("CSV:  {}", path.display());
        }
    }

    if config.export.xlsx {
        if let Some(path) = export::xlsx::write_xlsx(&result.items, &ctx)? {
            println!("XLSX: {}", path.display());
        }
    }

    Ok(())
}

// ------------------------------------------------------------
// Logging
// ------------------------------------------------------------
//
// `debug.log = true` lowers the default filter to debug.
// RUST_LOG, when set, takes precedence.
//
fn init_logging(config: &Config) {
    let verbose = config
        .debug
        .as_ref()
        .is_some_and(|d| d.log.unwrap_or(false));

    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------
//
// Reads a JSON configuration file from disk and deserializes
// it into the strongly typed `Config` structure.
//
fn load_config(path: &str) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path))?;
    let cfg: Config = serde_json::from_str(&data)
        .with_context(|| format!("invalid config file {}", path))?;
    cfg.validate()
        .with_context(|| format!("invalid config file {}", path))?;
    Ok(cfg)
}
