use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::collector::CollectOptions;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// This is the top-level configuration structure loaded from
// `config.json`.
//
// It defines:
// - Relay endpoint settings
// - What to collect (subject, limit, date filter, pacing)
// - Where and how to export
// - Optional debug configuration
//
// Every section has defaults, so a file only needs the values
// that differ. Command-line flags are applied on top (see cli.rs).
//
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Relay (edge proxy) in front of the listing API
    pub relay: RelayConfig,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub export: ExportConfig,

    /// Optional debug configuration
    pub debug: Option<DebugConfig>,
}

// ------------------------------------------------------------
// Relay configuration
// ------------------------------------------------------------
//
// The relay forwards `unique_id`, `count` and `cursor` to the
// upstream listing endpoint and returns its JSON unchanged.
//
#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    /// Full HTTP(S) URL of the relay
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ------------------------------------------------------------
// Collection configuration
// ------------------------------------------------------------
//
// NOTE:
// - `start` / `end` are calendar days. Both or neither must be set;
//   the end day is included in full.
// - `request_delay_ms` paces consecutive page requests to avoid
//   upstream rate limiting.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectionConfig {
    /// Profile to collect (leading `@` is accepted)
    pub subject: Option<String>,

    /// Maximum number of posts to return
    pub limit: usize,

    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,

    /// Items requested per page
    pub page_size: usize,

    /// Pause between page requests in milliseconds
    pub request_delay_ms: u64,

    /// Hard stop on the number of pages fetched per collection
    pub max_pages: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        let defaults = CollectOptions::default();
        Self {
            subject: None,
            limit: 30,
            start: None,
            end: None,
            page_size: defaults.page_size,
            request_delay_ms: defaults.request_delay.as_millis() as u64,
            max_pages: defaults.max_pages,
        }
    }
}

impl Config {
    /// Rejects values that deserialize fine but cannot drive a collection.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.collection.validate()
    }
}

impl CollectionConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.page_size > 0, "collection.page_size must be positive");
        anyhow::ensure!(self.max_pages > 0, "collection.max_pages must be positive");
        Ok(())
    }

    pub fn options(&self) -> CollectOptions {
        CollectOptions {
            page_size: self.page_size,
            request_delay: Duration::from_millis(self.request_delay_ms),
            max_pages: self.max_pages,
        }
    }
}

// ------------------------------------------------------------
// Export configuration
// ------------------------------------------------------------
//
// Output files are named `{file_prefix}_{subject}.{csv,xlsx}`
// inside `dir`.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    /// Output directory
    pub dir: String,

    pub file_prefix: String,

    /// Base of post links, e.g. "https://www.tiktok.com"
    pub post_url_base: String,

    pub csv: bool,
    pub xlsx: bool,

    /// Print the result table to stdout
    pub table: bool,

    /// Offset for displayed dates in minutes east of UTC.
    /// Local offset when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: ".".into(),
            file_prefix: "tiktok".into(),
            post_url_base: "https://www.tiktok.com".into(),
            csv: true,
            xlsx: true,
            table: true,
            utc_offset_minutes: None,
        }
    }
}

// ------------------------------------------------------------
// Debug configuration
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    /// Enables debug-level logging (RUST_LOG still wins)
    pub log: Option<bool>,
}

fn default_timeout_secs() -> u64 {
    30
}
