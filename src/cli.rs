use chrono::NaiveDate;
use clap::Parser;

use crate::config::Config;

/// Collect a profile's public posts and export them as CSV / XLSX.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: String,

    /// Profile to collect (overrides `collection.subject`)
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Maximum number of posts
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// First day to include, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day to include, YYYY-MM-DD
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Output directory for exported files
    #[arg(short, long)]
    pub out_dir: Option<String>,

    #[arg(long)]
    pub no_csv: bool,

    #[arg(long)]
    pub no_xlsx: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(subject) = &self.subject {
            cfg.collection.subject = Some(subject.clone());
        }
        if let Some(limit) = self.limit {
            cfg.collection.limit = limit;
        }
        if self.start.is_some() {
            cfg.collection.start = self.start;
        }
        if self.end.is_some() {
            cfg.collection.end = self.end;
        }
        if let Some(dir) = &self.out_dir {
            cfg.export.dir = dir.clone();
        }
        if self.no_csv {
            cfg.export.csv = false;
        }
        if self.no_xlsx {
            cfg.export.xlsx = false;
        }
    }
}
