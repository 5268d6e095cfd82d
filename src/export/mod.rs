//! Result consumers
//!
//! Turn a collection result into something a person can use:
//! - `table`: terminal table
//! - `csv`: delimited text file
//! - `xlsx`: spreadsheet file
//!
//! All of them share the row model below. Exporters are no-ops on an
//! empty result.

pub mod csv;
pub mod table;
pub mod xlsx;

use std::path::PathBuf;

use chrono::FixedOffset;

use crate::{config::ExportConfig, schema::Item, util};

/// Column headers of the exported files.
pub const HEADERS: [&str; 7] = [
    "VideoURL", "Caption", "Date", "Views", "Likes", "Comments", "Shares",
];

/// Everything an exporter needs besides the items themselves.
#[derive(Debug, Clone)]
pub struct ExportContext {
    pub subject: String,
    pub post_url_base: String,
    pub offset: FixedOffset,
    pub dir: PathBuf,
    pub file_prefix: String,
}

impl ExportContext {
    pub fn new(cfg: &ExportConfig, subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            post_url_base: cfg.post_url_base.clone(),
            offset: util::display_offset(cfg.utc_offset_minutes),
            dir: PathBuf::from(&cfg.dir),
            file_prefix: cfg.file_prefix.clone(),
        }
    }

    /// `{dir}/{prefix}_{subject}.{ext}`
    pub fn file_path(&self, ext: &str) -> PathBuf {
        let subject: String = self
            .subject
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{}_{}.{}", self.file_prefix, subject, ext))
    }

    pub fn post_url(&self, id: &str) -> String {
        format!(
            "{}/@{}/video/{}",
            self.post_url_base.trim_end_matches('/'),
            self.subject,
            id
        )
    }
}

/// One exported line, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub url: String,
    pub caption: String,
    pub date: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

pub fn rows(items: &[Item], ctx: &ExportContext) -> Vec<Row> {
    items
        .iter()
        .map(|item| Row {
            url: ctx.post_url(&item.id),
            caption: item.caption.clone().unwrap_or_default(),
            date: util::format_timestamp(item.created_at, ctx.offset),
            views: item.engagement.views,
            likes: item.engagement.likes,
            comments: item.engagement.comments,
            shares: item.engagement.shares,
        })
        .collect()
}
