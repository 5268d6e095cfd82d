use std::fs;
use std::path::PathBuf;

use log::info;

use crate::error::ExportError;
use crate::schema::Item;

use super::{ExportContext, HEADERS, Row, rows};

/// Byte order mark so spreadsheet apps detect UTF-8.
const BOM: char = '\u{FEFF}';

/// Every cell is quoted; embedded quotes are doubled.
fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// Captions are written on a single line.
fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

fn line(cells: &[String]) -> String {
    cells.iter().map(|c| quote(c)).collect::<Vec<_>>().join(",")
}

fn row_cells(row: &Row) -> Vec<String> {
    vec![
        row.url.clone(),
        flatten_lines(&row.caption),
        row.date.clone(),
        row.views.to_string(),
        row.likes.to_string(),
        row.comments.to_string(),
        row.shares.to_string(),
    ]
}

/// Full CSV document: BOM, header, one line per row, `\n` separated.
pub fn to_csv_string(rows: &[Row]) -> String {
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();

    let mut out = String::new();
    out.push(BOM);
    out.push_str(&line(&header));
    for row in rows {
        out.push('\n');
        out.push_str(&line(&row_cells(row)));
    }
    out
}

/// Writes `{prefix}_{subject}.csv`. Nothing is written for an empty result.
pub fn write_csv(items: &[Item], ctx: &ExportContext) -> Result<Option<PathBuf>, ExportError> {
    if items.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(&ctx.dir)?;
    let path = ctx.file_path("csv");
    fs::write(&path, to_csv_string(&rows(items, ctx)))?;

    info!("wrote {} rows to {}", items.len(), path.display());
    Ok(Some(path))
}
