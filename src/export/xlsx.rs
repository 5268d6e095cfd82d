use std::fs;
use std::path::PathBuf;

use log::info;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::error::ExportError;
use crate::schema::Item;

use super::{ExportContext, HEADERS, Row, rows};

pub const SHEET_NAME: &str = "TikTok Data";

/// Builds a single-sheet workbook: bold header row, counters as numbers.
pub fn build_workbook(rows: &[Row]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, row.url.as_str())?;
        sheet.write_string(r, 1, row.caption.as_str())?;
        sheet.write_string(r, 2, row.date.as_str())?;
        sheet.write_number(r, 3, row.views as f64)?;
        sheet.write_number(r, 4, row.likes as f64)?;
        sheet.write_number(r, 5, row.comments as f64)?;
        sheet.write_number(r, 6, row.shares as f64)?;
    }

    Ok(workbook)
}

/// Writes `{prefix}_{subject}.xlsx`. Nothing is written for an empty result.
pub fn write_xlsx(items: &[Item], ctx: &ExportContext) -> Result<Option<PathBuf>, ExportError> {
    if items.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(&ctx.dir)?;
    let path = ctx.file_path("xlsx");
    let mut workbook = build_workbook(&rows(items, ctx))?;
    workbook.save(&path)?;

    info!("wrote {} rows to {}", items.len(), path.display());
    Ok(Some(path))
}
