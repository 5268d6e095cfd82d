use comfy_table::{Table, presets::UTF8_FULL};

use crate::schema::Item;

use super::{ExportContext, rows};

const NO_POSTS: &str = "No posts found.";
const NO_CAPTION: &str = "(no caption)";
const CAPTION_WIDTH: usize = 60;

/// Renders the result as a terminal table.
pub fn render(items: &[Item], ctx: &ExportContext) -> String {
    if items.is_empty() {
        return NO_POSTS.to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Post URL", "Caption", "Posted", "Views", "Likes", "Comments", "Shares",
    ]);

    for row in rows(items, ctx) {
        let caption = if row.caption.is_empty() {
            NO_CAPTION.to_string()
        } else {
            shorten(&row.caption.replace(['\r', '\n'], " "), CAPTION_WIDTH)
        };

        table.add_row(vec![
            row.url,
            caption,
            row.date,
            row.views.to_string(),
            row.likes.to_string(),
            row.comments.to_string(),
            row.shares.to_string(),
        ]);
    }

    table.to_string()
}

fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut s: String = text.chars().take(max.saturating_sub(1)).collect();
    s.push('…');
    s
}
