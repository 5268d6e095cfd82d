use chrono::{DateTime, Utc};

/// A single post collected from a profile listing.
///
/// The collector only ever looks at `id` and `created_at`.
/// Everything else is payload carried through to the exporters.
///
/// IMPORTANT:
/// - Two items with the same `id` are the same post, even if their
///   counters differ between pages.
/// - An empty `id` means the upstream omitted it; such items are
///   never collected.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Opaque post identifier
    pub id: String,

    /// Publication time
    pub created_at: DateTime<Utc>,

    /// Caption text, if the post has one
    pub caption: Option<String>,

    /// Engagement counters at fetch time
    pub engagement: Engagement,
}

// ------------------------------------------------------------
// Engagement counters
// ------------------------------------------------------------
//
// Missing counters in upstream data are normalized to 0.
//
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Engagement {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

/// Continuation position passed to a page source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// First request of a collection
    Start,

    /// Opaque token returned by the previous page
    Token(String),
}

impl Cursor {
    /// Returns the token, or `None` for the start sentinel.
    pub fn token(&self) -> Option<&str> {
        match self {
            Cursor::Start => None,
            Cursor::Token(t) => Some(t),
        }
    }
}

// ------------------------------------------------------------
// Page
// ------------------------------------------------------------
//
// One response from a page source, produced fresh per call.
//
// `items == None` means the response had no items collection at all,
// which is different from an empty page. The collector treats the
// former as a broken source contract.
//
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Items in upstream order
    pub items: Option<Vec<Item>>,

    /// Token for the next call, `None` when the listing is exhausted
    pub next_cursor: Option<String>,
}

impl Page {
    pub fn new(items: Vec<Item>, next_cursor: Option<&str>) -> Self {
        Self {
            items: Some(items),
            next_cursor: next_cursor.map(str::to_string),
        }
    }

    /// A response that lacked the items collection.
    #[cfg(test)]
    pub fn malformed() -> Self {
        Self {
            items: None,
            next_cursor: None,
        }
    }
}
