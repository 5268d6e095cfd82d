use crate::error::SourceError;
use crate::schema::{Cursor, Page};

/// PageSource is the abstraction layer between:
/// - The generic collection loop
/// - A concrete paginated listing API (relay, fixture, ...)
///
/// Each implementation must:
/// - Perform exactly one upstream request per call
/// - Map the response into a `Page`
/// - Report transport and API failures as `SourceError`
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - One instance may serve several concurrent collections
///
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {

    /// Short identifier used in logs (e.g. "relay").
    fn name(&self) -> &str;

    /// Fetches one page of a subject's listing.
    ///
    /// PARAMETERS:
    /// - `subject`: normalized profile identifier
    /// - `cursor`: `Cursor::Start` on the first call, afterwards the
    ///   token returned by the previous page
    /// - `page_size`: maximum number of items requested
    ///
    /// RETURNS:
    /// - `Page.items == None` when the response has no items collection
    /// - `Page.next_cursor == None` when there is no more data
    ///
    /// MUST NOT:
    /// - Retry internally
    /// - Deduplicate or filter items
    ///
    async fn fetch_page(
        &self,
        subject: &str,
        cursor: &Cursor,
        page_size: usize,
    ) -> Result<Page, SourceError>;
}
