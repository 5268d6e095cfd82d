/// Counters for a single collection run.
///
/// Purpose:
/// - Explain why a result is shorter than the requested limit
/// - Feed the summary log line printed by the binary
///
/// Each `collect` call owns its own instance; nothing is global.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectStats {
    /// Pages requested from the source
    pub pages_fetched: usize,

    /// Items seen across all pages, before any filtering
    pub items_seen: usize,

    /// Items dropped because the id was already collected
    pub duplicates: usize,

    /// Items dropped because the upstream sent no id
    pub missing_id: usize,

    /// Items dropped by the date filter
    pub out_of_range: usize,

    /// Why the loop stopped
    pub stop: StopReason,
}

/// Terminal reason of a successful collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source reported no further pages
    #[default]
    Exhausted,

    /// The requested number of items was collected
    LimitReached,

    /// The source returned the cursor it was just given
    StalledCursor,

    /// The configured page budget was used up
    PageBudget,
}
