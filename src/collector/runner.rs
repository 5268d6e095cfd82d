use std::collections::HashSet;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    error::CollectError,
    metrics::{CollectStats, StopReason},
    schema::{Cursor, Item},
    source::adapter::PageSource,
};

use super::request::CollectionRequest;

/// Items requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Pause between two page requests unless configured otherwise.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(400);

/// Upper bound on pages fetched by a single collection.
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Tuning knobs of the pagination loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOptions {
    pub page_size: usize,

    /// Zero disables pacing (tests)
    pub request_delay: Duration,

    pub max_pages: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            request_delay: DEFAULT_REQUEST_DELAY,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Items collected by one run, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResult {
    pub items: Vec<Item>,
    pub stats: CollectStats,
}

impl CollectionResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Drives a `PageSource` until the request is satisfied.
///
/// A collector holds configuration only. All per-run state (result
/// accumulator, seen ids, cursor) lives inside `collect`, so one
/// collector may run any number of collections concurrently.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    options: CollectOptions,
}

impl Collector {
    pub fn new(options: CollectOptions) -> Self {
        Self { options }
    }

    /// Collects up to `request.limit()` unique items.
    ///
    /// The loop:
    /// - Fetches one page at a time, starting from `Cursor::Start`
    /// - Skips items with an empty or already collected id
    /// - Skips items outside the date range (they do not count
    ///   against the limit)
    /// - Stops mid-page as soon as the limit is reached
    /// - Follows the next cursor after a `request_delay` pause
    ///
    /// TERMINATION:
    /// - limit reached, source exhausted, cursor repeated, or page budget used up
    ///
    /// ERRORS:
    /// - `Source`: propagated unchanged from the source, never retried
    /// - `MalformedPage`: a page without an items collection
    /// - `Cancelled`: `cancel` fired at the top of an iteration, during
    ///   a fetch, or during the pause
    ///
    /// No partial result is returned on error.
    pub async fn collect(
        &self,
        request: &CollectionRequest,
        source: &dyn PageSource,
        cancel: &CancellationToken,
    ) -> Result<CollectionResult, CollectError> {
        let limit = request.limit();
        let mut items: Vec<Item> = Vec::with_capacity(limit.min(self.options.page_size));
        let mut seen: HashSet<String> = HashSet::new();
        let mut stats = CollectStats::default();
        let mut cursor = Cursor::Start;

        info!(
            "collecting up to {} posts of {} via {}",
            limit,
            request.subject(),
            source.name()
        );
        if let Some(range) = request.date_range() {
            info!("date filter: {} ..= {}", range.start(), range.end());
        }

        let stop = loop {
            if cancel.is_cancelled() {
                return Err(CollectError::Cancelled);
            }

            // A zero budget never fetches
            if self.options.max_pages == 0 {
                break StopReason::PageBudget;
            }

            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CollectError::Cancelled),
                res = source.fetch_page(request.subject(), &cursor, self.options.page_size) => res?,
            };
            stats.pages_fetched += 1;

            let page_items = page.items.ok_or(CollectError::MalformedPage {
                page: stats.pages_fetched,
            })?;
            let received = page_items.len();

            for item in page_items {
                stats.items_seen += 1;

                if item.id.is_empty() {
                    stats.missing_id += 1;
                    continue;
                }

                if seen.contains(&item.id) {
                    stats.duplicates += 1;
                    continue;
                }

                if let Some(range) = request.date_range() {
                    if !range.contains(item.created_at) {
                        stats.out_of_range += 1;
                        continue;
                    }
                }

                // Checked before appending so the result never exceeds the limit
                if items.len() >= limit {
                    break;
                }

                seen.insert(item.id.clone());
                items.push(item);
            }

            debug!(
                "page {}: {} items received, {} collected so far",
                stats.pages_fetched,
                received,
                items.len()
            );

            if items.len() >= limit {
                break StopReason::LimitReached;
            }

            let Some(next) = page.next_cursor else {
                break StopReason::Exhausted;
            };

            if cursor.token() == Some(next.as_str()) {
                warn!(
                    "source returned the same cursor {:?} twice for {}, stopping",
                    next,
                    request.subject()
                );
                break StopReason::StalledCursor;
            }
            cursor = Cursor::Token(next);

            if stats.pages_fetched >= self.options.max_pages {
                warn!(
                    "page budget of {} used up for {}, stopping with {} posts",
                    self.options.max_pages,
                    request.subject(),
                    items.len()
                );
                break StopReason::PageBudget;
            }

            // Pacing between requests, cancellable
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CollectError::Cancelled),
                _ = sleep(self.options.request_delay) => {}
            }
        };

        stats.stop = stop;

        info!(
            "collected {} posts of {} in {} pages ({:?})",
            items.len(),
            request.subject(),
            stats.pages_fetched,
            stop
        );

        Ok(CollectionResult { items, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::schema::{Engagement, Page};
    use crate::source::scripted::ScriptedSource;
    use crate::util;
    use chrono::{DateTime, Utc};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn ts(secs: i64) -> DateTime<Utc> {
        util::from_unix_seconds(secs).unwrap()
    }

    fn item(id: &str, secs: i64) -> Item {
        Item {
            id: id.to_string(),
            created_at: ts(secs),
            caption: Some(format!("post {}", id)),
            engagement: Engagement::default(),
        }
    }

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter().map(|id| item(id, 100)).collect()
    }

    fn ids(result: &CollectionResult) -> Vec<&str> {
        result.items.iter().map(|i| i.id.as_str()).collect()
    }

    fn fast() -> Collector {
        Collector::new(CollectOptions {
            request_delay: Duration::ZERO,
            ..CollectOptions::default()
        })
    }

    fn request(limit: usize) -> CollectionRequest {
        CollectionRequest::new("alice", limit, None, None).unwrap()
    }

    async fn run(
        collector: &Collector,
        req: &CollectionRequest,
        source: &ScriptedSource,
    ) -> Result<CollectionResult, CollectError> {
        collector.collect(req, source, &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn single_page_without_cursor_returns_everything_in_order() {
        let source = ScriptedSource::new(vec![Page::new(items(&["a", "b", "c", "d", "e"]), None)]);

        let result = run(&fast(), &request(10), &source).await.unwrap();

        assert_eq!(ids(&result), ["a", "b", "c", "d", "e"]);
        assert_eq!(source.call_count(), 1);
        assert_eq!(result.stats.stop, StopReason::Exhausted);
    }

    #[tokio::test]
    async fn boundary_duplicates_across_pages_are_dropped() {
        let source = ScriptedSource::new(vec![
            Page::new(items(&["a", "b", "c"]), Some("x2")),
            Page::new(items(&["c", "d"]), None),
        ]);

        let result = run(&fast(), &request(10), &source).await.unwrap();

        assert_eq!(ids(&result), ["a", "b", "c", "d"]);
        assert_eq!(result.stats.duplicates, 1);
        assert_eq!(
            source.cursors(),
            [Cursor::Start, Cursor::Token("x2".into())]
        );
    }

    #[tokio::test]
    async fn limit_stops_mid_page_with_a_single_fetch() {
        let source = ScriptedSource::new(vec![
            Page::new(items(&["a", "b", "c", "d", "e"]), Some("x2")),
            Page::new(items(&["f"]), None),
        ]);

        let result = run(&fast(), &request(2), &source).await.unwrap();

        assert_eq!(ids(&result), ["a", "b"]);
        assert_eq!(source.call_count(), 1);
        assert_eq!(result.stats.stop, StopReason::LimitReached);
    }

    #[tokio::test]
    async fn limit_hit_at_page_end_does_not_fetch_again() {
        let source = ScriptedSource::new(vec![
            Page::new(items(&["a", "b", "c"]), Some("x2")),
            Page::new(items(&["d"]), None),
        ]);

        let result = run(&fast(), &request(3), &source).await.unwrap();

        assert_eq!(ids(&result), ["a", "b", "c"]);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn date_filter_excluding_everything_pages_to_exhaustion() {
        let source = ScriptedSource::new(vec![
            Page::new(vec![item("a", 10), item("b", 20)], Some("x2")),
            Page::new(vec![item("c", 30)], None),
        ]);
        let req = CollectionRequest::new("alice", 10, Some(ts(1_000)), Some(ts(2_000))).unwrap();

        let result = run(&fast(), &req, &source).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(source.call_count(), 2);
        assert_eq!(result.stats.out_of_range, 3);
    }

    #[tokio::test]
    async fn filtered_items_do_not_count_against_limit() {
        let source = ScriptedSource::new(vec![Page::new(
            vec![item("old1", 5), item("a", 50), item("old2", 5), item("b", 60), item("c", 70)],
            None,
        )]);
        let req = CollectionRequest::new("alice", 2, Some(ts(50)), Some(ts(100))).unwrap();

        let result = run(&fast(), &req, &source).await.unwrap();

        assert_eq!(ids(&result), ["a", "b"]);
    }

    #[tokio::test]
    async fn range_endpoints_are_inclusive() {
        let source = ScriptedSource::new(vec![Page::new(
            vec![item("before", 9), item("start", 10), item("end", 20), item("after", 21)],
            None,
        )]);
        let req = CollectionRequest::new("alice", 10, Some(ts(10)), Some(ts(20))).unwrap();

        let result = run(&fast(), &req, &source).await.unwrap();

        assert_eq!(ids(&result), ["start", "end"]);
    }

    #[tokio::test]
    async fn source_error_on_second_call_aborts() {
        let source = ScriptedSource::with_results(vec![
            Ok(Page::new(items(&["a", "b"]), Some("x2"))),
            Err(SourceError::Status {
                status: 502,
                body: "bad gateway".into(),
            }),
        ]);

        let err = run(&fast(), &request(10), &source).await.unwrap_err();

        assert!(matches!(
            err,
            CollectError::Source(SourceError::Status { status: 502, .. })
        ));
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn page_without_items_collection_is_fatal() {
        let source = ScriptedSource::new(vec![
            Page::new(items(&["a"]), Some("x2")),
            Page::malformed(),
        ]);

        let err = run(&fast(), &request(10), &source).await.unwrap_err();

        assert!(matches!(err, CollectError::MalformedPage { page: 2 }));
    }

    #[tokio::test]
    async fn empty_first_page_is_an_empty_result() {
        let source = ScriptedSource::new(vec![Page::new(vec![], None)]);

        let result = run(&fast(), &request(5), &source).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn items_without_id_are_skipped() {
        let source = ScriptedSource::new(vec![Page::new(items(&["", "a", "", "a"]), None)]);

        let result = run(&fast(), &request(5), &source).await.unwrap();

        assert_eq!(ids(&result), ["a"]);
        assert_eq!(result.stats.missing_id, 2);
        assert_eq!(result.stats.duplicates, 1);
    }

    #[tokio::test]
    async fn request_parameters_reach_the_source() {
        let source = ScriptedSource::new(vec![Page::new(items(&["a"]), None)]);
        let collector = Collector::new(CollectOptions {
            page_size: 12,
            request_delay: Duration::ZERO,
            ..CollectOptions::default()
        });
        let req = CollectionRequest::new("@bob", 5, None, None).unwrap();

        run(&collector, &req, &source).await.unwrap();

        assert_eq!(source.calls(), [("bob".to_string(), Cursor::Start, 12)]);
    }

    #[tokio::test]
    async fn repeated_cursor_stops_the_loop() {
        let source = ScriptedSource::new(vec![
            Page::new(items(&["a"]), Some("same")),
            Page::new(items(&["b"]), Some("same")),
            Page::new(items(&["c"]), None),
        ]);

        let result = run(&fast(), &request(10), &source).await.unwrap();

        assert_eq!(ids(&result), ["a", "b"]);
        assert_eq!(source.call_count(), 2);
        assert_eq!(result.stats.stop, StopReason::StalledCursor);
    }

    #[tokio::test]
    async fn page_budget_bounds_the_number_of_fetches() {
        let pages = (0..10)
            .map(|n| {
                Page::new(
                    items(&[format!("p{}", n).as_str()]),
                    Some(format!("c{}", n).as_str()),
                )
            })
            .collect();
        let source = ScriptedSource::new(pages);
        let collector = Collector::new(CollectOptions {
            request_delay: Duration::ZERO,
            max_pages: 3,
            ..CollectOptions::default()
        });

        let result = run(&collector, &request(100), &source).await.unwrap();

        assert_eq!(ids(&result), ["p0", "p1", "p2"]);
        assert_eq!(source.call_count(), 3);
        assert_eq!(result.stats.stop, StopReason::PageBudget);
    }

    #[tokio::test]
    async fn cancelled_before_start_never_fetches() {
        let source = ScriptedSource::new(vec![Page::new(items(&["a"]), None)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fast().collect(&request(5), &source, &cancel).await.unwrap_err();

        assert!(matches!(err, CollectError::Cancelled));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn cancellation_during_pause_aborts_without_result() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(vec![
            Page::new(items(&["a"]), Some("x2")),
            Page::new(items(&["b"]), None),
        ])
        .cancel_after(1, cancel.clone());
        let collector = Collector::new(CollectOptions {
            request_delay: Duration::from_secs(60),
            ..CollectOptions::default()
        });

        let err = collector.collect(&request(5), &source, &cancel).await.unwrap_err();

        assert!(matches!(err, CollectError::Cancelled));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_page_budget_stops_without_a_final_pause() {
        let source = ScriptedSource::new(vec![
            Page::new(items(&["a"]), Some("x2")),
            Page::new(items(&["b"]), Some("x3")),
            Page::new(items(&["c"]), None),
        ]);
        let collector = Collector::new(CollectOptions {
            max_pages: 2,
            ..CollectOptions::default()
        });
        let started = tokio::time::Instant::now();

        let result = run(&collector, &request(10), &source).await.unwrap();

        assert_eq!(ids(&result), ["a", "b"]);
        assert_eq!(result.stats.stop, StopReason::PageBudget);
        // only the pause between page 1 and page 2
        assert!(started.elapsed() >= DEFAULT_REQUEST_DELAY);
        assert!(started.elapsed() < DEFAULT_REQUEST_DELAY * 2);
    }

    /// Source whose fetch never completes.
    struct StuckSource;

    #[async_trait::async_trait]
    impl PageSource for StuckSource {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn fetch_page(
            &self,
            _subject: &str,
            _cursor: &Cursor,
            _page_size: usize,
        ) -> Result<Page, SourceError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_pending_fetch() {
        let cancel = CancellationToken::new();
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                sleep(Duration::from_secs(5)).await;
                cancel.cancel();
            }
        });

        let err = fast()
            .collect(&request(5), &StuckSource, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn requests_are_paced_by_the_delay() {
        let source = ScriptedSource::new(vec![
            Page::new(items(&["a"]), Some("x2")),
            Page::new(items(&["b"]), Some("x3")),
            Page::new(items(&["c"]), None),
        ]);
        let collector = Collector::default();
        let started = tokio::time::Instant::now();

        let result = run(&collector, &request(10), &source).await.unwrap();

        assert_eq!(result.len(), 3);
        // two pauses: none before the first request, none after the last
        assert!(started.elapsed() >= DEFAULT_REQUEST_DELAY * 2);
        assert!(started.elapsed() < DEFAULT_REQUEST_DELAY * 3);
    }

    // ------------------------------------------------------------
    // Randomized invariants
    // ------------------------------------------------------------

    fn random_pages(rng: &mut StdRng) -> Vec<Page> {
        let page_count = rng.random_range(1..6);
        (0..page_count)
            .map(|p| {
                let n = rng.random_range(0..12);
                let page_items = (0..n)
                    .map(|_| {
                        let id = if rng.random_bool(0.05) {
                            String::new()
                        } else {
                            format!("id{}", rng.random_range(0..25))
                        };
                        item(&id, rng.random_range(0..100))
                    })
                    .collect();
                let cursor = (p + 1 < page_count).then(|| format!("c{}", p));
                Page::new(page_items, cursor.as_deref())
            })
            .collect()
    }

    /// Reference model: flatten, filter, keep first occurrence, truncate.
    fn expected(pages: &[Page], req: &CollectionRequest) -> Vec<Item> {
        let mut seen = HashSet::new();
        pages
            .iter()
            .flat_map(|p| p.items.clone().unwrap_or_default())
            .filter(|i| !i.id.is_empty())
            .filter(|i| req.date_range().is_none_or(|r| r.contains(i.created_at)))
            .filter(|i| seen.insert(i.id.clone()))
            .take(req.limit())
            .collect()
    }

    #[tokio::test]
    async fn random_sources_respect_all_invariants() {
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pages = random_pages(&mut rng);

            let limit = rng.random_range(1..20);
            let req = if rng.random_bool(0.5) {
                let start = rng.random_range(0..50);
                let end = rng.random_range(start..100);
                CollectionRequest::new("alice", limit, Some(ts(start)), Some(ts(end))).unwrap()
            } else {
                request(limit)
            };

            let first = run(&fast(), &req, &ScriptedSource::new(pages.clone()))
                .await
                .unwrap();
            let second = run(&fast(), &req, &ScriptedSource::new(pages.clone()))
                .await
                .unwrap();

            assert_eq!(first, second, "seed {}", seed);
            assert!(first.len() <= limit, "seed {}", seed);

            let unique: HashSet<_> = first.items.iter().map(|i| &i.id).collect();
            assert_eq!(unique.len(), first.len(), "seed {}", seed);

            if let Some(range) = req.date_range() {
                assert!(first.items.iter().all(|i| range.contains(i.created_at)));
            }

            assert_eq!(first.items, expected(&pages, &req), "seed {}", seed);
        }
    }
}
