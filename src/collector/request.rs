use chrono::{DateTime, Utc};

use crate::error::CollectError;
use crate::util;

/// Inclusive time window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// Fails when `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CollectError> {
        if start > end {
            return Err(CollectError::invalid_request(format!(
                "date range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// What to collect.
///
/// Only constructible through [`CollectionRequest::new`], so a request
/// that exists is always valid:
/// - `subject` is non-empty (after trimming and dropping a leading `@`)
/// - `limit > 0`
/// - the date filter has both endpoints, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRequest {
    subject: String,
    limit: usize,
    date_range: Option<DateRange>,
}

impl CollectionRequest {
    pub fn new(
        subject: &str,
        limit: usize,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, CollectError> {
        let subject = util::normalize_subject(subject);
        if subject.is_empty() {
            return Err(CollectError::invalid_request("subject is empty"));
        }

        if limit == 0 {
            return Err(CollectError::invalid_request("limit must be positive"));
        }

        let date_range = match (start, end) {
            (Some(s), Some(e)) => Some(DateRange::new(s, e)?),
            (None, None) => None,
            _ => {
                return Err(CollectError::invalid_request(
                    "date range needs both a start and an end",
                ));
            }
        };

        Ok(Self {
            subject,
            limit,
            date_range,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }
}
