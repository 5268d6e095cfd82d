use std::collections::VecDeque;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::schema::{Cursor, Page};

use super::adapter::PageSource;

/// In-memory source that replays a fixed script of responses.
///
/// Records every cursor it was asked for so tests can assert on the
/// exact call sequence. Once the script runs out it answers with an
/// exhausted empty page.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Page, SourceError>>>,
    calls: Mutex<Vec<(String, Cursor, usize)>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Page>) -> Self {
        Self::with_results(pages.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<Page, SourceError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }

    /// Cancels `token` right after the `n`-th call returns.
    pub fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn cursors(&self) -> Vec<Cursor> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, c, _)| c.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<(String, Cursor, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PageSource for ScriptedSource {

    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_page(
        &self,
        subject: &str,
        cursor: &Cursor,
        page_size: usize,
    ) -> Result<Page, SourceError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((subject.to_string(), cursor.clone(), page_size));
            calls.len()
        };

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Page::new(vec![], None)));

        if let Some((after, token)) = &self.cancel_after {
            if n >= *after {
                token.cancel();
            }
        }

        next
    }
}
