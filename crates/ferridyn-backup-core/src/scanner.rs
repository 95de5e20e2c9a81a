//! Full paginated read of a single table.

use tracing::debug;

use crate::error::ScanPageError;
use crate::source::TableSource;
use crate::types::{Item, ScanCursor};

enum ScanState {
    Start,
    Continue(ScanCursor),
    Done,
}

/// Pulls the pages of one table in order.
///
/// The first request carries no start cursor; every following request
/// carries the cursor returned by the previous page. The scan ends after a
/// page without a cursor or after the first failed page, and cannot be
/// restarted.
pub struct TableScanner<'a, S: TableSource> {
    source: &'a mut S,
    table: &'a str,
    limit: Option<usize>,
    state: ScanState,
    pages: usize,
}

/// Everything a scan produced, including the error that cut it short.
#[derive(Debug)]
pub struct ScanResult {
    pub items: Vec<Item>,
    pub pages: usize,
    pub error: Option<ScanPageError>,
}

impl ScanResult {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

impl<'a, S: TableSource> TableScanner<'a, S> {
    pub fn new(source: &'a mut S, table: &'a str) -> Self {
        Self {
            source,
            table,
            limit: None,
            state: ScanState::Start,
            pages: 0,
        }
    }

    /// Item limit sent with every request.
    pub fn page_size(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Fetch the next page. `Ok(None)` once the table is exhausted or a
    /// previous page failed.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Item>>, ScanPageError> {
        let start = match std::mem::replace(&mut self.state, ScanState::Done) {
            ScanState::Done => return Ok(None),
            ScanState::Start => None,
            ScanState::Continue(cursor) => Some(cursor),
        };

        let page_number = self.pages + 1;
        let page = self
            .source
            .scan_page(self.table, start, self.limit)
            .await
            .map_err(|e| ScanPageError::new(self.table, page_number, e))?;

        self.pages = page_number;
        debug!(
            table = %self.table,
            page = page_number,
            items = page.items.len(),
            more = page.next_cursor.is_some(),
            "scanned page"
        );

        if let Some(cursor) = page.next_cursor {
            self.state = ScanState::Continue(cursor);
        }
        Ok(Some(page.items))
    }

    /// Drain the scan into memory. Items from pages before a failure are
    /// kept.
    ///
    /// This is the whole-table form of a scan. Callers that write while
    /// reading, like the orchestrator, pull pages with
    /// [`next_page`](Self::next_page) instead so that only one page is held
    /// at a time.
    pub async fn read_all(mut self) -> ScanResult {
        let mut items = Vec::new();
        loop {
            match self.next_page().await {
                Ok(Some(page)) => items.extend(page),
                Ok(None) => {
                    return ScanResult {
                        items,
                        pages: self.pages,
                        error: None,
                    };
                }
                Err(e) => {
                    return ScanResult {
                        items,
                        pages: self.pages,
                        error: Some(e),
                    };
                }
            }
        }
    }

    /// Pages fetched successfully so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }
}
