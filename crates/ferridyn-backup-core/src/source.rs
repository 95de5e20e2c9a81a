//! The read API a backup consumes.

use crate::types::{ScanCursor, ScanPage};

/// An already-authorized handle to the database being backed up.
///
/// The orchestrator owns its source and issues one request at a time, so
/// implementations are free to hold a single connection.
#[allow(async_fn_in_trait)]
pub trait TableSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// List every table name visible to this handle, in backend order.
    async fn list_tables(&mut self) -> Result<Vec<String>, Self::Error>;

    /// Fetch one page of `table`, starting after `start` when given.
    ///
    /// `limit` caps the number of items in the page; `None` lets the backend
    /// choose.
    async fn scan_page(
        &mut self,
        table: &str,
        start: Option<ScanCursor>,
        limit: Option<usize>,
    ) -> Result<ScanPage, Self::Error>;
}

impl<S: TableSource> TableSource for &mut S {
    type Error = S::Error;

    async fn list_tables(&mut self) -> Result<Vec<String>, Self::Error> {
        (**self).list_tables().await
    }

    async fn scan_page(
        &mut self,
        table: &str,
        start: Option<ScanCursor>,
        limit: Option<usize>,
    ) -> Result<ScanPage, Self::Error> {
        (**self).scan_page(table, start, limit).await
    }
}
