//! In-memory `TableSource` with injectable failures.

use serde_json::{Value, json};
use thiserror::Error;

use crate::source::TableSource;
use crate::types::{Item, ScanCursor, ScanPage};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct FakeError(pub String);

struct FakeTable {
    name: String,
    pages: Vec<Vec<Item>>,
    /// 1-based page number whose request fails.
    fail_on_page: Option<usize>,
}

/// Tables are served page by page exactly as configured. Cursors carry the
/// table name and the index of the next page so tests can check that each
/// cursor is handed back unchanged.
#[derive(Default)]
pub struct MemorySource {
    tables: Vec<FakeTable>,
    fail_list: bool,
    pub scan_requests: Vec<(String, Option<Value>, Option<usize>)>,
    pub list_requests: usize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, name: &str, pages: Vec<Vec<Item>>) -> Self {
        self.tables.push(FakeTable {
            name: name.to_string(),
            pages,
            fail_on_page: None,
        });
        self
    }

    pub fn failing_table(mut self, name: &str, pages: Vec<Vec<Item>>, fail_on_page: usize) -> Self {
        self.tables.push(FakeTable {
            name: name.to_string(),
            pages,
            fail_on_page: Some(fail_on_page),
        });
        self
    }

    pub fn fail_listing(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn requests_for(&self, table: &str) -> Vec<Option<Value>> {
        self.scan_requests
            .iter()
            .filter(|(t, _, _)| t == table)
            .map(|(_, cursor, _)| cursor.clone())
            .collect()
    }
}

impl TableSource for MemorySource {
    type Error = FakeError;

    async fn list_tables(&mut self) -> Result<Vec<String>, FakeError> {
        self.list_requests += 1;
        if self.fail_list {
            return Err(FakeError("access denied".to_string()));
        }
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn scan_page(
        &mut self,
        table: &str,
        start: Option<ScanCursor>,
        limit: Option<usize>,
    ) -> Result<ScanPage, FakeError> {
        self.scan_requests.push((
            table.to_string(),
            start.as_ref().map(|c| c.as_value().clone()),
            limit,
        ));

        let t = self
            .tables
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(|| FakeError(format!("table not found: {table}")))?;

        let index = match &start {
            None => 0,
            Some(cursor) => {
                let v = cursor.as_value();
                if v["table"] != table {
                    return Err(FakeError("cursor belongs to another table".to_string()));
                }
                v["next"]
                    .as_u64()
                    .ok_or_else(|| FakeError("malformed cursor".to_string()))?
                    as usize
            }
        };

        if t.fail_on_page == Some(index + 1) {
            return Err(FakeError(format!("throttled on page {}", index + 1)));
        }

        let items = t.pages.get(index).cloned().unwrap_or_default();
        if index + 1 < t.pages.len() {
            Ok(ScanPage::more(
                items,
                ScanCursor::new(json!({"table": table, "next": index + 1})),
            ))
        } else {
            Ok(ScanPage::last(items))
        }
    }
}
