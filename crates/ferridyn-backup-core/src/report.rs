//! Per-table outcomes of a backup run.

use std::path::PathBuf;

use serde::Serialize;

/// How a single table's backup ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
    /// Every page was read and the snapshot was written.
    Complete,
    /// A page failed; only the items before it were captured.
    Partial { error: String },
    /// The snapshot could not be written.
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: String,
    #[serde(flatten)]
    pub outcome: TableOutcome,
    /// Items written to the snapshot.
    pub items: usize,
    /// Pages read successfully.
    pub pages: usize,
    /// Snapshot file, when one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl TableReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == TableOutcome::Complete
    }
}

/// Outcome of every table, in the order the tables were processed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupReport {
    pub tables: Vec<TableReport>,
}

impl BackupReport {
    /// True when every table was backed up in full. An account without
    /// tables is complete.
    pub fn is_complete(&self) -> bool {
        self.tables.iter().all(TableReport::is_complete)
    }

    pub fn complete(&self) -> impl Iterator<Item = &TableReport> {
        self.tables.iter().filter(|t| t.is_complete())
    }

    pub fn partial(&self) -> impl Iterator<Item = &TableReport> {
        self.tables
            .iter()
            .filter(|t| matches!(t.outcome, TableOutcome::Partial { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &TableReport> {
        self.tables
            .iter()
            .filter(|t| matches!(t.outcome, TableOutcome::Failed { .. }))
    }

    pub fn get(&self, table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == table)
    }
}
