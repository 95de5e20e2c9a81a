//! Drives a backup run: list the tables, then scan and write each in turn.

use tracing::{error, info, warn};

use crate::config::{BackupConfig, PartialPolicy};
use crate::error::{ListError, ScanPageError, WriteError};
use crate::report::{BackupReport, TableOutcome, TableReport};
use crate::scanner::TableScanner;
use crate::source::TableSource;
use crate::writer::{PartialMarker, SnapshotWriter};

/// Backs up every table of a [`TableSource`].
///
/// Tables are handled strictly one after another in the order the source
/// lists them. Only a failed listing ends the run early.
pub struct BackupOrchestrator<S> {
    source: S,
    writer: SnapshotWriter,
    config: BackupConfig,
}

impl<S: TableSource> BackupOrchestrator<S> {
    pub fn new(source: S, config: BackupConfig) -> Self {
        let writer = SnapshotWriter::new(&config);
        Self {
            source,
            writer,
            config,
        }
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Run the backup.
    ///
    /// Returns `Err` only when the table listing fails, in which case no
    /// snapshot file has been touched.
    pub async fn run(&mut self) -> Result<BackupReport, ListError> {
        let tables = match self.source.list_tables().await {
            Ok(tables) => tables,
            Err(e) => {
                error!(error = %e, "failed to list tables");
                return Err(ListError::new(e));
            }
        };
        info!(count = tables.len(), "found tables to back up");

        let mut report = BackupReport::default();
        for table in tables {
            info!(table = %table, "starting backup");
            let entry = self.backup_table(&table).await;
            match &entry.outcome {
                TableOutcome::Complete => info!(
                    table = %table,
                    items = entry.items,
                    pages = entry.pages,
                    path = ?entry.path,
                    "backup successful"
                ),
                TableOutcome::Partial { error } => warn!(
                    table = %table,
                    items = entry.items,
                    pages = entry.pages,
                    path = ?entry.path,
                    error = %error,
                    "backup is partial"
                ),
                TableOutcome::Failed { error } => error!(
                    table = %table,
                    error = %error,
                    "failed to write backup"
                ),
            }
            report.tables.push(entry);
        }

        info!(
            complete = report.complete().count(),
            partial = report.partial().count(),
            failed = report.failed().count(),
            "all table backups are completed"
        );
        Ok(report)
    }

    async fn backup_table(&mut self, table: &str) -> TableReport {
        let mut file = match self.writer.begin(table) {
            Ok(file) => file,
            Err(e) => return failed(table, 0, 0, e),
        };

        let mut scanner =
            TableScanner::new(&mut self.source, table).page_size(self.config.page_size);
        let scan_error: Option<ScanPageError> = loop {
            match scanner.next_page().await {
                Ok(Some(items)) => {
                    if let Err(e) = file.append(&items) {
                        return failed(table, file.items_written(), scanner.pages_fetched(), e);
                    }
                }
                Ok(None) => break None,
                Err(e) => {
                    warn!(table = %table, page = e.page, error = %e.source, "error scanning table");
                    break Some(e);
                }
            }
        };
        let pages = scanner.pages_fetched();
        let items = file.items_written();

        let Some(scan_error) = scan_error else {
            return match file.finish() {
                Ok(path) => {
                    // A leftover marker would claim this complete snapshot is
                    // truncated.
                    if let Err(e) = self.writer.clear_partial(table) {
                        return TableReport {
                            path: Some(path),
                            ..failed(table, items, pages, e)
                        };
                    }
                    TableReport {
                        table: table.to_string(),
                        outcome: TableOutcome::Complete,
                        items,
                        pages,
                        path: Some(path),
                    }
                }
                Err(e) => failed(table, items, pages, e),
            };
        };

        let outcome = TableOutcome::Partial {
            error: scan_error.to_string(),
        };
        match self.config.partial_policy {
            PartialPolicy::Discard => {
                drop(file);
                TableReport {
                    table: table.to_string(),
                    outcome,
                    items: 0,
                    pages,
                    path: None,
                }
            }
            PartialPolicy::Keep => {
                // The marker goes down first so a truncated snapshot never sits
                // at the final path without one.
                let marker = PartialMarker::new(table, items, pages, &scan_error);
                if let Err(e) = self.writer.mark_partial(&marker) {
                    return failed(table, items, pages, e);
                }
                let path = match file.finish() {
                    Ok(path) => path,
                    Err(e) => {
                        if let Err(clear) = self.writer.clear_partial(table) {
                            warn!(table = %table, error = %clear, "failed to remove partial marker");
                        }
                        return failed(table, items, pages, e);
                    }
                };
                TableReport {
                    table: table.to_string(),
                    outcome,
                    items,
                    pages,
                    path: Some(path),
                }
            }
        }
    }
}

fn failed(table: &str, items: usize, pages: usize, e: WriteError) -> TableReport {
    TableReport {
        table: table.to_string(),
        outcome: TableOutcome::Failed {
            error: e.to_string(),
        },
        items,
        pages,
        path: None,
    }
}
