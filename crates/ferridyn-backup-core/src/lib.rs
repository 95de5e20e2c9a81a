//! # ferridyn-backup-core
//!
//! The read-and-persist pipeline behind `ferridyn-backup`: enumerate every
//! table visible through a [`TableSource`], scan each one page by page, and
//! stream the items into a per-table JSON snapshot file.
//!
//! Tables are processed one at a time. A failed page truncates only that
//! table's snapshot, a failed write fails only that table, and only a failed
//! table listing aborts the run.
//!
//! ```no_run
//! use ferridyn_backup_core::{BackupConfig, BackupOrchestrator, TableSource};
//!
//! async fn backup<S: TableSource>(source: S) {
//!     let config = BackupConfig::new("backups").overwrite_existing(true);
//!     let mut orchestrator = BackupOrchestrator::new(source, config);
//!     let report = orchestrator.run().await.unwrap();
//!     assert!(report.is_complete());
//! }
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod scanner;
pub mod source;
pub mod types;
pub mod writer;

#[cfg(test)]
mod testing;

pub use config::{BackupConfig, PartialPolicy};
pub use error::{ListError, ScanPageError, WriteError};
pub use orchestrator::BackupOrchestrator;
pub use report::{BackupReport, TableOutcome, TableReport};
pub use scanner::{ScanResult, TableScanner};
pub use source::TableSource;
pub use types::{Item, ScanCursor, ScanPage};
pub use writer::{SnapshotFile, SnapshotWriter};
