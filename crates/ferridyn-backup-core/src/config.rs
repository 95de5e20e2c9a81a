//! Backup configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What to do with the items already fetched when a table's scan fails
/// part-way through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialPolicy {
    /// Write the truncated snapshot and a `{table}_backup.partial.json`
    /// marker next to it.
    #[default]
    Keep,
    /// Drop the truncated snapshot. A previous snapshot at the target path is
    /// left as it was.
    Discard,
}

/// Settings for one backup run.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Existing directory that receives the snapshot files.
    pub backup_dir: PathBuf,
    /// Replace snapshots left by an earlier run.
    pub overwrite_existing: bool,
    /// Item limit sent with every scan request.
    pub page_size: Option<usize>,
    pub partial_policy: PartialPolicy,
}

impl BackupConfig {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            overwrite_existing: true,
            page_size: None,
            partial_policy: PartialPolicy::default(),
        }
    }

    pub fn overwrite_existing(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    /// Set the per-request item limit. A limit of zero is treated as no
    /// limit.
    pub fn page_size(mut self, limit: Option<usize>) -> Self {
        self.page_size = limit.filter(|n| *n > 0);
        self
    }

    pub fn partial_policy(mut self, policy: PartialPolicy) -> Self {
        self.partial_policy = policy;
        self
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}
