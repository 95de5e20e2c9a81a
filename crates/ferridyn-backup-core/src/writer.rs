//! Snapshot files.
//!
//! A snapshot is one JSON array per table, written to
//! `<backup_dir>/<table>_backup.json` with four-space indentation. Items are
//! appended as pages arrive so only one page is held in memory. The array is
//! built in a `.tmp` sibling and renamed into place once it is complete.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::config::BackupConfig;
use crate::error::WriteError;
use crate::types::Item;

const INDENT: &[u8] = b"    ";

pub const SNAPSHOT_SUFFIX: &str = "_backup.json";
pub const PARTIAL_MARKER_SUFFIX: &str = "_backup.partial.json";
const TMP_EXTENSION: &str = "tmp";

/// Sidecar written next to a snapshot that stopped short of the end of its
/// table.
#[derive(Debug, Clone, Serialize)]
pub struct PartialMarker {
    pub table: String,
    pub complete: bool,
    pub items: usize,
    pub pages: usize,
    pub error: String,
}

impl PartialMarker {
    pub fn new(table: &str, items: usize, pages: usize, error: impl ToString) -> Self {
        Self {
            table: table.to_string(),
            complete: false,
            items,
            pages,
            error: error.to_string(),
        }
    }
}

/// Creates snapshot files in the configured backup directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    overwrite_existing: bool,
}

impl SnapshotWriter {
    pub fn new(config: &BackupConfig) -> Self {
        Self {
            dir: config.backup_dir.clone(),
            overwrite_existing: config.overwrite_existing,
        }
    }

    /// Path of the snapshot for `table`.
    pub fn snapshot_path(&self, table: &str) -> Result<PathBuf, WriteError> {
        check_table_name(table)?;
        Ok(self.dir.join(format!("{table}{SNAPSHOT_SUFFIX}")))
    }

    /// Path of the partial-scan marker for `table`.
    pub fn partial_marker_path(&self, table: &str) -> Result<PathBuf, WriteError> {
        check_table_name(table)?;
        Ok(self.dir.join(format!("{table}{PARTIAL_MARKER_SUFFIX}")))
    }

    /// Start a new snapshot for `table`.
    ///
    /// Nothing at the final path is touched until [`SnapshotFile::finish`].
    pub fn begin(&self, table: &str) -> Result<SnapshotFile, WriteError> {
        let path = self.snapshot_path(table)?;
        if !self.overwrite_existing && path.exists() {
            return Err(WriteError::AlreadyExists(path));
        }
        SnapshotFile::create(path)
    }

    /// Write a whole snapshot in one call.
    pub fn write(&self, table: &str, items: &[Item]) -> Result<PathBuf, WriteError> {
        let mut file = self.begin(table)?;
        file.append(items)?;
        file.finish()
    }

    /// Record that the snapshot of `table` is truncated.
    pub fn mark_partial(&self, marker: &PartialMarker) -> Result<PathBuf, WriteError> {
        let path = self.partial_marker_path(&marker.table)?;
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
        marker.serialize(&mut ser)?;
        fs::write(&path, &buf).map_err(|e| WriteError::io(&path, e))?;
        Ok(path)
    }

    /// Remove a marker left by an earlier partial run. Missing markers are
    /// fine.
    pub fn clear_partial(&self, table: &str) -> Result<(), WriteError> {
        let path = self.partial_marker_path(table)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WriteError::io(&path, e)),
        }
    }
}

fn check_table_name(table: &str) -> Result<(), WriteError> {
    if table.is_empty() || table.contains(['/', '\\', '\0']) {
        return Err(WriteError::InvalidTableName(table.to_string()));
    }
    Ok(())
}

/// A snapshot being written.
///
/// Dropping it without calling [`finish`](Self::finish) deletes the
/// temporary file and leaves any previous snapshot in place.
#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
    tmp_path: PathBuf,
    out: BufWriter<File>,
    items: usize,
    finished: bool,
}

impl SnapshotFile {
    fn create(path: PathBuf) -> Result<Self, WriteError> {
        let tmp_path = path.with_extension(format!("json.{TMP_EXTENSION}"));
        let file = File::create(&tmp_path).map_err(|e| WriteError::io(&tmp_path, e))?;
        let mut out = BufWriter::new(file);
        out.write_all(b"[").map_err(|e| WriteError::io(&tmp_path, e))?;
        Ok(Self {
            path,
            tmp_path,
            out,
            items: 0,
            finished: false,
        })
    }

    /// Append items after those already written, in order.
    pub fn append(&mut self, items: &[Item]) -> Result<(), WriteError> {
        let mut buf = Vec::new();
        for item in items {
            buf.clear();
            let mut ser = serde_json::Serializer::with_formatter(
                &mut buf,
                PrettyFormatter::with_indent(INDENT),
            );
            item.serialize(&mut ser)?;

            let sep: &[u8] = if self.items == 0 { b"\n" } else { b",\n" };
            self.write_raw(sep)?;
            // Serialized JSON never contains a raw newline inside a string, so
            // splitting on '\n' only finds line breaks added by the formatter.
            for (i, line) in buf.split(|b| *b == b'\n').enumerate() {
                if i > 0 {
                    self.write_raw(b"\n")?;
                }
                self.write_raw(INDENT)?;
                self.write_raw(line)?;
            }
            self.items += 1;
        }
        Ok(())
    }

    /// Close the array, flush to disk, and move the file to its final path.
    pub fn finish(mut self) -> Result<PathBuf, WriteError> {
        let close: &[u8] = if self.items == 0 { b"]" } else { b"\n]" };
        self.write_raw(close)?;
        self.out
            .flush()
            .map_err(|e| WriteError::io(&self.tmp_path, e))?;
        self.out
            .get_ref()
            .sync_all()
            .map_err(|e| WriteError::io(&self.tmp_path, e))?;
        fs::rename(&self.tmp_path, &self.path).map_err(|e| WriteError::io(&self.path, e))?;
        self.finished = true;
        Ok(self.path.clone())
    }

    pub fn items_written(&self) -> usize {
        self.items
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.out
            .write_all(bytes)
            .map_err(|e| WriteError::io(&self.tmp_path, e))
    }
}

impl Drop for SnapshotFile {
    fn drop(&mut self) {
        if !self.finished {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}
