//! FerridynDB backup client.
//!
//! Connects to a running `ferridyn-server` over its Unix socket and exposes
//! the two read operations a backup needs, `list_tables` and a paginated
//! `scan`, as a [`TableSource`](ferridyn_backup_core::TableSource).

pub mod client;
pub mod error;
pub mod protocol;

pub use client::BackupClient;
pub use error::ClientError;
