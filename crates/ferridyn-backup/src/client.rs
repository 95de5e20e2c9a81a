//! Client for reading tables from a `ferridyn-server` via Unix socket.
//!
//! Each method serializes a JSON-line request, sends it, reads a JSON-line
//! response, and returns the parsed result.

use std::path::Path;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

use ferridyn_backup_core::{ScanCursor, ScanPage, TableSource};

use crate::error::ClientError;
use crate::protocol::{ErrorResponse, ItemsResponse, Request, TablesResponse};

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Read-only client for a FerridynDB server.
pub struct BackupClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    line_buf: String,
}

impl BackupClient {
    /// Connect to a FerridynDB server at the given Unix socket path.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let stream = UnixStream::connect(path.as_ref()).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            line_buf: String::new(),
        })
    }

    /// List all tables.
    pub async fn list_tables(&mut self) -> Result<Vec<String>> {
        let resp = self.send_request(&Request::ListTables).await?;
        tables_from_response(resp)
    }

    /// Read one page of a table, starting after `exclusive_start_key`.
    pub async fn scan(
        &mut self,
        table: &str,
        limit: Option<usize>,
        exclusive_start_key: Option<Value>,
    ) -> Result<ItemsResponse> {
        let req = Request::Scan {
            table: table.to_string(),
            limit,
            exclusive_start_key,
        };
        let resp = self.send_request(&req).await?;
        items_from_response(resp)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    async fn send_request(&mut self, req: &Request) -> Result<Value> {
        let mut data = serde_json::to_vec(req).map_err(ClientError::Serialization)?;
        data.push(b'\n');
        self.writer.write_all(&data).await?;
        self.writer.flush().await?;

        self.line_buf.clear();
        let n = self.reader.read_line(&mut self.line_buf).await?;
        if n == 0 {
            return Err(ClientError::Disconnected);
        }

        let resp: Value =
            serde_json::from_str(self.line_buf.trim()).map_err(ClientError::Serialization)?;
        Ok(resp)
    }
}

impl TableSource for BackupClient {
    type Error = ClientError;

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        BackupClient::list_tables(self).await
    }

    async fn scan_page(
        &mut self,
        table: &str,
        start: Option<ScanCursor>,
        limit: Option<usize>,
    ) -> Result<ScanPage> {
        let resp = self
            .scan(table, limit, start.map(ScanCursor::into_value))
            .await?;
        Ok(ScanPage {
            items: resp.items,
            next_cursor: ScanCursor::from_key(resp.last_evaluated_key),
        })
    }
}

// ---------------------------------------------------------------------------
// Response parsing helpers
// ---------------------------------------------------------------------------

fn check_error(resp: &Value) -> Result<()> {
    if let Some(err) = resp.get("error") {
        let error = err.as_str().unwrap_or("Unknown").to_string();
        let message = resp
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("")
            .to_string();
        return Err(ClientError::Server(ErrorResponse { error, message }));
    }
    Ok(())
}

fn tables_from_response(resp: Value) -> Result<Vec<String>> {
    check_error(&resp)?;
    let parsed: TablesResponse = serde_json::from_value(resp)
        .map_err(|e| ClientError::Protocol(format!("malformed list_tables response: {e}")))?;
    Ok(parsed.tables)
}

fn items_from_response(resp: Value) -> Result<ItemsResponse> {
    check_error(&resp)?;
    serde_json::from_value(resp)
        .map_err(|e| ClientError::Protocol(format!("malformed scan response: {e}")))
}
