//! Wire protocol: JSON-over-newlines request/response types.
//!
//! Only the read operations used by a backup are modelled here. Each request
//! is a single JSON line; each response is a single JSON line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    ListTables,
    Scan {
        table: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exclusive_start_key: Option<Value>,
    },
}

/// Successful `list_tables` response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct TablesResponse {
    pub ok: bool,
    pub tables: Vec<String>,
}

/// Successful `scan` response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub ok: bool,
    pub items: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Value>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}
