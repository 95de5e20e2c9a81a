//! Data carried between the table source, the scanner, and the writer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record of a table. Items are passed through verbatim and never
/// inspected.
pub type Item = Value;

/// Opaque continuation token returned by a scan page.
///
/// A cursor received from one page must be sent back unchanged as the
/// exclusive start of the next request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanCursor(Value);

impl ScanCursor {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Interpret a backend key as a cursor. `null` means there is no cursor.
    pub fn from_key(value: Option<Value>) -> Option<Self> {
        match value {
            None | Some(Value::Null) => None,
            Some(v) => Some(Self(v)),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// A single page of scan results.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<Item>,
    /// Present when more pages remain.
    pub next_cursor: Option<ScanCursor>,
}

impl ScanPage {
    /// Last page of a scan.
    pub fn last(items: Vec<Item>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    /// A page followed by more data starting after `cursor`.
    pub fn more(items: Vec<Item>, cursor: ScanCursor) -> Self {
        Self {
            items,
            next_cursor: Some(cursor),
        }
    }
}
