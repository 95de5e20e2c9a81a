//! Integration tests: start an in-process JSON-line server on a temp socket,
//! connect a `BackupClient`, and run full backups through it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{Duration, sleep};

use ferridyn_backup::protocol::{ErrorResponse, ItemsResponse, Request, TablesResponse};
use ferridyn_backup::{BackupClient, ClientError};
use ferridyn_backup_core::{BackupConfig, BackupOrchestrator, TableOutcome};

/// Table contents served by the test server, plus failure switches.
#[derive(Default)]
struct Fixture {
    tables: BTreeMap<String, Vec<Value>>,
    /// Tables whose scan fails once the start offset reaches this value.
    fail_at_offset: BTreeMap<String, usize>,
    fail_list: bool,
    page_size: usize,
}

impl Fixture {
    fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    fn table(mut self, name: &str, items: Vec<Value>) -> Self {
        self.tables.insert(name.to_string(), items);
        self
    }
}

fn dispatch(fx: &Fixture, req: Request) -> Value {
    match req {
        Request::ListTables => {
            if fx.fail_list {
                return json!(ErrorResponse::new("AccessDenied", "not authorized"));
            }
            json!(TablesResponse {
                ok: true,
                tables: fx.tables.keys().cloned().collect(),
            })
        }
        Request::Scan {
            table,
            limit,
            exclusive_start_key,
        } => {
            let Some(items) = fx.tables.get(&table) else {
                return json!(ErrorResponse::new(
                    "TableNotFound",
                    format!("table not found: {table}")
                ));
            };
            let start = exclusive_start_key
                .as_ref()
                .and_then(|k| k["offset"].as_u64())
                .unwrap_or(0) as usize;
            if fx.fail_at_offset.get(&table).is_some_and(|o| start >= *o) {
                return json!(ErrorResponse::new("ThrottlingException", "slow down"));
            }
            let page = limit.unwrap_or(fx.page_size).min(fx.page_size);
            let end = (start + page).min(items.len());
            let last_evaluated_key = (end < items.len()).then(|| json!({"offset": end}));
            json!(ItemsResponse {
                ok: true,
                items: items[start..end].to_vec(),
                last_evaluated_key,
            })
        }
    }
}

async fn handle_connection(fx: Arc<Fixture>, stream: UnixStream) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let response = match serde_json::from_str::<Request>(line.trim()) {
            Ok(req) => dispatch(&fx, req),
            Err(e) => json!(ErrorResponse::new("ParseError", e.to_string())),
        };
        let mut bytes = serde_json::to_vec(&response).unwrap();
        bytes.push(b'\n');
        writer.write_all(&bytes).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Start a server on a temp socket and return the socket path.
/// The server runs in a background tokio task.
async fn start_test_server(fx: Fixture) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("test.sock");
    let listener = UnixListener::bind(&socket_path).unwrap();
    let fx = Arc::new(fx);

    tokio::spawn(async move {
        while let Ok((stream, _addr)) = listener.accept().await {
            let fx = fx.clone();
            tokio::spawn(async move {
                let _ = handle_connection(fx, stream).await;
            });
        }
    });

    // Give the server a moment to start accepting.
    sleep(Duration::from_millis(20)).await;

    (dir, socket_path)
}

fn read_snapshot(dir: &Path, table: &str) -> Vec<Value> {
    let text = fs::read_to_string(dir.join(format!("{table}_backup.json"))).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn users(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"id": format!("user-{i:03}"), "age": 20 + i, "tags": ["a", i.to_string()]}))
        .collect()
}

#[tokio::test]
async fn test_backup_orders_and_users() {
    let fx = Fixture::new(10)
        .table(
            "Orders",
            vec![json!({"id": "o1", "total": 12.5}), json!({"id": "o2", "total": 3})],
        )
        .table("Users", vec![]);
    let (_dir, sock) = start_test_server(fx).await;
    let out = tempdir().unwrap();

    let client = BackupClient::connect(&sock).await.unwrap();
    let mut orchestrator = BackupOrchestrator::new(client, BackupConfig::new(out.path()));
    let report = orchestrator.run().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.tables.len(), 2);
    assert_eq!(read_snapshot(out.path(), "Orders").len(), 2);
    assert_eq!(
        fs::read_to_string(out.path().join("Users_backup.json")).unwrap(),
        "[]"
    );
}

#[tokio::test]
async fn test_multi_page_scan_follows_last_evaluated_key() {
    let items = users(23);
    let (_dir, sock) = start_test_server(Fixture::new(5).table("users", items.clone())).await;
    let out = tempdir().unwrap();

    let client = BackupClient::connect(&sock).await.unwrap();
    let mut orchestrator = BackupOrchestrator::new(client, BackupConfig::new(out.path()));
    let report = orchestrator.run().await.unwrap();

    let entry = report.get("users").unwrap();
    assert!(entry.is_complete());
    assert_eq!(entry.pages, 5);
    assert_eq!(entry.items, 23);
    assert_eq!(read_snapshot(out.path(), "users"), items);
}

#[tokio::test]
async fn test_page_size_limits_requests() {
    let items = users(6);
    let (_dir, sock) = start_test_server(Fixture::new(100).table("users", items.clone())).await;
    let out = tempdir().unwrap();

    let client = BackupClient::connect(&sock).await.unwrap();
    let config = BackupConfig::new(out.path()).page_size(Some(4));
    let report = BackupOrchestrator::new(client, config).run().await.unwrap();

    assert_eq!(report.get("users").unwrap().pages, 2);
    assert_eq!(read_snapshot(out.path(), "users"), items);
}

#[tokio::test]
async fn test_throttled_page_produces_partial_snapshot() {
    let items = users(9);
    let mut fx = Fixture::new(3)
        .table("flaky", items.clone())
        .table("stable", users(2));
    fx.fail_at_offset.insert("flaky".to_string(), 6);
    let (_dir, sock) = start_test_server(fx).await;
    let out = tempdir().unwrap();

    let client = BackupClient::connect(&sock).await.unwrap();
    let mut orchestrator = BackupOrchestrator::new(client, BackupConfig::new(out.path()));
    let report = orchestrator.run().await.unwrap();

    let flaky = report.get("flaky").unwrap();
    match &flaky.outcome {
        TableOutcome::Partial { error } => {
            assert!(error.contains("page 3"), "{error}");
            assert!(error.contains("ThrottlingException"), "{error}");
        }
        other => panic!("expected partial, got: {other:?}"),
    }
    assert_eq!(read_snapshot(out.path(), "flaky"), items[..6].to_vec());
    assert!(out.path().join("flaky_backup.partial.json").exists());

    assert!(report.get("stable").unwrap().is_complete());
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_list_failure_aborts_run() {
    let mut fx = Fixture::new(3).table("t", users(1));
    fx.fail_list = true;
    let (_dir, sock) = start_test_server(fx).await;
    let out = tempdir().unwrap();

    let client = BackupClient::connect(&sock).await.unwrap();
    let mut orchestrator = BackupOrchestrator::new(client, BackupConfig::new(out.path()));
    let err = orchestrator.run().await.unwrap_err();
    assert!(err.to_string().contains("AccessDenied"));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_client_reports_server_errors() {
    let (_dir, sock) = start_test_server(Fixture::new(3)).await;
    let mut client = BackupClient::connect(&sock).await.unwrap();

    assert!(client.list_tables().await.unwrap().is_empty());
    let err = client.scan("missing", None, None).await.unwrap_err();
    match err {
        ClientError::Server(resp) => assert_eq!(resp.error, "TableNotFound"),
        other => panic!("expected server error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_connect_to_missing_socket_fails() {
    let dir = tempdir().unwrap();
    let result = BackupClient::connect(dir.path().join("nope.sock")).await;
    assert!(matches!(result, Err(ClientError::Io(_))));
}
