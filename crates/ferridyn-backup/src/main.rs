//! FerridynDB backup binary.
//!
//! Connects to a running server and writes one JSON snapshot per table into
//! the output directory.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use ferridyn_backup::BackupClient;
use ferridyn_backup_core::{
    BackupConfig, BackupOrchestrator, BackupReport, PartialPolicy, TableOutcome,
};
use tracing::{error, info};

/// Exit code when every table was backed up in full.
const EXIT_OK: i32 = 0;
/// Exit code when the backup could not start or the table listing failed.
const EXIT_FATAL: i32 = 1;
/// Exit code when at least one table is partial or failed.
const EXIT_INCOMPLETE: i32 = 2;

/// Back up every table of a FerridynDB server to per-table JSON files.
#[derive(Parser, Debug)]
#[command(name = "ferridyn-backup", version)]
struct Cli {
    /// Unix socket path to connect to (default: ~/.local/share/ferridyn/server.sock).
    #[arg(short, long)]
    socket: Option<PathBuf>,

    /// Directory that receives `<table>_backup.json` files. Created if missing.
    #[arg(short, long, default_value = "Backup_ferridyn_tables")]
    output_dir: PathBuf,

    /// Fail a table instead of replacing a snapshot from an earlier run.
    #[arg(long)]
    no_overwrite: bool,

    /// Maximum number of items requested per scan page.
    #[arg(long)]
    page_size: Option<usize>,

    /// Drop a table's snapshot when its scan fails part-way instead of
    /// writing the truncated data with a `.partial.json` marker.
    #[arg(long)]
    discard_partial: bool,

    /// Print the final report as JSON on stdout.
    #[arg(short, long)]
    json: bool,
}

fn default_socket_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ferridyn")
        .join("server.sock")
}

impl Cli {
    fn backup_config(&self) -> BackupConfig {
        let policy = if self.discard_partial {
            PartialPolicy::Discard
        } else {
            PartialPolicy::Keep
        };
        BackupConfig::new(&self.output_dir)
            .overwrite_existing(!self.no_overwrite)
            .page_size(self.page_size)
            .partial_policy(policy)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(&cli).await {
        Ok(report) => {
            if cli.json {
                print_json(&report);
            } else {
                print_summary(&report);
            }
            if report.is_complete() {
                EXIT_OK
            } else {
                EXIT_INCOMPLETE
            }
        }
        Err(e) => {
            error!(error = %e, "backup aborted");
            EXIT_FATAL
        }
    };
    process::exit(code);
}

async fn run(cli: &Cli) -> Result<BackupReport, Box<dyn std::error::Error>> {
    let socket_path = cli.socket.clone().unwrap_or_else(default_socket_path);
    let config = cli.backup_config();

    std::fs::create_dir_all(config.backup_dir())?;
    info!(
        socket = %socket_path.display(),
        output_dir = %config.backup_dir().display(),
        "starting backup"
    );

    let client = BackupClient::connect(&socket_path).await.map_err(|e| {
        format!(
            "cannot connect to server at {}: {e}",
            socket_path.display()
        )
    })?;

    let mut orchestrator = BackupOrchestrator::new(client, config);
    let report = orchestrator.run().await?;
    Ok(report)
}

fn print_json(report: &BackupReport) {
    match serde_json::to_string_pretty(report) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Error: failed to serialize report: {e}"),
    }
}

fn print_summary(report: &BackupReport) {
    for t in &report.tables {
        let status = match &t.outcome {
            TableOutcome::Complete => "complete".to_string(),
            TableOutcome::Partial { error } => format!("PARTIAL ({error})"),
            TableOutcome::Failed { error } => format!("FAILED ({error})"),
        };
        let path = t
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<32} {:>8} items {:>5} pages  {}  {}",
            t.table, t.items, t.pages, path, status
        );
    }
    println!(
        "{} complete, {} partial, {} failed",
        report.complete().count(),
        report.partial().count(),
        report.failed().count()
    );
}
