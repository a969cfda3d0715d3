use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use rowbot::control::ControlHandle;
use rowbot::executor::{EntryMode, RunOptions, Runtime};
use rowbot::plan::{self, CompileOptions};

/// Rowbot CLI
#[derive(Debug, Parser)]
#[command(
    name = rowbot::PKG_NAME,
    version = rowbot::PKG_VERSION,
    about = "Replay spreadsheet rows as UI input (key combos, text, clicks, waits)"
)]
struct Args {
    /// Path to the CSV file
    csv_path: PathBuf,

    /// Seconds to wait before the first row
    #[arg(long = "startup-delay", default_value_t = 3.0)]
    startup_delay: f64,

    /// Seconds to wait between rows
    #[arg(long = "row-delay", default_value_t = 0.25)]
    row_delay: f64,

    /// Seconds to wait between actions
    #[arg(long = "action-delay", default_value_t = 0.25)]
    action_delay: f64,

    /// Bring to front a window whose title contains this text before each row
    #[arg(long = "window-title")]
    window_title: Option<String>,

    /// How to enter text for text_k columns
    #[arg(long = "entry-mode", value_enum, default_value = "clipboard")]
    entry_mode: EntryModeArg,

    /// Do not send any input, just describe the planned actions
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Start from this 1-based absolute line number of the file
    #[arg(long = "start-row", default_value_t = 1)]
    start_row: usize,

    /// If >0, process at most this many data rows across all sections
    #[arg(long = "max-rows", default_value_t = 0)]
    max_rows: usize,

    /// Print the compiled plan as JSON and exit
    #[arg(long = "print-plan")]
    print_plan: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum EntryModeArg {
    Typing,
    Clipboard,
}

impl From<EntryModeArg> for EntryMode {
    fn from(mode: EntryModeArg) -> Self {
        match mode {
            EntryModeArg::Typing => EntryMode::Typing,
            EntryModeArg::Clipboard => EntryMode::Clipboard,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Honor --log-level by initializing tracing at that level directly.
    if let Some(level) = &args.log_level {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" | "warning" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        };
        let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
    }

    if args.log_level.is_none() {
        rowbot::init_tracing();
    }
    info!(
        version = rowbot::PKG_VERSION,
        csv = %args.csv_path.display(),
        dry_run = args.dry_run,
        "Starting Rowbot"
    );

    // Compile the whole file up front; a malformed header or cell aborts
    // here, before any input is issued.
    let rows = plan::rows_from_path_async(&args.csv_path).await?;
    let sections = plan::split_sections(&rows)?;
    debug!(sections = sections.len(), lines = rows.len(), "File split");

    let compile_opts = CompileOptions {
        start_row: args.start_row,
        max_rows: (args.max_rows > 0).then_some(args.max_rows),
    };
    let entries = plan::compile_plan(&sections, compile_opts)?;
    info!(entries = entries.len(), "Plan compiled");

    if args.print_plan {
        let json = serde_json::to_string_pretty(&entries)?;
        println!("{json}");
        return Ok(());
    }

    let control = ControlHandle::new();
    let _listener = spawn_control_listener(control.clone());
    info!("Controls: 'p' + Enter pauses/resumes, 's' + Enter or Ctrl+C stops");

    let run_opts = RunOptions {
        startup_delay: Duration::from_secs_f64(args.startup_delay.max(0.0)),
        row_delay: Duration::from_secs_f64(args.row_delay.max(0.0)),
        action_delay: Duration::from_secs_f64(args.action_delay.max(0.0)),
        entry_mode: args.entry_mode.into(),
        dry_run: args.dry_run,
        window_title: args.window_title.clone(),
    };
    let mut runtime = Runtime::new(run_opts, control.clone());

    // The run loop blocks (input injection and delays are synchronous), so it
    // lives on a blocking thread while this task watches for Ctrl+C.
    let mut exec = tokio::task::spawn_blocking(move || runtime.run(&entries));

    tokio::select! {
        res = &mut exec => {
            let rows = res.context("executor task panicked")??;
            info!(rows, "Run finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping");
            control.stop();
            let rows = exec.await.context("executor task panicked")??;
            info!(rows, "Run stopped");
        }
    }

    info!("Rowbot exited");
    Ok(())
}

/// Listen on stdin for control commands and flip the shared mode.
///
/// This is the in-process stand-in for an OS global-hotkey registrar: the
/// core only ever sees the `ControlHandle`, so swapping in a real hotkey
/// source later changes nothing in the executor.
fn spawn_control_listener(control: ControlHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!(target: "rowbot::control", "EOF on stdin; control listener exiting");
                    break;
                }
                Ok(_) => match line.trim().to_lowercase().as_str() {
                    "" => {}
                    "p" | "pause" | "resume" => {
                        let mode = control.toggle_pause();
                        info!(target: "rowbot::control", ?mode, "Pause toggled");
                    }
                    "s" | "q" | "stop" | "quit" => {
                        control.stop();
                        info!(target: "rowbot::control", "Stop requested");
                        break;
                    }
                    other => {
                        warn!(
                            target: "rowbot::control",
                            input = other,
                            "Unrecognized control input (use 'p' or 's')"
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        target: "rowbot::control",
                        error = %e,
                        "Error reading control input; listener exiting"
                    );
                    break;
                }
            }
        }
    })
}
