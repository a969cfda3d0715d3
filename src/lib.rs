#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Rowbot — a CSV-driven wrapper around the Enigo library for replaying
//! spreadsheet rows as UI input.
//!
//! A rowbot file is delimited text whose column headers declare actions
//! (`ctrl+v_1`, `tab_2`, `click-100x1200_1`, ...) and whose data rows supply
//! the per-row values. The crate compiles such a file into an ordered action
//! plan and executes it row by row, with pause/resume/stop control.
//!
//! Module map:
//! - `plan`: header grammar, section splitting, plan compilation, CSV loading.
//! - `executor`: low-level input injection and the plan-driving runtime.
//! - `control`: shared run/pause/stop state consumed by the executor.
//! - `utils`: window-focus helper.
//!
//! Use `rowbot::prelude::*` to bring commonly used items into scope quickly.

/// Public module: shared execution control state (run/pause/stop).
pub mod control;
/// Public module: execution engine (input injector and runtime).
pub mod executor;
/// Public module: plan pipeline (header parser, splitter, compiler, loader).
pub mod plan;
/// Public module: utilities (window helpers).
pub mod utils;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Initialize tracing (logging) with a reasonable default.
/// - Honors the `RUST_LOG` environment variable if set.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing() {
    use tracing::Level;
    use tracing_subscriber::fmt;

    // Parse RUST_LOG as a simple level (trace|debug|info|warn|error)
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| match s.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        })
        .unwrap_or(Level::INFO);

    // Ignore the error if the global subscriber was already set.
    let _ = fmt().with_max_level(level).try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use rowbot::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Timing helpers
    pub use std::time::Duration;
    pub use tokio::time::sleep;

    // External crates (namespaced) if callers want direct access
    pub use crate as rowbot;
    pub use enigo;

    // Frequently used internal modules
    pub use crate::{control, executor, plan, utils};
}
