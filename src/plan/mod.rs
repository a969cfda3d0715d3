//! Plan pipeline for Rowbot.
//!
//! Turns a delimited file into an ordered action plan in four stages:
//! - `load`: read raw rows from text/reader/path (blank lines preserved).
//! - `section`: split rows into header+data sections with absolute line numbers.
//! - `header`: parse one header cell into its action token.
//! - `compile`: bind data rows to tokens and apply start-row/max-rows windowing.
//!
//! Example:
//! use rowbot::plan::{self, CompileOptions};
//!
//! let rows = plan::rows_from_str("text_1,tab_1\nhello,2\n")?;
//! let entries = plan::compile_rows(&rows, CompileOptions::default())?;

pub mod compile;
pub mod error;
pub mod header;
pub mod load;
pub mod section;

// Re-export the pipeline types
pub use compile::{Action, CompileOptions, PlanEntry, bind_row, compile_plan};
pub use error::PlanError;
pub use header::{HeaderToken, Point, TokenKind, parse_cell, parse_coords};
pub use section::{DataRow, Section, is_blank_row, split_sections};

// Re-export loader utilities
pub use load::{rows_from_path, rows_from_path_async, rows_from_reader, rows_from_str};

/// Convenience: split raw rows into sections and compile them in one step.
pub fn compile_rows(
    rows: &[Vec<String>],
    opts: CompileOptions,
) -> Result<Vec<PlanEntry>, PlanError> {
    let sections = split_sections(rows)?;
    compile_plan(&sections, opts)
}
