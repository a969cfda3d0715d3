use thiserror::Error;

/// Errors raised while turning a rowbot file into an action plan.
///
/// All of these are fatal: compilation aborts before any input is issued, so a
/// broken file can never half-execute against the target application.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// A header cell did not match the `action[-fixedparam]_seq` grammar.
    #[error("line {line}, column {column}: bad header cell '{cell}': {reason}")]
    HeaderGrammar {
        /// 1-based absolute line number of the header row.
        line: usize,
        /// 1-based column of the offending cell.
        column: usize,
        /// The raw header cell text.
        cell: String,
        /// What exactly failed to parse.
        reason: String,
    },

    /// A data cell that must be numeric or coordinate-shaped is not.
    #[error("line {line}, column {column} ({header}): bad value '{value}': {reason}")]
    ValueFormat {
        /// 1-based absolute line number of the data row.
        line: usize,
        /// 1-based column of the offending cell.
        column: usize,
        /// The header cell this column was declared with.
        header: String,
        /// The raw cell text.
        value: String,
        reason: String,
    },

    /// The file shape is wrong, e.g. it opens with a blank line instead of a header row.
    #[error("line {line}: expected a header row, found a blank line")]
    SectionStructure { line: usize },
}
