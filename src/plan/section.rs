use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::PlanError;
use super::header::{self, HeaderToken};

/// One data row, paired with its 1-based absolute line number in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataRow {
    pub line: usize,
    pub cells: Vec<String>,
}

/// One contiguous header+data block of the input file.
///
/// Sections are separated by blank rows; line numbers stay contiguous with
/// the source file (blank separators are counted but never stored).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    /// Parsed header cells in column order. Blank header cells are skipped,
    /// but each token keeps its original column index so data cells line up.
    pub header_tokens: Vec<HeaderToken>,
    pub data_rows: Vec<DataRow>,
    /// Absolute line number of the header row.
    pub start_line: usize,
    /// Absolute line number of the last data row (= `start_line` for a
    /// section with no data rows yet).
    pub end_line: usize,
}

/// A row is blank when every cell is empty or whitespace.
pub fn is_blank_row(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

/// Split raw file rows into sections.
///
/// The first non-blank row (or the row after a blank separator) is always a
/// header row; the non-blank rows that follow are its data rows. Consecutive
/// blank rows collapse into a single separator. A file opening with a blank
/// row has no header to attach it to and is rejected.
pub fn split_sections(rows: &[Vec<String>]) -> Result<Vec<Section>, PlanError> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for (idx, row) in rows.iter().enumerate() {
        let line = idx + 1;
        if is_blank_row(row) {
            if line == 1 {
                return Err(PlanError::SectionStructure { line });
            }
            if let Some(section) = current.take() {
                debug!(
                    target: "rowbot::plan",
                    start = section.start_line,
                    end = section.end_line,
                    rows = section.data_rows.len(),
                    "Section closed"
                );
                sections.push(section);
            }
            continue;
        }

        match current.as_mut() {
            None => {
                current = Some(Section {
                    header_tokens: parse_header_row(row, line)?,
                    data_rows: Vec::new(),
                    start_line: line,
                    end_line: line,
                });
            }
            Some(section) => {
                section.data_rows.push(DataRow {
                    line,
                    cells: row.clone(),
                });
                section.end_line = line;
            }
        }
    }

    if let Some(section) = current.take() {
        sections.push(section);
    }
    Ok(sections)
}

fn parse_header_row(row: &[String], line: usize) -> Result<Vec<HeaderToken>, PlanError> {
    let mut tokens = Vec::with_capacity(row.len());
    for (column, cell) in row.iter().enumerate() {
        if cell.trim().is_empty() {
            continue;
        }
        let (kind, seq) =
            header::parse_cell(cell).map_err(|e| PlanError::HeaderGrammar {
                line,
                column: column + 1,
                cell: cell.clone(),
                // Alternate formatting keeps the whole context chain, not
                // just the outermost message.
                reason: format!("{e:#}"),
            })?;
        tokens.push(HeaderToken {
            raw: cell.trim().to_string(),
            kind,
            seq,
            column,
        });
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_two_sections_with_contiguous_lines() {
        let rows = vec![
            row(&["text_1", "tab_2"]),
            row(&["alpha", "1"]),
            row(&["beta", "2"]),
            row(&["", ""]),
            row(&["enter_1"]),
            row(&["3"]),
            row(&["4"]),
        ];
        let sections = split_sections(&rows).unwrap();
        assert_eq!(sections.len(), 2);

        assert_eq!(sections[0].start_line, 1);
        assert_eq!(sections[0].end_line, 3);
        assert_eq!(sections[0].data_rows.len(), 2);
        assert_eq!(sections[0].data_rows[0].line, 2);

        assert_eq!(sections[1].start_line, 5);
        assert_eq!(sections[1].end_line, 7);
        assert_eq!(sections[1].data_rows.len(), 2);
        assert_eq!(sections[1].data_rows[1].line, 7);
    }

    #[test]
    fn test_consecutive_blank_rows_collapse() {
        let rows = vec![
            row(&["text_1"]),
            row(&["a"]),
            row(&[""]),
            row(&["", ""]),
            row(&[]),
            row(&["text_1"]),
            row(&["b"]),
        ];
        let sections = split_sections(&rows).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].start_line, 6);
    }

    #[test]
    fn test_section_without_data_rows_is_kept() {
        let rows = vec![row(&["text_1"]), row(&[""]), row(&["tab_1"])];
        let sections = split_sections(&rows).unwrap();
        assert_eq!(sections.len(), 2);
        assert!(sections[0].data_rows.is_empty());
    }

    #[test]
    fn test_leading_blank_row_is_structural_error() {
        let rows = vec![row(&["", ""]), row(&["text_1"]), row(&["a"])];
        assert_eq!(
            split_sections(&rows),
            Err(PlanError::SectionStructure { line: 1 })
        );
    }

    #[test]
    fn test_blank_header_cells_skipped_but_columns_kept() {
        let rows = vec![row(&["text_1", "", "tab_2"]), row(&["a", "junk", "3"])];
        let sections = split_sections(&rows).unwrap();
        let tokens = &sections[0].header_tokens;
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].column, 0);
        assert_eq!(tokens[1].column, 2);
    }

    #[test]
    fn test_bad_header_cell_names_position() {
        let rows = vec![row(&["text_1", "bogus_action_x"])];
        match split_sections(&rows) {
            Err(PlanError::HeaderGrammar { line, column, cell, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(column, 2);
                assert_eq!(cell, "bogus_action_x");
            }
            other => panic!("expected HeaderGrammar error, got {other:?}"),
        }
    }

    #[test]
    fn test_header_error_keeps_cause_chain() {
        let rows = vec![row(&["click-12q34_1"])];
        match split_sections(&rows) {
            Err(PlanError::HeaderGrammar { reason, .. }) => {
                assert!(reason.contains("fixed click parameter"), "reason: {reason}");
                assert!(reason.contains("expected 'XxY' or 'X,Y'"), "reason: {reason}");
            }
            other => panic!("expected HeaderGrammar error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_yields_no_sections() {
        assert_eq!(split_sections(&[]).unwrap(), Vec::new());
    }
}
