use serde::{Deserialize, Serialize};
use tracing::trace;

use super::error::PlanError;
use super::header::{self, HeaderToken, TokenKind};
use super::section::{DataRow, Section};

/// A single executable step bound from a header token and one data row.
///
/// Every payload is fully resolved at compile time; the executor only
/// dispatches, so a dry run describes exactly what a live run would send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Press a modifier combo. When `clipboard` is set (only ever for
    /// `ctrl+v` columns with a non-blank cell), that value is written to the
    /// system clipboard immediately before the combo is issued.
    Combo {
        keys: Vec<String>,
        clipboard: Option<String>,
    },
    /// Enter text; typed or pasted depending on the runtime's entry mode.
    Text { value: String },
    Tab { count: u32 },
    ShiftTab { count: u32 },
    Enter { count: u32 },
    Wait { ms: u64 },
    Click { x: i32, y: i32 },
    Key { name: String },
}

/// One compiled data row: its absolute line number and the ordered actions
/// derived from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanEntry {
    pub line: usize,
    pub actions: Vec<Action>,
}

/// Windowing applied while compiling.
#[derive(Debug, Copy, Clone)]
pub struct CompileOptions {
    /// 1-based absolute line number; data rows on earlier lines are skipped.
    pub start_row: usize,
    /// Cap on emitted entries across all sections combined; `None` = unlimited.
    pub max_rows: Option<usize>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            start_row: 1,
            max_rows: None,
        }
    }
}

/// Bind one data row against its section's header tokens.
///
/// Actions are ordered by ascending `seq`; tokens sharing a `seq` keep their
/// left-to-right column order (the sort is stable and tokens arrive in column
/// order).
pub fn bind_row(tokens: &[HeaderToken], row: &DataRow) -> Result<PlanEntry, PlanError> {
    let mut ordered: Vec<&HeaderToken> = tokens.iter().collect();
    ordered.sort_by_key(|t| t.seq);

    let mut actions = Vec::with_capacity(ordered.len());
    for token in ordered {
        // A cell past the end of a short row counts as blank.
        let cell = row
            .cells
            .get(token.column)
            .map(|c| c.trim())
            .unwrap_or("");
        actions.push(bind_token(token, cell, row.line)?);
    }
    trace!(
        target: "rowbot::plan",
        line = row.line,
        actions = actions.len(),
        "Row bound"
    );
    Ok(PlanEntry {
        line: row.line,
        actions,
    })
}

fn bind_token(token: &HeaderToken, cell: &str, line: usize) -> Result<Action, PlanError> {
    let value_error = |reason: &str| PlanError::ValueFormat {
        line,
        column: token.column + 1,
        header: token.raw.clone(),
        value: cell.to_string(),
        reason: reason.to_string(),
    };

    Ok(match &token.kind {
        TokenKind::Combo { keys, paste } => Action::Combo {
            keys: keys.clone(),
            clipboard: (*paste && !cell.is_empty()).then(|| cell.to_string()),
        },
        TokenKind::Text => Action::Text {
            value: cell.to_string(),
        },
        TokenKind::Tab => Action::Tab {
            count: parse_count(cell).map_err(|e| value_error(&e))?,
        },
        TokenKind::ShiftTab => Action::ShiftTab {
            count: parse_count(cell).map_err(|e| value_error(&e))?,
        },
        TokenKind::Enter => Action::Enter {
            count: parse_count(cell).map_err(|e| value_error(&e))?,
        },
        TokenKind::Wait => Action::Wait {
            ms: if cell.is_empty() {
                0
            } else {
                cell.parse()
                    .map_err(|_| value_error("expected milliseconds as an integer"))?
            },
        },
        TokenKind::Click { fixed: Some(p) } => Action::Click { x: p.x, y: p.y },
        TokenKind::Click { fixed: None } => {
            let p = header::parse_coords(cell).map_err(|e| value_error(&e.to_string()))?;
            Action::Click { x: p.x, y: p.y }
        }
        TokenKind::Key { name } => Action::Key { name: name.clone() },
    })
}

/// Repeat counts default to 1 on a blank cell; `0` is a valid no-op count.
fn parse_count(cell: &str) -> Result<u32, String> {
    if cell.is_empty() {
        return Ok(1);
    }
    cell.parse()
        .map_err(|_| "expected a repeat count as a non-negative integer".to_string())
}

/// Compile sections into the global ordered plan, applying windowing.
///
/// Rows are visited in file order, so the output is globally ordered by
/// absolute line number. The `max_rows` cap applies to the whole stream,
/// even when it lands mid-section.
pub fn compile_plan(
    sections: &[Section],
    opts: CompileOptions,
) -> Result<Vec<PlanEntry>, PlanError> {
    let start_row = opts.start_row.max(1);
    let mut plan = Vec::new();

    'sections: for section in sections {
        for row in &section.data_rows {
            if row.line < start_row {
                continue;
            }
            if let Some(cap) = opts.max_rows
                && plan.len() >= cap
            {
                break 'sections;
            }
            plan.push(bind_row(&section.header_tokens, row)?);
        }
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::section::split_sections;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn compile(raw: &[&[&str]], opts: CompileOptions) -> Result<Vec<PlanEntry>, PlanError> {
        compile_plan(&split_sections(&rows(raw))?, opts)
    }

    #[test]
    fn test_seq_orders_actions_with_column_tiebreak() {
        // text_1, tab_1, text_2, tab_2 reads left to right despite shared seqs.
        let plan = compile(
            &[
                &["text_1", "tab_1", "text_2", "tab_2"],
                &["first", "", "second", "3"],
            ],
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(
            plan[0].actions,
            vec![
                Action::Text {
                    value: "first".into()
                },
                Action::Tab { count: 1 },
                Action::Text {
                    value: "second".into()
                },
                Action::Tab { count: 3 },
            ]
        );
    }

    #[test]
    fn test_non_monotonic_column_layout() {
        let plan = compile(
            &[&["tab_2", "text_1"], &["4", "hello"]],
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(
            plan[0].actions,
            vec![
                Action::Text {
                    value: "hello".into()
                },
                Action::Tab { count: 4 },
            ]
        );
    }

    #[test]
    fn test_ctrl_v_clipboard_binding() {
        let plan = compile(
            &[&["ctrl+v_1", "ctrl+v_2"], &["paste me", ""]],
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(
            plan[0].actions,
            vec![
                Action::Combo {
                    keys: vec!["ctrl".into(), "v".into()],
                    clipboard: Some("paste me".into()),
                },
                Action::Combo {
                    keys: vec!["ctrl".into(), "v".into()],
                    clipboard: None,
                },
            ]
        );
    }

    #[test]
    fn test_click_fixed_coords_ignore_cell() {
        let plan = compile(
            &[&["click-100x1200_1", "click_2"], &["9x9", "50,60"]],
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(
            plan[0].actions,
            vec![
                Action::Click { x: 100, y: 1200 },
                Action::Click { x: 50, y: 60 },
            ]
        );
    }

    #[test]
    fn test_short_row_reads_as_blank_cells() {
        let plan = compile(
            &[&["text_1", "tab_2", "wait_3"], &["a"]],
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(
            plan[0].actions,
            vec![
                Action::Text { value: "a".into() },
                Action::Tab { count: 1 },
                Action::Wait { ms: 0 },
            ]
        );
    }

    #[test]
    fn test_bad_numeric_cell_is_value_error() {
        let err = compile(&[&["wait_1"], &["soon"]], CompileOptions::default()).unwrap_err();
        match err {
            PlanError::ValueFormat { line, column, header, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 1);
                assert_eq!(header, "wait_1");
                assert_eq!(value, "soon");
            }
            other => panic!("expected ValueFormat error, got {other:?}"),
        }
    }

    #[test]
    fn test_free_click_requires_coords() {
        // The second column keeps the data row non-blank; an all-blank row
        // would be a section separator, not a data row.
        let err = compile(&[&["click_1", "text_2"], &["", "x"]], CompileOptions::default())
            .unwrap_err();
        match err {
            PlanError::ValueFormat { line, column, header, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 1);
                assert_eq!(header, "click_1");
            }
            other => panic!("expected ValueFormat error, got {other:?}"),
        }
    }

    #[test]
    fn test_start_row_is_absolute_and_inclusive() {
        let raw: &[&[&str]] = &[
            &["text_1"],
            &["a"], // line 2
            &["b"], // line 3
            &[""],
            &["text_1"], // line 5
            &["c"],      // line 6
        ];
        let plan = compile(
            raw,
            CompileOptions {
                start_row: 3,
                max_rows: None,
            },
        )
        .unwrap();
        assert_eq!(plan.iter().map(|e| e.line).collect::<Vec<_>>(), vec![3, 6]);
    }

    #[test]
    fn test_start_row_past_eof_yields_empty_plan() {
        let plan = compile(
            &[&["text_1"], &["a"]],
            CompileOptions {
                start_row: 99,
                max_rows: None,
            },
        )
        .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_max_rows_caps_across_sections() {
        let raw: &[&[&str]] = &[
            &["text_1"],
            &["a"],
            &["b"],
            &[""],
            &["text_1"],
            &["c"],
            &["d"],
        ];
        let plan = compile(
            raw,
            CompileOptions {
                start_row: 1,
                max_rows: Some(3),
            },
        )
        .unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.iter().map(|e| e.line).collect::<Vec<_>>(), vec![2, 3, 6]);
    }

    #[test]
    fn test_single_key_and_wait_binding() {
        let plan = compile(
            &[&["f9_1", "wait_2"], &["", "250"]],
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(
            plan[0].actions,
            vec![Action::Key { name: "f9".into() }, Action::Wait { ms: 250 }]
        );
    }
}
