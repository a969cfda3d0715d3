use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

/// Modifier names allowed on the left side of a `+` combo.
pub const MODIFIERS: [&str; 3] = ["ctrl", "alt", "shift"];

/// Key names accepted as standalone single-key actions (e.g. `f9_4`, `esc_1`).
pub const SINGLE_KEYS: [&str; 24] = [
    "esc", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12", "home",
    "end", "pageup", "pagedown", "up", "down", "left", "right", "delete", "backspace", "space",
];

/// An absolute screen position.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// What a header column asks the executor to do for each data row.
///
/// This is the closed action vocabulary of the header grammar; the compiler
/// and executor match on it exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenKind {
    /// A modifier combo such as `ctrl+shift+d`. `paste` is set for `ctrl+v`,
    /// whose cell value (when non-blank) is written to the clipboard before
    /// the paste is issued.
    Combo { keys: Vec<String>, paste: bool },
    /// Type the cell value literally.
    Text,
    /// Press Tab; cell value is an optional repeat count.
    Tab,
    /// Press Shift+Tab; cell value is an optional repeat count.
    ShiftTab,
    /// Press Enter; cell value is an optional repeat count.
    Enter,
    /// Sleep; cell value is milliseconds.
    Wait,
    /// Click. With `fixed` coordinates from the header itself, the cell value
    /// is ignored; otherwise the cell must hold `XxY` or `X,Y`.
    Click { fixed: Option<Point> },
    /// Press one named key (`f1`..`f12`, `esc`, navigation/editing keys).
    Key { name: String },
}

/// One parsed header cell, bound to its position in the header row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderToken {
    /// The header cell as written, kept for error messages and logs.
    pub raw: String,
    pub kind: TokenKind,
    /// Trailing `_<seq>` ordering number. Not required to be unique.
    pub seq: u32,
    /// 0-based column index in the header row; data cells are looked up here.
    pub column: usize,
}

/// Parse one header cell of the form `action[-fixedparam]_seq`.
///
/// Stateless and deterministic: the same input always yields the same token.
/// Positioning (line/column) is attached by the section splitter, which is
/// the only caller that knows it.
pub fn parse_cell(raw: &str) -> Result<(TokenKind, u32)> {
    let cell = raw.trim();
    let Some((head, seq_str)) = cell.rsplit_once('_') else {
        bail!("missing '_<seq>' suffix");
    };
    let seq: u32 = seq_str
        .parse()
        .map_err(|_| anyhow!("sequence suffix '{seq_str}' is not an integer"))?;

    // The fixed parameter starts at the first '-' after the action name.
    // Recognized action names never contain '-'.
    let (action, fixparam) = match head.split_once('-') {
        Some((a, p)) => (a.to_ascii_lowercase(), Some(p)),
        None => (head.to_ascii_lowercase(), None),
    };
    if head.is_empty() || action.is_empty() {
        bail!("missing action name");
    }
    // Only click takes a fixed parameter. Anything else carrying one is more
    // likely a typo (e.g. tab-3_1 for a repeat) than an intent, so fail fast
    // instead of silently dropping it.
    if fixparam.is_some() && action != "click" {
        bail!("fixed parameter '-{}' is only supported on click", fixparam.unwrap_or(""));
    }

    let kind = match action.as_str() {
        "click" => TokenKind::Click {
            fixed: fixparam
                .map(parse_coords)
                .transpose()
                .with_context(|| format!("fixed click parameter '{}'", fixparam.unwrap_or("")))?,
        },
        "tab" => TokenKind::Tab,
        "shift+tab" => TokenKind::ShiftTab,
        "enter" => TokenKind::Enter,
        "text" => TokenKind::Text,
        "wait" => TokenKind::Wait,
        a if a.contains('+') => parse_combo(a)?,
        a if SINGLE_KEYS.contains(&a) => TokenKind::Key { name: a.to_string() },
        _ => bail!("unrecognized action '{action}'"),
    };
    Ok((kind, seq))
}

fn parse_combo(action: &str) -> Result<TokenKind> {
    let keys: Vec<String> = action
        .split('+')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    let Some((_terminal, modifiers)) = keys.split_last() else {
        bail!("empty combo");
    };
    if modifiers.is_empty() {
        bail!("combo '{action}' needs at least one modifier and a key");
    }
    for m in modifiers {
        if !MODIFIERS.contains(&m.as_str()) {
            bail!("unrecognized modifier '{m}' in combo '{action}'");
        }
    }
    let paste = keys.len() == 2 && keys[0] == "ctrl" && keys[1] == "v";
    Ok(TokenKind::Combo { keys, paste })
}

/// Parse `XxY` or `X,Y` coordinates (whitespace-tolerant, negatives allowed).
pub fn parse_coords(text: &str) -> Result<Point> {
    let t = text.trim();
    let (x, y) = t
        .split_once(['x', 'X', ','])
        .ok_or_else(|| anyhow!("expected 'XxY' or 'X,Y', got '{text}'"))?;
    let x: i32 = x
        .trim()
        .parse()
        .map_err(|_| anyhow!("bad X coordinate in '{text}'"))?;
    let y: i32 = y
        .trim()
        .parse()
        .map_err(|_| anyhow!("bad Y coordinate in '{text}'"))?;
    Ok(Point { x, y })
}
