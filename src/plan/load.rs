use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read delimited rows from a string.
///
/// Blank separator lines carry meaning (they split sections) and absolute
/// line numbers address physical lines, so each physical line is parsed as
/// one CSV record; quoted fields may not span lines. A leading UTF-8 BOM is
/// stripped.
pub fn rows_from_str(content: &str) -> Result<Vec<Vec<String>>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            rows.push(Vec::new());
            continue;
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(line.as_bytes());
        let mut records = reader.records();
        match records.next() {
            Some(record) => {
                let record =
                    record.with_context(|| format!("line {}: malformed CSV record", idx + 1))?;
                rows.push(record.iter().map(str::to_string).collect());
            }
            None => rows.push(Vec::new()),
        }
    }
    Ok(rows)
}

/// Read delimited rows from any reader (e.g., a file).
pub fn rows_from_reader<R: Read>(mut reader: R) -> Result<Vec<Vec<String>>> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .context("Failed to read CSV input")?;
    rows_from_str(&content)
}

/// Read delimited rows from a file path synchronously.
pub fn rows_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open CSV file {}", path_ref.display()))?;
    let rows = rows_from_reader(file)?;
    debug!("Loaded {} lines from {}", rows.len(), path_ref.display());
    Ok(rows)
}

/// Read delimited rows from a file path asynchronously (Tokio).
pub async fn rows_from_path_async<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref)
        .await
        .with_context(|| format!("Failed to read CSV file {}", path_ref.display()))?;
    let rows = rows_from_str(&content)?;
    debug!("Loaded {} lines from {}", rows.len(), path_ref.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_kept_as_empty_rows() {
        let rows = rows_from_str("text_1,tab_2\na,1\n\nenter_1\n2\n").unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows[2].is_empty());
        assert_eq!(rows[3], vec!["enter_1".to_string()]);
    }

    #[test]
    fn test_quoted_cells_with_delimiters() {
        let rows = rows_from_str("text_1,text_2\n\"a, b\",\"say \"\"hi\"\"\"\n").unwrap();
        assert_eq!(rows[1], vec!["a, b".to_string(), "say \"hi\"".to_string()]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let rows = rows_from_str("\u{feff}text_1\nvalue\n").unwrap();
        assert_eq!(rows[0], vec!["text_1".to_string()]);
    }
}
