//! Header/Row Sniffer
//!
//! Heuristic structure inference for uploads: column names and an approximate
//! row count, without full parsing or validation. The upload client runs it
//! before sending a file, and ingestion reuses [`count_rows`] for its own
//! fallback estimate.

use serde::Serialize;
use serde_json::Value;

/// Delimiters tried on the header line, in priority order
const DELIMITERS: [char; 3] = [',', ';', '\t'];

/// Column name used when a JSON document has no keys to offer
const PLACEHOLDER_COLUMN: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SniffResult {
    pub columns: Vec<String>,
    pub row_count: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SniffError {
    #[error("Error reading file: content is not valid UTF-8")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("Error parsing JSON file: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCounting {
    /// Every non-blank line is a row
    IncludeHeader,
    /// The first non-blank line is a header and does not count
    ExcludeHeader,
}

/// Count non-blank lines, optionally discounting a header line
pub fn count_rows(text: &str, counting: RowCounting) -> u64 {
    let lines = text.lines().filter(|line| !line.trim().is_empty()).count() as u64;
    match counting {
        RowCounting::IncludeHeader => lines,
        RowCounting::ExcludeHeader => lines.saturating_sub(1),
    }
}

fn is_json(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".json")
}

/// Infer columns and row count for a file about to be uploaded
pub fn sniff(filename: &str, bytes: &[u8]) -> Result<SniffResult, SniffError> {
    let text = std::str::from_utf8(bytes)?;
    if is_json(filename) {
        sniff_json(text)
    } else {
        sniff_delimited(text)
    }
}

fn sniff_json(text: &str) -> Result<SniffResult, SniffError> {
    let value: Value = serde_json::from_str(text)?;

    let result = match &value {
        Value::Array(items) => {
            let columns = match items.first() {
                Some(Value::Object(first)) => first.keys().cloned().collect(),
                _ => vec![PLACEHOLDER_COLUMN.to_string()],
            };
            SniffResult {
                columns,
                row_count: items.len() as u64,
            }
        }
        Value::Object(map) => SniffResult {
            columns: map.keys().cloned().collect(),
            row_count: 1,
        },
        _ => SniffResult {
            columns: vec![PLACEHOLDER_COLUMN.to_string()],
            row_count: 1,
        },
    };

    Ok(result)
}

fn sniff_delimited(text: &str) -> Result<SniffResult, SniffError> {
    let first_line = text.split('\n').next().unwrap_or_default().trim_end_matches('\r');

    // Plain split on the delimiter: quotes are only stripped per field, never interpreted
    let columns = match DELIMITERS.iter().find(|d| first_line.contains(**d)) {
        Some(&delimiter) => first_line.split(delimiter).map(clean_field).collect(),
        None => vec![clean_field(first_line)],
    };

    Ok(SniffResult {
        columns,
        row_count: count_rows(text, RowCounting::IncludeHeader),
    })
}

/// Trim whitespace and unwrap one pair of surrounding double quotes
fn clean_field(field: &str) -> String {
    let trimmed = field.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array_of_objects() {
        let result = sniff("data.json", br#"[{"a":1,"b":2}]"#).unwrap();
        assert_eq!(result.columns, vec!["a", "b"]);
        assert_eq!(result.row_count, 1);
    }

    #[test]
    fn test_json_keeps_document_key_order() {
        let result = sniff("DATA.JSON", br#"[{"zeta":1,"alpha":2},{"zeta":3,"alpha":4}]"#).unwrap();
        assert_eq!(result.columns, vec!["zeta", "alpha"]);
        assert_eq!(result.row_count, 2);
    }

    #[test]
    fn test_json_single_object() {
        let result = sniff("record.json", br#"{"name":"x","age":3}"#).unwrap();
        assert_eq!(result.columns, vec!["name", "age"]);
        assert_eq!(result.row_count, 1);
    }

    #[test]
    fn test_json_scalar_uses_placeholder() {
        let result = sniff("n.json", b"42").unwrap();
        assert_eq!(result.columns, vec!["data"]);
        assert_eq!(result.row_count, 1);
    }

    #[test]
    fn test_json_empty_array() {
        let result = sniff("empty.json", b"[]").unwrap();
        assert_eq!(result.columns, vec!["data"]);
        assert_eq!(result.row_count, 0);
    }

    #[test]
    fn test_malformed_json() {
        let err = sniff("broken.json", b"[{\"a\":").unwrap_err();
        assert!(matches!(err, SniffError::InvalidJson(_)));
    }

    #[test]
    fn test_not_utf8() {
        let err = sniff("bin.csv", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, SniffError::NotUtf8(_)));
    }

    #[test]
    fn test_csv_counts_header() {
        let result = sniff("ab.csv", b"a,b\n1,2\n3,4").unwrap();
        assert_eq!(result.columns, vec!["a", "b"]);
        assert_eq!(result.row_count, 3);
    }

    #[test]
    fn test_delimiter_priority() {
        let result = sniff("x.csv", b"a;b,c\n").unwrap();
        assert_eq!(result.columns, vec!["a;b", "c"]);

        let result = sniff("x.csv", b"a;b\tc\n").unwrap();
        assert_eq!(result.columns, vec!["a", "b\tc"]);

        let result = sniff("x.tsv", b"a\tb\n1\t2\n").unwrap();
        assert_eq!(result.columns, vec!["a", "b"]);
    }

    #[test]
    fn test_quoted_and_padded_headers() {
        let result = sniff("q.csv", b"\"id\", \"full name\" ,email\r\n1,Ann,a@x\r\n").unwrap();
        assert_eq!(result.columns, vec!["id", "full name", "email"]);
        assert_eq!(result.row_count, 2);
    }

    #[test]
    fn test_quotes_are_not_interpreted() {
        let result = sniff("x.csv", b"\"id,name,age\n1,2,3\n").unwrap();
        assert_eq!(result.columns, vec!["\"id", "name", "age"]);

        let result = sniff("x.csv", b"\"last, first\",age\n").unwrap();
        assert_eq!(result.columns, vec!["\"last", "first\"", "age"]);

        let result = sniff("x.csv", b"a,\"b\"\"c\"\n").unwrap();
        assert_eq!(result.columns, vec!["a", "b\"\"c"]);
    }

    #[test]
    fn test_no_delimiter_single_column() {
        let result = sniff("notes.txt", b"  just one heading  \nline\n\n   \nline\n").unwrap();
        assert_eq!(result.columns, vec!["just one heading"]);
        assert_eq!(result.row_count, 3);
    }

    #[test]
    fn test_count_rows() {
        let text = "a,b\n1,2\n\n3,4\n";
        assert_eq!(count_rows(text, RowCounting::IncludeHeader), 3);
        assert_eq!(count_rows(text, RowCounting::ExcludeHeader), 2);
        assert_eq!(count_rows("", RowCounting::ExcludeHeader), 0);
        assert_eq!(count_rows("   \n", RowCounting::ExcludeHeader), 0);
    }
}
