//! Minimal delimiter-aware CSV parsing for corpus exports.
//!
//! The corpus files come from archive exports with different delimiters per
//! language (`;` for the English export, `,` elsewhere) and contain quoted
//! fields with embedded delimiters, doubled-quote escapes, and newlines
//! inside article text. Only reading is supported.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("unterminated quoted field starting near byte {0}")]
    UnterminatedQuote(usize),

    #[error("row {row} has {got} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("missing column {0:?}")]
    MissingColumn(String),

    #[error("empty input")]
    Empty,
}

/// A parsed CSV file: one header row plus data rows.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Index of a named column.
    pub fn column(&self, name: &str) -> Result<usize, CsvError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CsvError::MissingColumn(name.to_string()))
    }
}

/// Parse CSV content with the given delimiter. Quoted fields may contain the
/// delimiter, newlines, and doubled-quote escapes.
pub fn parse_csv(content: &str, delimiter: char) -> Result<CsvTable, CsvError> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quote_start = 0;

    let mut chars = content.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        if in_quotes {
            if c == '"' {
                if matches!(chars.peek(), Some((_, '"'))) {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.is_empty() {
            in_quotes = true;
            quote_start = pos;
        } else if c == delimiter {
            record.push(std::mem::take(&mut field));
        } else if c == '\n' {
            if field.ends_with('\r') {
                field.pop();
            }
            record.push(std::mem::take(&mut field));
            records.push(std::mem::take(&mut record));
        } else {
            field.push(c);
        }
    }
    if in_quotes {
        return Err(CsvError::UnterminatedQuote(quote_start));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    // Drop trailing fully-empty rows (a final newline produces one).
    while matches!(records.last(), Some(r) if r.iter().all(|f| f.is_empty())) {
        records.pop();
    }

    let mut iter = records.into_iter();
    let headers = iter.next().ok_or(CsvError::Empty)?;
    let rows: Vec<Vec<String>> = iter.collect();

    for (i, row) in rows.iter().enumerate() {
        if row.len() != headers.len() {
            return Err(CsvError::RaggedRow {
                row: i + 2,
                got: row.len(),
                expected: headers.len(),
            });
        }
    }

    Ok(CsvTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_comma_file() {
        let table = parse_csv("id,text\n1,hello\n2,world\n", ',').unwrap();
        assert_eq!(table.headers, vec!["id", "text"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["2", "world"]);
    }

    #[test]
    fn parses_semicolon_delimiter() {
        let table = parse_csv("date;id;fulltext\n1900-01-02;7;The boy worked.\n", ';').unwrap();
        assert_eq!(table.column("fulltext").unwrap(), 2);
        assert_eq!(table.rows[0][2], "The boy worked.");
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_newlines() {
        let table = parse_csv(
            "id,text\n1,\"line one\nline two, with comma\"\n",
            ',',
        )
        .unwrap();
        assert_eq!(table.rows[0][1], "line one\nline two, with comma");
    }

    #[test]
    fn doubled_quotes_escape() {
        let table = parse_csv("id,text\n1,\"he said \"\"no\"\"\"\n", ',').unwrap();
        assert_eq!(table.rows[0][1], "he said \"no\"");
    }

    #[test]
    fn crlf_line_endings() {
        let table = parse_csv("id,text\r\n1,abc\r\n", ',').unwrap();
        assert_eq!(table.rows[0], vec!["1", "abc"]);
    }

    #[test]
    fn ragged_row_is_rejected() {
        let err = parse_csv("a,b\n1\n", ',').unwrap_err();
        assert!(matches!(err, CsvError::RaggedRow { row: 2, .. }));
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert!(matches!(
            parse_csv("a,b\n1,\"open\n", ','),
            Err(CsvError::UnterminatedQuote(_))
        ));
    }

    #[test]
    fn missing_column_is_reported() {
        let table = parse_csv("a,b\n1,2\n", ',').unwrap();
        assert!(matches!(
            table.column("missing"),
            Err(CsvError::MissingColumn(_))
        ));
    }
}
