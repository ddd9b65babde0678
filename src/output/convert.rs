//! Offline JSONL-to-JSON conversion.
//!
//! Downstream consumers want a single formatted JSON array rather than the
//! append-friendly JSONL the batch runner writes. Conversion also normalizes
//! any string-encoded `annotations` fields into nested arrays.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::record::AnnotatedRecord;

/// Read per-line records from `input`, normalize their annotations, and
/// write the whole set as one pretty-printed JSON array to `output`.
/// Blank lines are skipped; a malformed line is an error (the writer never
/// produces one, so it signals file corruption).
pub fn convert_jsonl_to_json(input: &Path, output: &Path) -> Result<usize> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?,
    );

    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", input.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: AnnotatedRecord = serde_json::from_str(&line)
            .with_context(|| format!("Malformed record at {}:{}", input.display(), line_no + 1))?;
        let record = record
            .normalized()
            .with_context(|| format!("Bad annotations at {}:{}", input.display(), line_no + 1))?;
        records.push(record);
    }

    let writer = BufWriter::new(
        File::create(output).with_context(|| format!("Failed to create {}", output.display()))?,
    );
    serde_json::to_writer_pretty(writer, &records)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(records = records.len(), output = %output.display(), "converted corpus");
    Ok(records.len())
}
