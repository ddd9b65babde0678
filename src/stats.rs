//! Label statistics over an annotated corpus.
//!
//! Counts resolved labels per publication year and per source, both parsed
//! back out of the composite record id. Label spelling is normalized by an
//! explicit mapping table applied here as a post-processing step; the
//! alignment engine itself never rewrites labels, since which spellings get
//! merged is a data-curation decision.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::output::record::AnnotatedRecord;

/// Ordered textual replacements merging label spelling variants.
///
/// Replacements apply in sequence, so a chain like
/// `Metaphors -> Metaphore -> Metaphor` funnels both old spellings into one.
#[derive(Debug, Clone)]
pub struct LabelNormalizer {
    replacements: Vec<(String, String)>,
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self {
            replacements: vec![
                ("Metaphors".to_string(), "Metaphore".to_string()),
                ("Metaphore".to_string(), "Metaphor".to_string()),
            ],
        }
    }
}

impl LabelNormalizer {
    /// A normalizer with no replacements (labels pass through untouched).
    pub fn identity() -> Self {
        Self {
            replacements: Vec::new(),
        }
    }

    pub fn with_replacement(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.replacements.push((from.into(), to.into()));
        self
    }

    pub fn apply(&self, label: &str) -> String {
        let mut normalized = label.to_string();
        for (from, to) in &self.replacements {
            normalized = normalized.replace(from.as_str(), to.as_str());
        }
        normalized
    }
}

/// Label counts bucketed by year (or decade) and by source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LabelCounts {
    pub per_year: BTreeMap<String, BTreeMap<String, u64>>,
    pub per_source: BTreeMap<String, BTreeMap<String, u64>>,
}

impl LabelCounts {
    pub fn total(&self) -> u64 {
        self.per_year.values().flat_map(|m| m.values()).sum()
    }

    /// Plain-text count table, one block per bucket.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_section(&mut out, "Labels per year", &self.per_year);
        render_section(&mut out, "Labels per source", &self.per_source);
        out
    }
}

fn render_section(out: &mut String, title: &str, buckets: &BTreeMap<String, BTreeMap<String, u64>>) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(title.len()));
    out.push('\n');
    for (bucket, labels) in buckets {
        out.push_str(&format!("{}\n", bucket));
        for (label, count) in labels {
            out.push_str(&format!("  {:<30} {}\n", label, count));
        }
    }
    out.push('\n');
}

/// Year and source parsed from a composite record id.
///
/// The batch runner writes `date---sourceid`; older corpora used
/// `date-_sourceid`. The source is the id part up to its first underscore.
fn id_parts(id: &str) -> Option<(String, String)> {
    let (date, source_id) = id
        .split_once("---")
        .or_else(|| id.split_once("-_"))?;
    let year = date.split('-').next()?.to_string();
    let source = source_id.split('_').next().unwrap_or(source_id).to_string();
    Some((year, source))
}

/// Collapse a year to its decade (`1895` -> `1890s`).
fn to_decade(year: &str) -> String {
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        format!("{}0s", &year[..3])
    } else {
        year.to_string()
    }
}

/// Count normalized labels across a JSONL corpus file. Records whose id
/// cannot be parsed are skipped with a warning. A compound label like
/// `Workplace; Reform` counts once per part.
pub fn analyze_corpus(
    path: &Path,
    normalizer: &LabelNormalizer,
    decade: bool,
) -> Result<LabelCounts> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
    );

    let mut counts = LabelCounts::default();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: AnnotatedRecord =
            serde_json::from_str(&line).context("Malformed corpus record")?;

        let Some((year, source)) = id_parts(&record.id) else {
            warn!(id = %record.id, "unparseable record id, skipped");
            continue;
        };
        let bucket = if decade { to_decade(&year) } else { year };

        let annotations = record.annotations.normalize()?;
        for annotation in &annotations {
            for part in annotation.label.split(';') {
                let label = normalizer.apply(part.trim());
                if label.is_empty() {
                    continue;
                }
                *counts
                    .per_year
                    .entry(bucket.clone())
                    .or_default()
                    .entry(label.clone())
                    .or_default() += 1;
                *counts
                    .per_source
                    .entry(source.clone())
                    .or_default()
                    .entry(label)
                    .or_default() += 1;
            }
        }
    }
    Ok(counts)
}
