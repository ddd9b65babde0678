//! Corpus loading from per-language archive exports.
//!
//! Each language corpus is one CSV export with its own delimiter and column
//! names. Articles get the composite id `date---id` used throughout the
//! pipeline (the statistics stage later parses year and source back out of
//! it).

pub mod csv;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use csv::{parse_csv, CsvError, CsvTable};

/// Column names of a corpus CSV export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusColumns {
    /// Column holding the full article text.
    pub text: String,
    /// Column holding the publication date.
    pub date: String,
    /// Column holding the source-specific article id.
    pub id: String,
}

impl Default for CorpusColumns {
    fn default() -> Self {
        Self {
            text: "fulltext".to_string(),
            date: "date".to_string(),
            id: "id".to_string(),
        }
    }
}

/// One article ready for annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusArticle {
    /// Composite id: `<date>---<source id>`.
    pub id: String,
    /// Full article text, never mutated downstream.
    pub text: String,
}

/// Load all articles from a corpus CSV.
pub fn load_articles(
    path: &Path,
    delimiter: char,
    columns: &CorpusColumns,
) -> Result<Vec<CorpusArticle>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus {}", path.display()))?;
    let articles = articles_from_csv(&content, delimiter, columns)
        .with_context(|| format!("Failed to parse corpus {}", path.display()))?;

    info!(count = articles.len(), corpus = %path.display(), "loaded corpus");
    Ok(articles)
}

fn articles_from_csv(
    content: &str,
    delimiter: char,
    columns: &CorpusColumns,
) -> Result<Vec<CorpusArticle>, CsvError> {
    let table = parse_csv(content, delimiter)?;
    let text_col = table.column(&columns.text)?;
    let date_col = table.column(&columns.date)?;
    let id_col = table.column(&columns.id)?;

    Ok(table
        .rows
        .iter()
        .map(|row| CorpusArticle {
            id: format!("{}---{}", row[date_col], row[id_col]),
            text: row[text_col].clone(),
        })
        .collect())
}
