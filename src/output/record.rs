//! Persisted per-article record shape.
//!
//! The annotation pipeline appends one JSON object per article per line.
//! Historically the `annotations` field was stored as a JSON-encoded string;
//! newer writers store the nested array directly. Readers accept both and
//! normalize to the nested form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::align::ResolvedAnnotation;

/// One line of the annotated-corpus JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    pub id: String,
    pub article: String,
    pub annotations: AnnotationsField,
}

/// The `annotations` field, either nested or JSON-encoded.
///
/// The `Nested` variant must stay first: untagged deserialization tries
/// variants in order, and an array must parse as the nested form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationsField {
    Nested(Vec<ResolvedAnnotation>),
    Encoded(String),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("annotations string is not valid JSON: {0}")]
    BadEncodedAnnotations(#[from] serde_json::Error),
}

impl AnnotationsField {
    /// Normalize to the nested form. Idempotent: already-nested input passes
    /// through unchanged; an encoded string is parsed exactly once.
    pub fn normalize(self) -> Result<Vec<ResolvedAnnotation>, RecordError> {
        match self {
            AnnotationsField::Nested(annotations) => Ok(annotations),
            AnnotationsField::Encoded(raw) => Ok(serde_json::from_str(&raw)?),
        }
    }
}

impl AnnotatedRecord {
    /// Replace an encoded `annotations` field with its nested form.
    pub fn normalized(self) -> Result<Self, RecordError> {
        let annotations = self.annotations.normalize()?;
        Ok(Self {
            annotations: AnnotationsField::Nested(annotations),
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_annotation() -> ResolvedAnnotation {
        ResolvedAnnotation {
            label: "Workplace".to_string(),
            text: "in the mill".to_string(),
            span: [29, 40],
        }
    }

    #[test]
    fn nested_annotations_deserialize_as_nested() {
        let json = r#"{"id":"a","article":"t","annotations":[{"Label":"L","Text":"T","Span":[0,1]}]}"#;
        let record: AnnotatedRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(record.annotations, AnnotationsField::Nested(_)));
    }

    #[test]
    fn encoded_annotations_deserialize_as_string() {
        let json = r#"{"id":"a","article":"t","annotations":"[{\"Label\":\"L\",\"Text\":\"T\",\"Span\":[0,1]}]"}"#;
        let record: AnnotatedRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(record.annotations, AnnotationsField::Encoded(_)));

        let annotations = record.annotations.normalize().unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].label, "L");
    }

    #[test]
    fn normalize_is_idempotent() {
        let nested = AnnotationsField::Nested(vec![sample_annotation()]);
        let once = nested.clone().normalize().unwrap();
        let twice = AnnotationsField::Nested(once.clone()).normalize().unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, vec![sample_annotation()]);
    }

    #[test]
    fn bad_encoded_annotations_is_an_error() {
        let field = AnnotationsField::Encoded("not json".to_string());
        assert!(field.normalize().is_err());
    }
}
