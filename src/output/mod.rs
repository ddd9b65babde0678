//! Persisted output shapes and offline conversion.

pub mod convert;
pub mod record;

pub use convert::convert_jsonl_to_json;
pub use record::{AnnotatedRecord, AnnotationsField, RecordError};
