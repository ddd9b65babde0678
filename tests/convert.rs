//! Output Conversion Integration Tests
//!
//! Tests for JSONL to JSON conversion and annotation normalization.

use std::fs;

use serde_json::Value;
use tempfile::TempDir;

use chronotag::output::convert_jsonl_to_json;

#[test]
fn converts_mixed_records_to_one_array() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("annotated.jsonl");
    let output = temp.path().join("annotated.json");

    // One record with nested annotations, one with the encoded string form.
    let nested = r#"{"id":"1890-03-01---a_12","article":"The boy worked.","annotations":[{"Label":"Work","Text":"worked","Span":[8,14]}]}"#;
    let encoded = r#"{"id":"1900-07-15---b_3","article":"No claims here.","annotations":"[{\"Label\":\"Work\",\"Text\":\"claims\",\"Span\":[3,9]}]"}"#;
    fs::write(&input, format!("{}\n\n{}\n", nested, encoded)).unwrap();

    let count = convert_jsonl_to_json(&input, &output).unwrap();
    assert_eq!(count, 2);

    let parsed: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let records = parsed.as_array().unwrap();
    assert_eq!(records.len(), 2);

    // Both records end up with structured annotation arrays.
    for record in records {
        let annotations = record["annotations"].as_array().unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0]["Label"], "Work");
        assert!(annotations[0]["Span"].is_array());
    }
}

#[test]
fn conversion_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.jsonl");
    let first = temp.path().join("first.json");

    let encoded = r#"{"id":"x","article":"abc def","annotations":"[{\"Label\":\"L\",\"Text\":\"def\",\"Span\":[4,7]}]"}"#;
    fs::write(&input, format!("{}\n", encoded)).unwrap();
    convert_jsonl_to_json(&input, &first).unwrap();

    // Feed the already-normalized records back through as JSONL.
    let parsed: Value = serde_json::from_str(&fs::read_to_string(&first).unwrap()).unwrap();
    let reinput = temp.path().join("reinput.jsonl");
    let lines: Vec<String> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|r| serde_json::to_string(r).unwrap())
        .collect();
    fs::write(&reinput, lines.join("\n")).unwrap();

    let second = temp.path().join("second.json");
    convert_jsonl_to_json(&reinput, &second).unwrap();

    let a: Value = serde_json::from_str(&fs::read_to_string(&first).unwrap()).unwrap();
    let b: Value = serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_annotation_lists_survive() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.jsonl");
    let output = temp.path().join("out.json");

    fs::write(
        &input,
        "{\"id\":\"x\",\"article\":\"text\",\"annotations\":[]}\n",
    )
    .unwrap();

    convert_jsonl_to_json(&input, &output).unwrap();
    let parsed: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(parsed[0]["annotations"], Value::Array(vec![]));
}

#[test]
fn malformed_line_fails_with_context() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.jsonl");
    let output = temp.path().join("out.json");

    fs::write(&input, "not json at all\n").unwrap();

    let err = convert_jsonl_to_json(&input, &output).unwrap_err();
    assert!(err.to_string().contains("Malformed record"), "{}", err);
}
