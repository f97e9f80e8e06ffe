use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::json;

use super::*;

#[derive(Debug)]
struct FakeError(String);

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for FakeError {}

#[derive(Default)]
struct MemorySource {
    datasets: HashMap<String, Vec<Payload>>,
    report_total: bool,
    fail_on: Option<(String, u64)>,
    requests: RefCell<Vec<(String, u64)>>,
}

impl MemorySource {
    fn with_dataset(mut self, name: &str, rows: usize, tag: &str) -> Self {
        let rows = (0..rows).map(|index| row(tag, index)).collect();
        self.datasets.insert(name.to_string(), rows);
        self
    }

    fn requests(&self) -> Vec<(String, u64)> {
        self.requests.borrow().clone()
    }
}

impl RowSource for MemorySource {
    type Error = FakeError;

    fn fetch_page(&self, dataset: &str, offset: u64, length: u32) -> Result<RowPage, FakeError> {
        self.requests.borrow_mut().push((dataset.to_string(), offset));
        if self.fail_on.as_ref() == Some(&(dataset.to_string(), offset)) {
            return Err(FakeError("connection reset".to_string()));
        }

        let rows = self.datasets.get(dataset).cloned().unwrap_or_default();
        let start = (offset as usize).min(rows.len());
        let end = (start + length as usize).min(rows.len());
        Ok(RowPage {
            rows: rows[start..end].to_vec(),
            total_rows: self.report_total.then_some(rows.len() as u64),
        })
    }
}

fn row(tag: &str, index: usize) -> Payload {
    let value = json!({
        "id": index,
        "title": format!("{tag}-{index}"),
        "emb": [index as f32, 1.0, 0.5],
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!("literal is an object"),
    }
}

fn titles(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            record.payload["title"]
                .as_str()
                .expect("title must be a string")
                .to_string()
        })
        .collect()
}

fn collect(stream: DatasetStream<&MemorySource>) -> Vec<Record> {
    stream
        .collect::<Result<Vec<_>, _>>()
        .expect("stream must not fail")
}

#[test]
fn yields_limit_minus_one_minus_skip_records() {
    let source = MemorySource::default()
        .with_dataset("a", 30, "a")
        .with_dataset("b", 30, "b");

    for (skip, limit) in [(0, 10), (5, 10), (0, 1), (0, 0), (9, 10), (12, 10), (3, 45)] {
        let records = collect(read_records(&source, ["a", "b"], skip, limit).with_page_length(7));
        let expected = limit.saturating_sub(1).saturating_sub(skip);
        assert_eq!(records.len() as u64, expected, "skip={skip} limit={limit}");
    }
}

#[test]
fn ids_follow_stream_position_across_sources() {
    let source = MemorySource::default()
        .with_dataset("a", 4, "a")
        .with_dataset("b", 4, "b");

    let records = collect(read_records(&source, ["a", "b"], 2, 8).with_page_length(3));

    let ids: Vec<u64> = records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![3, 4, 5, 6, 7]);
    assert_eq!(titles(&records), vec!["a-2", "a-3", "b-0", "b-1", "b-2"]);
}

#[test]
fn sources_are_concatenated_in_list_order() {
    let source = MemorySource::default()
        .with_dataset("first", 2, "first")
        .with_dataset("second", 2, "second");

    let records = collect(read_records(&source, ["second", "first"], 0, 100));
    assert_eq!(
        titles(&records),
        vec!["second-0", "second-1", "first-0", "first-1"]
    );
}

#[test]
fn payload_never_contains_the_embedding_field() {
    let source = MemorySource::default().with_dataset("a", 5, "a");

    let records = collect(read_records(&source, ["a"], 0, 100));
    assert_eq!(records.len(), 5);
    for record in &records {
        assert!(!record.payload.contains_key(EMBEDDING_FIELD));
        assert_eq!(record.vector.len(), 3);
        assert!(record.payload.contains_key("title"));
    }
    assert_eq!(records[2].vector, vec![2.0, 1.0, 0.5]);
}

#[test]
fn stops_fetching_once_limit_is_reached() {
    let source = MemorySource::default()
        .with_dataset("a", 100, "a")
        .with_dataset("b", 100, "b");

    let records = collect(read_records(&source, ["a", "b"], 0, 15).with_page_length(10));
    assert_eq!(records.len(), 14);
    assert_eq!(
        source.requests(),
        vec![("a".to_string(), 0), ("a".to_string(), 10)]
    );
}

#[test]
fn reported_total_avoids_trailing_empty_request() {
    let source = MemorySource {
        report_total: true,
        ..MemorySource::default()
    }
    .with_dataset("a", 10, "a")
    .with_dataset("b", 3, "b");

    let records = collect(read_records(&source, ["a", "b"], 0, 100).with_page_length(5));
    assert_eq!(records.len(), 13);
    assert_eq!(
        source.requests(),
        vec![
            ("a".to_string(), 0),
            ("a".to_string(), 5),
            ("b".to_string(), 0),
        ]
    );
}

#[test]
fn empty_dataset_is_skipped() {
    let source = MemorySource::default()
        .with_dataset("empty", 0, "empty")
        .with_dataset("b", 2, "b");

    let records = collect(read_records(&source, ["empty", "b"], 0, 100));
    assert_eq!(titles(&records), vec!["b-0", "b-1"]);
}

#[test]
fn source_error_is_yielded_once_then_stream_ends() {
    let source = MemorySource {
        fail_on: Some(("a".to_string(), 4)),
        ..MemorySource::default()
    }
    .with_dataset("a", 10, "a");

    let mut stream = read_records(&source, ["a"], 0, 100).with_page_length(4);
    for _ in 0..4 {
        stream
            .next()
            .expect("record expected")
            .expect("record must be valid");
    }

    let error = stream
        .next()
        .expect("error expected")
        .expect_err("must fail");
    match &error {
        DatasetError::Source {
            dataset, offset, ..
        } => {
            assert_eq!(dataset, "a");
            assert_eq!(*offset, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.source().is_some());
    assert!(stream.next().is_none());
}

#[test]
fn missing_embedding_is_reported_with_row_id() {
    let mut source = MemorySource::default().with_dataset("a", 3, "a");
    if let Some(rows) = source.datasets.get_mut("a") {
        rows[1].remove(EMBEDDING_FIELD);
    }

    let results: Vec<_> = read_records(&source, ["a"], 0, 100).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(DatasetError::MissingEmbedding { id: 2, .. })
    ));
}

#[test]
fn non_numeric_embedding_is_rejected() {
    let mut source = MemorySource::default().with_dataset("a", 1, "a");
    if let Some(rows) = source.datasets.get_mut("a") {
        rows[0].insert(EMBEDDING_FIELD.to_string(), json!([0.1, "x", 0.3]));
    }

    let error = read_records(&source, ["a"], 0, 100)
        .next()
        .expect("item expected")
        .expect_err("must fail");
    assert!(matches!(
        error,
        DatasetError::InvalidEmbedding {
            id: 1,
            index: Some(1)
        }
    ));
}

#[test]
fn custom_embedding_field_is_honored() {
    let mut source = MemorySource::default().with_dataset("a", 1, "a");
    if let Some(rows) = source.datasets.get_mut("a") {
        let embedding = rows[0].remove(EMBEDDING_FIELD).expect("embedding present");
        rows[0].insert("vector".to_string(), embedding);
    }

    let records = collect(read_records(&source, ["a"], 0, 100).with_embedding_field("vector"));
    assert_eq!(records.len(), 1);
    assert!(!records[0].payload.contains_key("vector"));
}
