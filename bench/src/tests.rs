use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use groundtruth_core::{Payload, RowPage, RowSource};
use groundtruth_sdk::{
    upload_batches, CreateCollection, PointStruct, QueryRequest, QueryResponse, ScoredPoint,
    UploadOptions, UploadSummary,
};
use serde_json::json;

use crate::store::{PointStream, VectorStore};
use crate::Command;


/// Rows `{"title": "<dataset>-<i>", "emb": [..]}` served from memory.
pub(super) struct MemorySource {
    datasets: BTreeMap<String, Vec<Payload>>,
}

impl MemorySource {
    pub(super) fn new(datasets: &[(&str, usize)]) -> Self {
        let datasets = datasets
            .iter()
            .map(|(name, rows)| {
                let rows = (0..*rows).map(|index| row(name, index)).collect();
                (name.to_string(), rows)
            })
            .collect();
        Self { datasets }
    }
}

impl RowSource for MemorySource {
    type Error = io::Error;

    fn fetch_page(&self, dataset: &str, offset: u64, length: u32) -> io::Result<RowPage> {
        let rows = self.datasets.get(dataset).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("unknown dataset {dataset}"))
        })?;
        let start = (offset as usize).min(rows.len());
        let end = (start + length as usize).min(rows.len());
        Ok(RowPage {
            rows: rows[start..end].to_vec(),
            total_rows: Some(rows.len() as u64),
        })
    }
}

fn row(dataset: &str, index: usize) -> Payload {
    let angle = index as f32 * 0.01;
    let mut payload = Payload::new();
    payload.insert("title".to_string(), json!(format!("{dataset}-{index}")));
    payload.insert("emb".to_string(), json!([angle.cos(), angle.sin(), 0.25]));
    payload
}

/// In-memory stand-in for the remote collection; queries are answered by a
/// brute-force cosine scan.
#[derive(Default)]
pub(super) struct FakeStore {
    pub(super) collections: Mutex<BTreeMap<String, CreateCollection>>,
    pub(super) points: Mutex<BTreeMap<String, Vec<PointStruct>>>,
    pub(super) calls: Mutex<Vec<String>>,
    pub(super) queries: Mutex<Vec<(usize, Duration)>>,
}

impl FakeStore {
    pub(super) fn with_collection(name: &str, config: CreateCollection) -> Self {
        let store = Self::default();
        store
            .collections
            .lock()
            .expect("lock")
            .insert(name.to_string(), config);
        store
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("lock").push(call);
    }
}

impl VectorStore for FakeStore {
    fn collection_exists(&self, name: &str) -> Result<bool> {
        self.record(format!("exists {name}"));
        Ok(self.collections.lock().expect("lock").contains_key(name))
    }

    fn delete_collection(&self, name: &str) -> Result<bool> {
        self.record(format!("delete {name}"));
        self.points.lock().expect("lock").remove(name);
        Ok(self.collections.lock().expect("lock").remove(name).is_some())
    }

    fn create_collection(&self, name: &str, config: &CreateCollection) -> Result<()> {
        self.record(format!("create {name}"));
        let mut collections = self.collections.lock().expect("lock");
        if collections.contains_key(name) {
            anyhow::bail!("collection '{name}' already exists");
        }
        collections.insert(name.to_string(), config.clone());
        Ok(())
    }

    fn upload_points(
        &self,
        name: &str,
        points: &mut PointStream<'_>,
        options: &UploadOptions,
    ) -> Result<UploadSummary> {
        self.record(format!("upload {name}"));
        if !self.collections.lock().expect("lock").contains_key(name) {
            anyhow::bail!("collection '{name}' not found");
        }
        let summary = upload_batches(points, options, |batch| {
            self.points
                .lock()
                .expect("lock")
                .entry(name.to_string())
                .or_default()
                .extend(batch.iter().cloned());
            Ok(())
        })?;
        Ok(summary)
    }

    fn query_batch(
        &self,
        name: &str,
        requests: &[QueryRequest],
        timeout: Duration,
    ) -> Result<Vec<QueryResponse>> {
        self.record(format!("query {name}"));
        self.queries
            .lock()
            .expect("lock")
            .push((requests.len(), timeout));

        let points = self.points.lock().expect("lock");
        let stored = points.get(name).map(Vec::as_slice).unwrap_or_default();
        Ok(requests
            .iter()
            .map(|request| QueryResponse {
                points: brute_force(stored, &request.query, request.limit as usize),
            })
            .collect())
    }
}

fn brute_force(points: &[PointStruct], query: &[f32], limit: usize) -> Vec<ScoredPoint> {
    let mut scored: Vec<ScoredPoint> = points
        .iter()
        .map(|point| ScoredPoint {
            id: point.id.clone(),
            version: Some(0),
            score: cosine(query, &point.vector),
            payload: None,
        })
        .collect();
    scored.sort_by(|left, right| right.score.total_cmp(&left.score));
    scored.truncate(limit);
    scored
}

fn cosine(left: &[f32], right: &[f32]) -> f32 {
    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();
    dot / (left_norm * right_norm)
}

pub(super) fn test_options() -> UploadOptions {
    UploadOptions {
        retry_backoff: Duration::ZERO,
        ..UploadOptions::default()
    }
}

#[test]
fn commands_parse_from_cli_names() {
    assert_eq!(Command::parse("load"), Some(Command::Load));
    assert_eq!(Command::parse("exact-search"), Some(Command::ExactSearch));
    assert_eq!(Command::parse("all"), Some(Command::All));
    assert_eq!(Command::parse("exact_search"), None);
    assert_eq!(Command::parse(""), None);
}
