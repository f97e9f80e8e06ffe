//! Newline-delimited JSON format for exact-search ground truth.
//!
//! One object per query:
//! `{"query": [..], "closest_ids": [..], "closest_scores": [..], "conditions": null}`

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::PointId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultRecord {
    pub query: Vec<f32>,
    pub closest_ids: Vec<PointId>,
    pub closest_scores: Vec<f32>,
    /// Filter applied to the query; always absent for ground-truth runs.
    pub conditions: Option<Value>,
}

impl SearchResultRecord {
    pub fn new(query: Vec<f32>, hits: impl IntoIterator<Item = (PointId, f32)>) -> Self {
        let (closest_ids, closest_scores) = hits.into_iter().unzip();
        Self {
            query,
            closest_ids,
            closest_scores,
            conditions: None,
        }
    }
}

/// Writes one line per record and returns the number of lines written.
pub fn write_search_results<W, I>(writer: &mut W, records: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = SearchResultRecord>,
{
    let mut written = 0usize;
    for record in records {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        writer.write_all(&line)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
