#![forbid(unsafe_code)]
//! Core primitives for ground-truth benchmark generation.
//!
//! This crate has no network dependencies: it defines the dataset record,
//! the static benchmark profile, the paged dataset reader and the JSONL
//! result format. Remote clients live in `groundtruth-sdk`.

pub mod dataset;
pub mod profile;
pub mod record;
pub mod results;

pub use dataset::{read_records, DatasetError, DatasetStream, RowPage, RowSource};
pub use record::{Payload, PointId, Record};
pub use results::{write_search_results, SearchResultRecord};
