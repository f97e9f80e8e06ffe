//! Static parameters of the benchmark collection and of both runs.

use std::time::Duration;

pub const COLLECTION_NAME: &str = "benchmark";

/// Dataset sources, read in this order.
pub const DATASETS: [&str; 3] = [
    "Cohere/wikipedia-22-12-simple-embeddings",
    "Cohere/wikipedia-22-12-en-embeddings",
    "Cohere/wikipedia-22-12-de-embeddings",
];
pub const DATASET_CONFIG: &str = "default";
pub const DATASET_SPLIT: &str = "train";
pub const EMBEDDING_FIELD: &str = "emb";

/// Rows requested per page from a row source.
pub const PAGE_LENGTH: u32 = 100;

/// Leading records reserved as exact-search queries; the loader skips them.
pub const EXACT_QUERY_COUNT: u64 = 1_000;
/// Neighbors requested per exact-search query.
pub const SEARCH_LIMIT: u32 = 100;
pub const LIMIT_POINTS: u64 = 50_000_000;

pub const VECTOR_SIZE: u64 = 768;
pub const HNSW_M: u64 = 32;
pub const HNSW_EF_CONSTRUCT: u64 = 256;
pub const QUANTIZATION_QUANTILE: f32 = 0.99;
pub const QUANTIZATION_ALWAYS_RAM: bool = true;
pub const VECTORS_ON_DISK: bool = true;
pub const MAX_SEGMENT_SIZE: u64 = 50_000_000;

pub const UPLOAD_PARALLEL: usize = 8;
pub const UPLOAD_BATCH_SIZE: usize = 64;
pub const UPLOAD_MAX_RETRIES: usize = 3;

pub const EXACT_SEARCH_TIMEOUT: Duration = Duration::from_secs(3_600);
/// Per-request timeout for one page of the datasets-server rows API.
pub const DATASETS_SERVER_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_OUTPUT_FILE: &str = "search_result_embeddings.jsonl";
