//! Blocking client for the subset of the Qdrant REST API used by the
//! benchmark: collection lifecycle, point upserts and batched queries.

use std::time::Duration;

use groundtruth_core::{Payload, PointId, Record};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transport::{escape_segment, HttpTransport};
use crate::upload::{upload_batches, UploadError, UploadOptions, UploadSummary};

/// Full-scan searches over tens of millions of points are slow.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3_600);

#[derive(Debug, Clone)]
pub struct QdrantOptions {
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl Default for QdrantOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Distance {
    Cosine,
    Euclid,
    Dot,
    Manhattan,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    Float32,
    Uint8,
    Float16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorParams {
    pub size: u64,
    pub distance: Distance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_disk: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Datatype>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HnswConfigDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ef_construct: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptimizersConfigDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_segment_size: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Int8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalarQuantizationConfig {
    #[serde(rename = "type")]
    pub kind: ScalarType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantile: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_ram: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum QuantizationConfig {
    Scalar(ScalarQuantizationConfig),
}

/// Body of `PUT /collections/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateCollection {
    pub vectors: VectorParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hnsw_config: Option<HnswConfigDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimizers_config: Option<OptimizersConfigDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantization_config: Option<QuantizationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointStruct {
    pub id: PointId,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub payload: Payload,
}

impl From<Record> for PointStruct {
    fn from(record: Record) -> Self {
        Self {
            id: PointId::Num(record.id),
            vector: record.vector,
            payload: record.payload,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hnsw_ef: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub query: Vec<f32>,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<SearchParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_payload: Option<bool>,
}

impl QueryRequest {
    /// Nearest-neighbor query that bypasses the index and scans every vector.
    pub fn exact(query: Vec<f32>, limit: u32) -> Self {
        Self {
            query,
            limit,
            params: Some(SearchParams {
                exact: Some(true),
                ..SearchParams::default()
            }),
            with_payload: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredPoint {
    pub id: PointId,
    #[serde(default)]
    pub version: Option<u64>,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<Payload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub points: Vec<ScoredPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateResult {
    #[serde(default)]
    pub operation_id: Option<u64>,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiResponse<T> {
    result: T,
}

#[derive(Debug, Clone, Deserialize)]
struct CollectionExistence {
    exists: bool,
}

#[derive(Debug, Serialize)]
struct UpsertPoints<'a> {
    points: &'a [PointStruct],
}

#[derive(Debug, Serialize)]
struct QueryBatch<'a> {
    searches: &'a [QueryRequest],
}

#[derive(Debug, Clone)]
pub struct QdrantClient {
    transport: HttpTransport,
}

impl QdrantClient {
    pub fn with_options(base_url: impl AsRef<str>, options: QdrantOptions) -> Result<Self> {
        let mut headers = Vec::new();
        if let Some(api_key) = options.api_key.filter(|key| !key.is_empty()) {
            headers.push(("api-key".to_string(), api_key));
        }

        Ok(Self {
            transport: HttpTransport::new(base_url.as_ref(), options.timeout, headers)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn collection_exists(&self, name: &str) -> Result<bool> {
        let path = format!("{}/exists", collection_item_path(name));
        let response: ApiResponse<CollectionExistence> = self.transport.get_json(&path)?;
        Ok(response.result.exists)
    }

    /// Returns whether a collection was actually removed.
    pub fn delete_collection(&self, name: &str) -> Result<bool> {
        let path = collection_item_path(name);
        let response: ApiResponse<bool> = self.transport.delete_json(&path)?;
        Ok(response.result)
    }

    pub fn create_collection(&self, name: &str, config: &CreateCollection) -> Result<bool> {
        let path = collection_item_path(name);
        let response: ApiResponse<bool> = self.transport.send_json("PUT", &path, config)?;
        Ok(response.result)
    }

    pub fn upsert_points(
        &self,
        collection: &str,
        points: &[PointStruct],
        wait: bool,
    ) -> Result<UpdateResult> {
        let path = upsert_points_path(collection, wait);
        let body = UpsertPoints { points };
        let response: ApiResponse<UpdateResult> = self.transport.send_json("PUT", &path, &body)?;
        Ok(response.result)
    }

    /// Streams `points` into `collection` in parallel batches, see
    /// [`upload_batches`].
    pub fn upload_points<I, E>(
        &self,
        collection: &str,
        points: I,
        options: &UploadOptions,
    ) -> std::result::Result<UploadSummary, UploadError<E>>
    where
        I: IntoIterator<Item = std::result::Result<PointStruct, E>>,
    {
        upload_batches(points, options, |batch| {
            self.upsert_points(collection, batch, options.wait)
                .map(|_| ())
        })
    }

    /// Runs all `requests` in one call. Responses come back in request order.
    pub fn query_batch_points(
        &self,
        collection: &str,
        requests: &[QueryRequest],
        timeout: Option<Duration>,
    ) -> Result<Vec<QueryResponse>> {
        let path = query_batch_path(collection, timeout);
        let body = QueryBatch { searches: requests };
        let response: ApiResponse<Vec<QueryResponse>> =
            self.transport.send_json("POST", &path, &body)?;
        Ok(response.result)
    }
}

fn collection_item_path(name: &str) -> String {
    format!("/collections/{}", escape_segment(name))
}

fn upsert_points_path(collection: &str, wait: bool) -> String {
    format!("{}/points?wait={wait}", collection_item_path(collection))
}

fn query_batch_path(collection: &str, timeout: Option<Duration>) -> String {
    let base = format!("{}/points/query/batch", collection_item_path(collection));
    match timeout {
        Some(timeout) => format!("{base}?timeout={}", timeout.as_secs().max(1)),
        None => base,
    }
}
