#![forbid(unsafe_code)]
//! Blocking clients used by the ground-truth benchmark.
//!
//! - [`QdrantClient`]: collection lifecycle, upserts and batched queries over
//!   the Qdrant REST API, plus parallel batched upload.
//! - [`HfDatasetsClient`]: paged row reads from the Hugging Face
//!   datasets-server, usable as a [`groundtruth_core::RowSource`].

mod error;
pub mod hf;
pub mod qdrant;
mod transport;
pub mod upload;

pub use error::{Result, SdkError};
pub use hf::{HfDatasetsClient, HfOptions, DEFAULT_DATASETS_SERVER_URL};
pub use qdrant::{
    CreateCollection, Datatype, Distance, HnswConfigDiff, OptimizersConfigDiff, PointStruct,
    QdrantClient, QdrantOptions, QuantizationConfig, QueryRequest, QueryResponse,
    ScalarQuantizationConfig, ScalarType, ScoredPoint, SearchParams, UpdateResult, VectorParams,
};
pub use upload::{upload_batches, UploadError, UploadOptions, UploadSummary};
