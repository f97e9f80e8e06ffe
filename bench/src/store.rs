use std::time::Duration;

use anyhow::{Context, Result};
use groundtruth_core::DatasetError;
use groundtruth_sdk::{
    CreateCollection, PointStruct, QdrantClient, QueryRequest, QueryResponse, UploadOptions,
    UploadSummary,
};

pub(crate) type PointStream<'a> = dyn Iterator<Item = Result<PointStruct, DatasetError>> + 'a;

/// Remote collection operations the benchmark runs.
pub(crate) trait VectorStore {
    fn collection_exists(&self, name: &str) -> Result<bool>;

    fn delete_collection(&self, name: &str) -> Result<bool>;

    fn create_collection(&self, name: &str, config: &CreateCollection) -> Result<()>;

    fn upload_points(
        &self,
        name: &str,
        points: &mut PointStream<'_>,
        options: &UploadOptions,
    ) -> Result<UploadSummary>;

    fn query_batch(
        &self,
        name: &str,
        requests: &[QueryRequest],
        timeout: Duration,
    ) -> Result<Vec<QueryResponse>>;
}

impl VectorStore for QdrantClient {
    fn collection_exists(&self, name: &str) -> Result<bool> {
        QdrantClient::collection_exists(self, name)
            .with_context(|| format!("failed to check collection '{name}'"))
    }

    fn delete_collection(&self, name: &str) -> Result<bool> {
        QdrantClient::delete_collection(self, name)
            .with_context(|| format!("failed to delete collection '{name}'"))
    }

    fn create_collection(&self, name: &str, config: &CreateCollection) -> Result<()> {
        QdrantClient::create_collection(self, name, config)
            .with_context(|| format!("failed to create collection '{name}'"))?;
        Ok(())
    }

    fn upload_points(
        &self,
        name: &str,
        points: &mut PointStream<'_>,
        options: &UploadOptions,
    ) -> Result<UploadSummary> {
        QdrantClient::upload_points(self, name, points, options)
            .with_context(|| format!("failed to upload points to '{name}'"))
    }

    fn query_batch(
        &self,
        name: &str,
        requests: &[QueryRequest],
        timeout: Duration,
    ) -> Result<Vec<QueryResponse>> {
        QdrantClient::query_batch_points(self, name, requests, Some(timeout))
            .with_context(|| format!("batch query against '{name}' failed"))
    }
}
