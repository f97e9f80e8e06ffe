use anyhow::Result;
use groundtruth_core::profile::{
    HNSW_EF_CONSTRUCT, HNSW_M, MAX_SEGMENT_SIZE, QUANTIZATION_ALWAYS_RAM, QUANTIZATION_QUANTILE,
    VECTORS_ON_DISK, VECTOR_SIZE,
};
use groundtruth_sdk::{
    CreateCollection, Datatype, Distance, HnswConfigDiff, OptimizersConfigDiff,
    QuantizationConfig, ScalarQuantizationConfig, ScalarType, VectorParams,
};

use crate::store::VectorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProvisionOutcome {
    Created,
    AlreadyExists,
}

/// 768-d cosine vectors kept on disk as float16, int8 scalar quantization
/// pinned in RAM, HNSW m=32/ef_construct=256.
pub(crate) fn benchmark_collection() -> CreateCollection {
    CreateCollection {
        vectors: VectorParams {
            size: VECTOR_SIZE,
            distance: Distance::Cosine,
            on_disk: Some(VECTORS_ON_DISK),
            datatype: Some(Datatype::Float16),
        },
        hnsw_config: Some(HnswConfigDiff {
            m: Some(HNSW_M),
            ef_construct: Some(HNSW_EF_CONSTRUCT),
        }),
        optimizers_config: Some(OptimizersConfigDiff {
            max_segment_size: Some(MAX_SEGMENT_SIZE),
        }),
        quantization_config: Some(QuantizationConfig::Scalar(ScalarQuantizationConfig {
            kind: ScalarType::Int8,
            quantile: Some(QUANTIZATION_QUANTILE),
            always_ram: Some(QUANTIZATION_ALWAYS_RAM),
        })),
    }
}

/// Makes sure `name` exists. An existing collection is left untouched unless
/// `force_recreate` is set, in which case it is dropped first.
pub(crate) fn ensure_collection<S>(
    store: &S,
    name: &str,
    force_recreate: bool,
) -> Result<ProvisionOutcome>
where
    S: VectorStore + ?Sized,
{
    if force_recreate {
        let deleted = store.delete_collection(name)?;
        tracing::info!(collection = name, deleted, "force recreate requested");
    }

    if store.collection_exists(name)? {
        tracing::info!(collection = name, "collection already exists");
        return Ok(ProvisionOutcome::AlreadyExists);
    }

    store.create_collection(name, &benchmark_collection())?;
    tracing::info!(
        collection = name,
        vector_size = VECTOR_SIZE,
        hnsw_m = HNSW_M,
        hnsw_ef_construct = HNSW_EF_CONSTRUCT,
        "collection created"
    );
    Ok(ProvisionOutcome::Created)
}
