use std::time::Instant;

use anyhow::Result;
use groundtruth_core::profile::{EXACT_QUERY_COUNT, LIMIT_POINTS};
use groundtruth_core::{read_records, RowSource};
use groundtruth_sdk::{PointStruct, UploadOptions, UploadSummary};

use crate::store::VectorStore;

const PROGRESS_EVERY: u64 = 100_000;

/// Uploads every record after the exact-search query prefix, up to
/// `LIMIT_POINTS` of them.
pub(crate) fn load_all<S, R>(
    store: &S,
    source: R,
    datasets: &[&str],
    collection: &str,
    options: &UploadOptions,
) -> Result<UploadSummary>
where
    S: VectorStore + ?Sized,
    R: RowSource,
{
    let skip_first = EXACT_QUERY_COUNT;
    let limit = LIMIT_POINTS + skip_first;
    let started_at = Instant::now();

    tracing::info!(
        collection,
        skip_first,
        limit,
        batch_size = options.batch_size,
        parallel = options.parallel,
        "uploading points"
    );

    let mut read = 0u64;
    let mut points = read_records(source, datasets.iter().copied(), skip_first, limit)
        .inspect(|_| {
            read += 1;
            if read % PROGRESS_EVERY == 0 {
                let elapsed = started_at.elapsed().as_secs_f64();
                tracing::info!(
                    read,
                    points_per_sec = read as f64 / elapsed.max(f64::EPSILON),
                    "upload progress"
                );
            }
        })
        .map(|record| record.map(PointStruct::from));

    let summary = store.upload_points(collection, &mut points, options)?;

    let elapsed = started_at.elapsed();
    tracing::info!(
        collection,
        points = summary.points,
        batches = summary.batches,
        elapsed_ms = elapsed.as_millis() as u64,
        points_per_sec = summary.points as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        "upload finished"
    );
    Ok(summary)
}
